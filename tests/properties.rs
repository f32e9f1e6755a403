use dset::detect::possible_header_row;
use dset::{
    Compression, CsvOptions, DataFormat, Field, FormatConfig, JsonOptions, Schema, Structure, Type,
};
use proptest::prelude::*;

fn datatype() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Any),
        Just(Type::String),
        Just(Type::Integer),
        Just(Type::Float),
        Just(Type::Boolean),
        Just(Type::Date),
    ]
}

fn field() -> impl Strategy<Value = Field> {
    (
        "[a-z][a-zA-Z0-9_]{0,10}",
        datatype(),
        proptest::option::of("[ -~]{0,16}"),
        proptest::option::of("[ -~]{0,32}"),
        proptest::option::of("(NA|-|null)"),
    )
        .prop_map(|(name, field_type, title, description, missing_value)| Field {
            name,
            field_type,
            title,
            description,
            missing_value,
            ..Default::default()
        })
}

fn format_and_config() -> impl Strategy<Value = (DataFormat, Option<FormatConfig>)> {
    prop_oneof![
        Just((DataFormat::Unknown, None::<FormatConfig>)),
        any::<Option<bool>>().prop_map(|h| {
            (DataFormat::Csv, h.map(|header_row| FormatConfig::Csv(CsvOptions { header_row })))
        }),
        any::<Option<bool>>().prop_map(|o| {
            (DataFormat::Json, o.map(|object_entries| FormatConfig::Json(JsonOptions { object_entries })))
        }),
        Just((DataFormat::Xml, None::<FormatConfig>)),
        Just((DataFormat::Xls, None::<FormatConfig>)),
    ]
}

fn compression() -> impl Strategy<Value = Compression> {
    prop_oneof![
        Just(Compression::None),
        Just(Compression::Zstd),
        Just(Compression::Lz4),
        Just(Compression::Brotli),
        Just(Compression::Lzma),
    ]
}

fn structure() -> impl Strategy<Value = Structure> {
    (
        format_and_config(),
        prop_oneof![Just("utf-8".to_string()), "[a-z0-9-]{1,10}"],
        compression(),
        proptest::option::of(proptest::collection::vec(field(), 0..6)),
    )
        .prop_map(|((format, format_config), encoding, compression, fields)| Structure {
            format,
            format_config,
            encoding,
            compression,
            schema: fields.map(Schema::new),
        })
}

proptest! {
    #[test]
    fn decode_inverts_encode(s in structure()) {
        let bytes = s.encode().unwrap();
        prop_assert_eq!(Structure::decode(&bytes).unwrap(), s);
    }

    #[test]
    fn construction_path_does_not_change_encoding(s in structure()) {
        let mut rebuilt = Structure::new(s.format)
            .with_encoding(s.encoding.clone())
            .with_compression(s.compression);
        if let Some(cfg) = s.format_config.clone() {
            rebuilt = rebuilt.with_format_config(cfg);
        }
        if let Some(schema) = s.schema.clone() {
            rebuilt = rebuilt.with_schema(schema);
        }
        prop_assert_eq!(rebuilt.encode().unwrap(), s.encode().unwrap());
        prop_assert_eq!(rebuilt.hash().unwrap(), s.hash().unwrap());
    }

    #[test]
    fn labels_do_not_change_abstract_hash(s in structure(), title in "[ -~]{1,12}") {
        let mut relabelled = s.clone();
        if let Some(schema) = relabelled.schema.as_mut() {
            for f in &mut schema.fields {
                f.title = Some(title.clone());
                f.description = None;
            }
        }
        prop_assert_eq!(s.to_abstract().hash().unwrap(), relabelled.to_abstract().hash().unwrap());
    }

    #[test]
    fn numeric_cells_rule_out_headers(words in proptest::collection::vec("[A-Za-z]{1,8}", 0..5), n in any::<i64>(), at in 0usize..5) {
        let mut record: Vec<String> = words;
        let at = at.min(record.len());
        record.insert(at, n.to_string());
        prop_assert!(!possible_header_row(&record[..]));
    }
}
