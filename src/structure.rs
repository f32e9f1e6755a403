//! Structure, schema and field definitions.
//!
//! A [`Structure`] is a deterministic description of how to interpret a
//! discrete dataset's raw bytes: format, format options, character encoding,
//! compression and schema.  Structures are plain values; the `with_*`
//! methods return a modified copy, so a value that has been hashed is never
//! changed underneath its key.
//!
//! # Canonical form
//! Serialization goes through a private shadow type whose `formatConfig` is
//! the flattened [`OptionMap`].  On the way back in, the option map is
//! rebuilt into a [`FormatConfig`] through the registry, keyed by the parsed
//! format.  See [`crate::hash`] for key ordering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::compression::Compression;
use crate::datatype::Type;
use crate::error::{DatasetError, Result};
use crate::format::DataFormat;
use crate::format_config::{self, FormatConfig, OptionMap};
use crate::hash::{self, ContentKey};

/// Character encoding assumed when none is given.
pub const DEFAULT_ENCODING: &str = "utf-8";

// ── Field ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required:   Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique:     Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum:    Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum:    Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern:    Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed:    Option<Vec<Value>>,
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sentinel string that marks a missing value in the raw data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_value: Option<String>,
    /// Sub-format of the datatype, e.g. a date layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: Type) -> Self {
        Field { name: name.into(), field_type, ..Default::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A variable name must start with a letter and contain only letters,
/// digits, `_` or `-`.
pub fn valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ── Schema ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Order defines row/column alignment.
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields, primary_key: None }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

// ── Structure ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub format:        DataFormat,
    pub format_config: Option<FormatConfig>,
    pub encoding:      String,
    pub compression:   Compression,
    pub schema:        Option<Schema>,
}

impl Default for Structure {
    fn default() -> Self {
        Structure {
            format:        DataFormat::Unknown,
            format_config: None,
            encoding:      DEFAULT_ENCODING.to_owned(),
            compression:   Compression::None,
            schema:        None,
        }
    }
}

impl Structure {
    pub fn new(format: DataFormat) -> Self {
        Structure { format, ..Default::default() }
    }

    pub fn with_format_config(mut self, cfg: impl Into<FormatConfig>) -> Self {
        self.format_config = Some(cfg.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Whether the raw data starts with a header record.
    pub fn header_row(&self) -> bool {
        self.format == DataFormat::Csv
            && self.format_config.as_ref().is_some_and(FormatConfig::header_row)
    }

    /// Fields in column order; empty without a schema.
    pub fn fields(&self) -> &[Field] {
        self.schema.as_ref().map(|s| s.fields.as_slice()).unwrap_or(&[])
    }

    /// The "abstract" form of this structure: titles and descriptions are
    /// dropped and every field is renamed to its positional name `col_<i>`,
    /// so structures differing only in human-facing labels coincide.
    pub fn to_abstract(&self) -> Structure {
        let schema = self.schema.as_ref().map(|s| {
            let fields = s
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| Field {
                    name:          abstract_name(i),
                    field_type:    f.field_type,
                    title:         None,
                    description:   None,
                    missing_value: f.missing_value.clone(),
                    format:        f.format.clone(),
                    constraints:   f.constraints.clone(),
                })
                .collect();
            let primary_key = s.primary_key.as_ref().map(|keys| {
                keys.iter()
                    .map(|k| s.field_index(k).map(abstract_name).unwrap_or_else(|| k.clone()))
                    .collect()
            });
            Schema { fields, primary_key }
        });

        Structure {
            format:        self.format,
            format_config: self.format_config.clone(),
            encoding:      self.encoding.clone(),
            compression:   self.compression,
            schema,
        }
    }

    /// Check the invariants a well-formed structure must hold.
    pub fn validate(&self) -> Result<()> {
        if let Some(cfg) = &self.format_config {
            if cfg.format() != self.format {
                return Err(DatasetError::Validation(format!(
                    "format config is for {:?} but structure format is {:?}",
                    cfg.format().name(),
                    self.format.name()
                )));
            }
        }
        if self.encoding.is_empty() {
            return Err(DatasetError::Validation("encoding must not be empty".into()));
        }
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        for (i, f) in schema.fields.iter().enumerate() {
            if !valid_variable_name(&f.name) {
                return Err(DatasetError::Validation(format!(
                    "field {i} name {:?}: variable name must contain only letters, numbers, '_' or '-', and start with a letter",
                    f.name
                )));
            }
            if schema.fields[..i].iter().any(|prev| prev.name == f.name) {
                return Err(DatasetError::Validation(format!("duplicate field name {:?}", f.name)));
            }
        }
        for key in schema.primary_key.iter().flatten() {
            if schema.field_index(key).is_none() {
                return Err(DatasetError::Validation(format!(
                    "primary key {key:?} does not name a field"
                )));
            }
        }
        Ok(())
    }

    /// Canonical encoding.
    pub fn encode(&self) -> Result<Vec<u8>> {
        hash::canonical_bytes(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Structure> {
        hash::from_canonical(bytes)
    }

    pub fn hash(&self) -> Result<ContentKey> {
        hash::hash(self)
    }
}

fn abstract_name(i: usize) -> String {
    format!("col_{i}")
}

// ── Serde ────────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructureRaw {
    #[serde(default, skip_serializing_if = "Compression::is_none")]
    compression: Compression,
    #[serde(default = "default_encoding")]
    encoding: String,
    #[serde(default, skip_serializing_if = "DataFormat::is_unknown")]
    format: DataFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format_config: Option<OptionMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<Schema>,
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_owned()
}

impl Serialize for Structure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        StructureRaw {
            compression:   self.compression,
            encoding:      self.encoding.clone(),
            format:        self.format,
            format_config: self.format_config.as_ref().map(FormatConfig::to_map),
            schema:        self.schema.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Structure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = StructureRaw::deserialize(deserializer)?;
        let format_config = match &raw.format_config {
            None => None,
            Some(opts) => {
                if format_config::builder(raw.format).is_none() {
                    return Err(serde::de::Error::custom(format!(
                        "cannot resolve formatConfig for format {:?}",
                        raw.format.name()
                    )));
                }
                format_config::build(raw.format, Some(opts)).map_err(serde::de::Error::custom)?
            }
        };
        Ok(Structure {
            format: raw.format,
            format_config,
            encoding: raw.encoding,
            compression: raw.compression,
            schema: raw.schema,
        })
    }
}

// ── Comparison ───────────────────────────────────────────────────────────────

/// Report the first difference between two structures.
pub fn compare_structures(a: &Structure, b: &Structure) -> Result<()> {
    if a.format != b.format {
        return mismatch(format!("format: {:?} != {:?}", a.format.name(), b.format.name()));
    }
    if a.format_config != b.format_config {
        return mismatch(format!("format config: {:?} != {:?}", a.format_config, b.format_config));
    }
    if a.encoding != b.encoding {
        return mismatch(format!("encoding: {} != {}", a.encoding, b.encoding));
    }
    if a.compression != b.compression {
        return mismatch(format!("compression: {} != {}", a.compression, b.compression));
    }
    compare_schemas(a.schema.as_ref(), b.schema.as_ref())
}

pub fn compare_schemas(a: Option<&Schema>, b: Option<&Schema>) -> Result<()> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(()),
        (Some(a), Some(b)) => (a, b),
        _ => return mismatch("schema: nil mismatch".into()),
    };
    if a.fields.len() != b.fields.len() {
        return mismatch(format!("field length: {} != {}", a.fields.len(), b.fields.len()));
    }
    for (i, (af, bf)) in a.fields.iter().zip(&b.fields).enumerate() {
        compare_fields(af, bf)
            .map_err(|e| DatasetError::Mismatch(format!("field {i}: {e}")))?;
    }
    if a.primary_key != b.primary_key {
        return mismatch(format!("primary key: {:?} != {:?}", a.primary_key, b.primary_key));
    }
    Ok(())
}

pub fn compare_fields(a: &Field, b: &Field) -> Result<()> {
    if a.name != b.name {
        return mismatch(format!("name: {} != {}", a.name, b.name));
    }
    if a.field_type != b.field_type {
        return mismatch(format!("type: {} != {}", a.field_type, b.field_type));
    }
    if a.title != b.title {
        return mismatch(format!("title: {:?} != {:?}", a.title, b.title));
    }
    if a.description != b.description {
        return mismatch(format!("description: {:?} != {:?}", a.description, b.description));
    }
    if a != b {
        return mismatch(format!("field {:?} differs in format, missing value or constraints", a.name));
    }
    Ok(())
}

fn mismatch(msg: String) -> Result<()> {
    Err(DatasetError::Mismatch(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format_config::{CsvOptions, JsonOptions};

    fn airports() -> Structure {
        Structure::new(DataFormat::Csv)
            .with_format_config(CsvOptions { header_row: true })
            .with_schema(Schema {
                fields: vec![
                    Field::new("ident", Type::String).with_title("Identifier"),
                    Field::new("elevation", Type::Integer).with_description("feet above sea level"),
                    Field::new("score", Type::Float),
                ],
                primary_key: Some(vec!["ident".into()]),
            })
    }

    #[test]
    fn canonical_encoding_is_key_sorted_and_compact() {
        let st = Structure::new(DataFormat::Csv)
            .with_format_config(CsvOptions { header_row: true })
            .with_schema(Schema::new(vec![Field::new("a", Type::Integer)]));
        let bytes = st.encode().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"encoding":"utf-8","format":"csv","formatConfig":{"header_row":true},"schema":{"fields":[{"name":"a","type":"integer"}]}}"#
        );
    }

    #[test]
    fn unknown_format_and_no_compression_are_omitted() {
        let bytes = Structure::default().encode().unwrap();
        assert_eq!(bytes, br#"{"encoding":"utf-8"}"#.to_vec());
        let zipped = Structure::default().with_compression(Compression::Zstd).encode().unwrap();
        assert_eq!(zipped, br#"{"compression":"zstd","encoding":"utf-8"}"#.to_vec());
    }

    #[test]
    fn decode_inverts_encode() {
        let st = airports().with_compression(Compression::Lz4);
        let back = Structure::decode(&st.encode().unwrap()).unwrap();
        assert_eq!(back, st);
        compare_structures(&back, &st).unwrap();
    }

    #[test]
    fn missing_encoding_decodes_to_default() {
        let st = Structure::decode(br#"{"format":"json"}"#).unwrap();
        assert_eq!(st.encoding, DEFAULT_ENCODING);
        assert_eq!(st.format, DataFormat::Json);
        assert!(st.format_config.is_none());
    }

    #[test]
    fn decode_rebuilds_config_from_the_format_tag() {
        let st = Structure::decode(br#"{"format":"json","formatConfig":{"object_entries":true}}"#).unwrap();
        assert_eq!(st.format_config, Some(FormatConfig::Json(JsonOptions { object_entries: true })));
    }

    #[test]
    fn decode_rejects_unresolvable_or_invalid_configs() {
        let err = Structure::decode(br#"{"format":"xml","formatConfig":{"header_row":true}}"#).unwrap_err();
        assert!(matches!(err, DatasetError::Decode(_)));
        let err = Structure::decode(br#"{"formatConfig":{"header_row":true}}"#).unwrap_err();
        assert!(matches!(err, DatasetError::Decode(_)));
        let err = Structure::decode(br#"{"format":"csv","formatConfig":{"header_row":"no"}}"#).unwrap_err();
        assert!(matches!(err, DatasetError::Decode(_)));
        let err = Structure::decode(br#"{"format":"tsv"}"#).unwrap_err();
        assert!(matches!(err, DatasetError::Decode(_)));
    }

    #[test]
    fn abstract_ignores_labels() {
        let a = airports();
        let mut b = airports();
        if let Some(schema) = b.schema.as_mut() {
            schema.fields[0].title = Some("Airport code".into());
            schema.fields[0].name = "code".into();
            schema.primary_key = Some(vec!["code".into()]);
            schema.fields[1].description = None;
        }
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(a.to_abstract().hash().unwrap(), b.to_abstract().hash().unwrap());

        let abs = a.to_abstract();
        let names: Vec<&str> = abs.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["col_0", "col_1", "col_2"]);
        assert_eq!(abs.schema.unwrap().primary_key, Some(vec!["col_0".to_string()]));
        // the original is untouched
        assert_eq!(a.fields()[0].name, "ident");
        assert_eq!(a.fields()[0].title.as_deref(), Some("Identifier"));
    }

    #[test]
    fn validate_checks_invariants() {
        airports().validate().unwrap();

        let wrong_cfg = Structure::new(DataFormat::Json).with_format_config(CsvOptions::default());
        assert!(matches!(wrong_cfg.validate(), Err(DatasetError::Validation(_))));

        let bad_name = Structure::new(DataFormat::Csv)
            .with_schema(Schema::new(vec![Field::new("1st", Type::Any)]));
        assert!(bad_name.validate().is_err());

        let dup = Structure::new(DataFormat::Csv)
            .with_schema(Schema::new(vec![Field::new("a", Type::Any), Field::new("a", Type::Any)]));
        assert!(dup.validate().is_err());

        let mut pk = airports();
        if let Some(s) = pk.schema.as_mut() {
            s.primary_key = Some(vec!["missing".into()]);
        }
        assert!(pk.validate().is_err());
    }

    #[test]
    fn variable_names() {
        assert!(valid_variable_name("col_a"));
        assert!(valid_variable_name("camelCase-1"));
        assert!(!valid_variable_name(""));
        assert!(!valid_variable_name("_x"));
        assert!(!valid_variable_name("has space"));
    }

    #[test]
    fn compare_reports_first_difference() {
        let a = airports();
        let b = airports().with_encoding("latin-1");
        let err = compare_structures(&a, &b).unwrap_err();
        assert!(err.to_string().contains("encoding"));

        let mut c = airports();
        if let Some(s) = c.schema.as_mut() {
            s.fields[2].field_type = Type::String;
        }
        let err = compare_structures(&a, &c).unwrap_err();
        assert!(err.to_string().contains("field 2"), "{err}");
    }

    #[test]
    fn header_row_requires_csv_config() {
        assert!(airports().header_row());
        assert!(!Structure::new(DataFormat::Csv).header_row());
        assert!(!Structure::new(DataFormat::Json)
            .with_format_config(JsonOptions { object_entries: true })
            .header_row());
    }
}
