//! Per-format configuration variants.
//!
//! A [`FormatConfig`] removes ambiguity about how to interpret a
//! [`DataFormat`].  Each variant flattens to an [`OptionMap`] for canonical
//! encoding and is rebuilt from one through the constructor registry, so the
//! hash of a structure depends on the option values, never on the wrapper.
//!
//! # Registry
//! [`build`] dispatches on a static table of [`ConfigBuilder`] entries.
//! Supporting a new format means adding its options type and one table
//! entry; no existing dispatch code changes.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{DatasetError, Result};
use crate::format::DataFormat;

/// Untyped option map.  Ordered, so it encodes deterministically.
pub type OptionMap = BTreeMap<String, Value>;

/// Behaviour shared by every options type.
pub trait FormatOptions {
    /// The format these options belong to.
    fn format(&self) -> DataFormat;
    /// Flat, string-keyed rendering used for canonical encoding.
    fn to_map(&self) -> OptionMap;
}

// ── Variants ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CsvOptions {
    /// Whether the first record of the data is a header row.
    pub header_row: bool,
}

impl CsvOptions {
    pub const HEADER_ROW: &'static str = "header_row";

    pub fn from_map(opts: Option<&OptionMap>) -> Result<Self> {
        let mut o = CsvOptions::default();
        if let Some(opts) = opts {
            if let Some(v) = bool_option(opts, Self::HEADER_ROW)? {
                o.header_row = v;
            }
        }
        Ok(o)
    }
}

impl FormatOptions for CsvOptions {
    fn format(&self) -> DataFormat { DataFormat::Csv }
    fn to_map(&self) -> OptionMap {
        BTreeMap::from([(Self::HEADER_ROW.to_owned(), Value::Bool(self.header_row))])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonOptions {
    /// Top-level value is an object of entries rather than an array of rows.
    pub object_entries: bool,
}

impl JsonOptions {
    pub const OBJECT_ENTRIES: &'static str = "object_entries";

    pub fn from_map(opts: Option<&OptionMap>) -> Result<Self> {
        let mut o = JsonOptions::default();
        if let Some(opts) = opts {
            if let Some(v) = bool_option(opts, Self::OBJECT_ENTRIES)? {
                o.object_entries = v;
            }
        }
        Ok(o)
    }
}

impl FormatOptions for JsonOptions {
    fn format(&self) -> DataFormat { DataFormat::Json }
    fn to_map(&self) -> OptionMap {
        BTreeMap::from([(Self::OBJECT_ENTRIES.to_owned(), Value::Bool(self.object_entries))])
    }
}

/// Closed value type over the registered option variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatConfig {
    Csv(CsvOptions),
    Json(JsonOptions),
}

impl FormatConfig {
    fn options(&self) -> &dyn FormatOptions {
        match self {
            FormatConfig::Csv(o)  => o,
            FormatConfig::Json(o) => o,
        }
    }

    pub fn format(&self) -> DataFormat {
        self.options().format()
    }

    pub fn to_map(&self) -> OptionMap {
        self.options().to_map()
    }

    /// True only for a CSV config that declares a header row.
    pub fn header_row(&self) -> bool {
        matches!(self, FormatConfig::Csv(CsvOptions { header_row: true }))
    }
}

impl From<CsvOptions> for FormatConfig {
    fn from(o: CsvOptions) -> Self { FormatConfig::Csv(o) }
}

impl From<JsonOptions> for FormatConfig {
    fn from(o: JsonOptions) -> Self { FormatConfig::Json(o) }
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// Constructor/validator pair for one format.
pub struct ConfigBuilder {
    pub format: DataFormat,
    pub build:  fn(Option<&OptionMap>) -> Result<FormatConfig>,
}

const REGISTRY: &[ConfigBuilder] = &[
    ConfigBuilder { format: DataFormat::Csv,  build: build_csv },
    ConfigBuilder { format: DataFormat::Json, build: build_json },
];

fn build_csv(opts: Option<&OptionMap>) -> Result<FormatConfig> {
    CsvOptions::from_map(opts).map(FormatConfig::Csv)
}

fn build_json(opts: Option<&OptionMap>) -> Result<FormatConfig> {
    JsonOptions::from_map(opts).map(FormatConfig::Json)
}

/// Look up the registered builder for `format`, if any.
pub fn builder(format: DataFormat) -> Option<&'static ConfigBuilder> {
    REGISTRY.iter().find(|b| b.format == format)
}

/// Build the config variant for `format` from an untyped option map.
///
/// `None` options produce all-default values.  Known keys are type-checked;
/// unknown keys are ignored.  A format with no registered variant yields
/// `Ok(None)` when no options are given and `Validation` when they are.
pub fn build(format: DataFormat, options: Option<&OptionMap>) -> Result<Option<FormatConfig>> {
    match (builder(format), options) {
        (Some(b), opts) => (b.build)(opts).map(Some),
        (None, None)    => Ok(None),
        (None, Some(_)) => Err(DatasetError::Validation(format!(
            "no format config registered for format {:?}",
            format.name()
        ))),
    }
}

fn bool_option(opts: &OptionMap, key: &str) -> Result<Option<bool>> {
    match opts.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b))     => Ok(Some(*b)),
        Some(other) => Err(DatasetError::Validation(format!("invalid {key} value: {other}"))),
    }
}
