//! Data format registry.
//!
//! A [`DataFormat`] names the serialization of a dataset's raw bytes.  The
//! name table below is the single source of truth for both directions of
//! the string mapping; `Unknown` renders as the empty string and is omitted
//! from canonical encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DatasetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DataFormat {
    #[default]
    Unknown,
    Csv,
    Json,
    Xml,
    Xls,
}

// ── Name table ───────────────────────────────────────────────────────────────

const FORMAT_NAMES: &[(DataFormat, &str)] = &[
    (DataFormat::Unknown, ""),
    (DataFormat::Csv,     "csv"),
    (DataFormat::Json,    "json"),
    (DataFormat::Xml,     "xml"),
    (DataFormat::Xls,     "xls"),
];

impl DataFormat {
    /// Every format this build knows about, `Unknown` included.
    pub fn all() -> impl Iterator<Item = DataFormat> {
        FORMAT_NAMES.iter().map(|(f, _)| *f)
    }

    /// Canonical lowercase name; empty for `Unknown`.
    pub fn name(self) -> &'static str {
        FORMAT_NAMES
            .iter()
            .find(|(f, _)| *f == self)
            .map(|(_, n)| *n)
            .unwrap_or("")
    }

    /// Parse a canonical name.  The empty string maps to `Unknown`.
    pub fn parse(s: &str) -> Result<Self, DatasetError> {
        FORMAT_NAMES
            .iter()
            .find(|(_, n)| *n == s)
            .map(|(f, _)| *f)
            .ok_or_else(|| DatasetError::InvalidFormat(s.to_owned()))
    }

    pub fn is_unknown(&self) -> bool {
        *self == DataFormat::Unknown
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataFormat {
    type Err = DatasetError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataFormat::parse(s)
    }
}

impl Serialize for DataFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DataFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DataFormat::parse(&s).map_err(serde::de::Error::custom)
    }
}
