//! Field datatypes and cell classification.
//!
//! [`classify`] runs a most-specific-first parser cascade over a raw cell:
//! integer, then float, then boolean, then date, falling back to string.
//! Empty cells classify as [`Type::Any`] and carry no type evidence.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DatasetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    #[default]
    Any,
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

const TYPE_NAMES: &[(Type, &str)] = &[
    (Type::Any,     "any"),
    (Type::String,  "string"),
    (Type::Integer, "integer"),
    (Type::Float,   "float"),
    (Type::Boolean, "boolean"),
    (Type::Date,    "date"),
];

/// Date layout recognised by the classifier.
pub const DATE_LAYOUT: &str = "%Y-%m-%d";

impl Type {
    pub fn name(self) -> &'static str {
        TYPE_NAMES
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, n)| *n)
            .unwrap_or("any")
    }

    pub fn parse(s: &str) -> Result<Self, DatasetError> {
        TYPE_NAMES
            .iter()
            .find(|(_, n)| *n == s)
            .map(|(t, _)| *t)
            .ok_or_else(|| DatasetError::Parse(format!("invalid datatype {s:?}")))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = DatasetError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Type::parse(s)
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Type::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ── Literal parsers ──────────────────────────────────────────────────────────

pub fn parse_integer(raw: &[u8]) -> Option<i64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}

/// Decimal or exponent notation, plus the case-insensitive specials
/// `inf`, `infinity` and `nan`.  Only the infinities take a sign.
pub fn parse_float(raw: &[u8]) -> Option<f64> {
    let s = std::str::from_utf8(raw).ok()?;
    let unsigned = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    if unsigned.len() != s.len() && unsigned.eq_ignore_ascii_case("nan") {
        return None;
    }
    s.parse().ok()
}

pub fn parse_boolean(raw: &[u8]) -> Option<bool> {
    let s = std::str::from_utf8(raw).ok()?;
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_date(raw: &[u8]) -> Option<NaiveDate> {
    let s = std::str::from_utf8(raw).ok()?;
    NaiveDate::parse_from_str(s, DATE_LAYOUT).ok()
}

/// Classify one raw cell.  Surrounding whitespace is ignored.
pub fn classify(raw: &[u8]) -> Type {
    let cell = raw.trim_ascii();
    if cell.is_empty() {
        Type::Any
    } else if parse_integer(cell).is_some() {
        Type::Integer
    } else if parse_float(cell).is_some() {
        Type::Float
    } else if parse_boolean(cell).is_some() {
        Type::Boolean
    } else if parse_date(cell).is_some() {
        Type::Date
    } else {
        Type::String
    }
}

// ── Tally ────────────────────────────────────────────────────────────────────

/// Tie-break order for [`TypeTally::winner`]: most general first.
pub const PREFERENCE: [Type; 6] = [
    Type::String,
    Type::Float,
    Type::Integer,
    Type::Date,
    Type::Boolean,
    Type::Any,
];

/// Per-column frequency counter over the datatype domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTally {
    counts: [usize; TYPE_NAMES.len()],
}

impl TypeTally {
    pub fn add(&mut self, t: Type) {
        self.counts[t.index()] += 1;
    }

    pub fn count(&self, t: Type) -> usize {
        self.counts[t.index()]
    }

    /// Most frequent non-`Any` type, ties resolved by [`PREFERENCE`].
    /// `Any` only when no cell carried type evidence.
    pub fn winner(&self) -> Type {
        let mut best = Type::Any;
        let mut best_count = 0;
        for t in PREFERENCE {
            if t == Type::Any {
                continue;
            }
            let n = self.count(t);
            if n > best_count {
                best = t;
                best_count = n;
            }
        }
        best
    }
}
