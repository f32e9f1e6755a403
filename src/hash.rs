//! Canonical encoding and content keys.
//!
//! The canonical encoding of any data-model value is compact JSON with every
//! object's keys in strict lexicographic (byte) order.  Key order is imposed
//! here rather than relying on the map type behind `serde_json::Value`, so
//! the bytes stay stable whatever features the JSON crate is built with.
//!
//! A [`ContentKey`] is the BLAKE3 digest of those bytes.  Equal canonical
//! encodings always give equal keys, which is all deduplication needs.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{DatasetError, Result};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    /// Key of a raw byte string.
    pub fn of(bytes: &[u8]) -> Self {
        ContentKey(blake3::hash(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| DatasetError::Parse(format!("invalid content key {s:?}: {e}")))?;
        Ok(ContentKey(out))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.to_hex())
    }
}

impl FromStr for ContentKey {
    type Err = DatasetError;
    fn from_str(s: &str) -> Result<Self> {
        ContentKey::from_hex(s)
    }
}

impl Serialize for ContentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ── Canonical encoding ───────────────────────────────────────────────────────

/// Canonical bytes of any serializable value.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let v = serde_json::to_value(value).map_err(|e| DatasetError::Parse(e.to_string()))?;
    let mut out = Vec::new();
    write_canonical(&v, &mut out)?;
    Ok(out)
}

/// Inverse of [`canonical_bytes`].
pub fn from_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| DatasetError::Decode(e.to_string()))
}

/// `ContentKey` of a value's canonical encoding.
pub fn hash<T: Serialize + ?Sized>(value: &T) -> Result<ContentKey> {
    Ok(ContentKey::of(&canonical_bytes(value)?))
}

fn write_canonical(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (k, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(&Value::String(k.clone()), out)?;
                out.push(b':');
                write_canonical(val, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => write_scalar(scalar, out)?,
    }
    Ok(())
}

fn write_scalar(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    serde_json::to_writer(out, v).map_err(|e| DatasetError::Parse(e.to_string()))
}
