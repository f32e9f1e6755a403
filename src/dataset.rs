//! Dataset: a structure, a data locator and descriptive metadata.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::ContentKey;
use crate::structure::Structure;

/// A dataset as held in memory.
///
/// `data` locates the raw bytes in a content store.  `body` carries the raw
/// bytes themselves when they have not been stored yet; it never takes part
/// in serialization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    /// Semantic `major.minor.patch` version of this dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ContentKey>,
    #[serde(skip)]
    pub body: Option<Vec<u8>>,
}

impl Dataset {
    pub fn new(structure: Structure) -> Self {
        Dataset { structure: Some(structure), ..Default::default() }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// The statement a dataset was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub syntax:    String,
    pub statement: String,
}

/// A place a dataset drew its information from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:  Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url:   Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A legal licensing agreement.
///
/// Encodes as a bare string when only the type is known, otherwise as
/// `{"type": .., "url": ..}`.  Both shapes decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct License {
    pub license_type: String,
    pub url:          Option<String>,
}

impl License {
    pub fn new(license_type: impl Into<String>) -> Self {
        License { license_type: license_type.into(), url: None }
    }
}

#[derive(Serialize, Deserialize)]
struct LicenseObject {
    #[serde(rename = "type", default)]
    license_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LicenseRaw {
    Bare(String),
    Object(LicenseObject),
}

impl Serialize for License {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.license_type.is_empty() && self.url.is_none() {
            return serializer.serialize_str(&self.license_type);
        }
        LicenseObject { license_type: self.license_type.clone(), url: self.url.clone() }
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for License {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match LicenseRaw::deserialize(deserializer)? {
            LicenseRaw::Bare(t) => License { license_type: t, url: None },
            LicenseRaw::Object(o) => License { license_type: o.license_type, url: o.url },
        })
    }
}
