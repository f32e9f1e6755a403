//! Content-addressed persistence of datasets.
//!
//! [`save`] decomposes a [`Dataset`] into independently addressed nodes:
//! the structure, the query and the raw data are stored first, then a
//! dataset node that refers to them by content key.  Child `put`s always
//! precede the parent `put`.  Two datasets with byte-identical structures
//! share one structure node; no separate dedup step exists or is needed.
//!
//! [`load`] is the inverse.  The raw data stays in the store; the loaded
//! dataset's `data` field locates it and [`load_data`] fetches it.  Every
//! child key, `data` included, must resolve or `load` fails with `NotFound`.

use log::debug;
use serde_json::{Map, Value};

use crate::dataset::{Dataset, Query};
use crate::error::{DatasetError, Result};
use crate::hash::{canonical_bytes, from_canonical, ContentKey};
use crate::store::ContentStore;
use crate::structure::Structure;

const STRUCTURE_REF: &str = "structure";
const QUERY_REF: &str = "query";

/// Store a structure node.
pub fn save_structure<S: ContentStore + ?Sized>(store: &S, st: &Structure) -> Result<ContentKey> {
    st.validate()?;
    let key = store.put(&st.encode()?)?;
    debug!("saved structure node {key}");
    Ok(key)
}

/// Store `ds` and every node it refers to, returning the dataset node key.
pub fn save<S: ContentStore + ?Sized>(store: &S, ds: &Dataset) -> Result<ContentKey> {
    let mut node = ds.clone();
    node.body = None;

    let structure_key = match node.structure.take() {
        Some(st) => Some(save_structure(store, &st)?),
        None => None,
    };
    let query_key = match node.query.take() {
        Some(q) => Some(store.put(&canonical_bytes(&q)?)?),
        None => None,
    };
    if let Some(body) = &ds.body {
        let key = store.put(body)?;
        debug!("saved {} bytes of raw data as {key}", body.len());
        node.data = Some(key);
    }

    let mut obj = match serde_json::to_value(&node) {
        Ok(Value::Object(obj)) => obj,
        Ok(_) => return Err(DatasetError::Parse("dataset did not serialize to an object".into())),
        Err(e) => return Err(DatasetError::Parse(e.to_string())),
    };
    if let Some(k) = structure_key {
        obj.insert(STRUCTURE_REF.into(), Value::String(k.to_hex()));
    }
    if let Some(k) = query_key {
        obj.insert(QUERY_REF.into(), Value::String(k.to_hex()));
    }

    let key = store.put(&canonical_bytes(&Value::Object(obj))?)?;
    debug!("saved dataset node {key}");
    Ok(key)
}

/// Reassemble the dataset stored under `key`.
pub fn load<S: ContentStore + ?Sized>(store: &S, key: &ContentKey) -> Result<Dataset> {
    let bytes = store.get(key)?;
    let mut obj: Map<String, Value> = from_canonical(&bytes)?;
    let structure_key = take_ref(&mut obj, STRUCTURE_REF)?;
    let query_key = take_ref(&mut obj, QUERY_REF)?;

    let mut ds: Dataset = serde_json::from_value(Value::Object(obj))
        .map_err(|e| DatasetError::Decode(format!("dataset node {key}: {e}")))?;
    if let Some(k) = structure_key {
        ds.structure = Some(load_structure(store, &k)?);
    }
    if let Some(k) = query_key {
        ds.query = Some(load_query(store, &k)?);
    }
    if let Some(k) = ds.data {
        if !store.has(&k)? {
            return Err(DatasetError::NotFound(k));
        }
    }
    Ok(ds)
}

pub fn load_structure<S: ContentStore + ?Sized>(store: &S, key: &ContentKey) -> Result<Structure> {
    Structure::decode(&store.get(key)?)
}

pub fn load_query<S: ContentStore + ?Sized>(store: &S, key: &ContentKey) -> Result<Query> {
    from_canonical(&store.get(key)?)
}

/// Raw bytes of `ds`: the in-memory body if present, otherwise the blob its
/// `data` locator names.
pub fn load_data<S: ContentStore + ?Sized>(store: &S, ds: &Dataset) -> Result<Vec<u8>> {
    if let Some(body) = &ds.body {
        return Ok(body.clone());
    }
    match &ds.data {
        Some(key) => store.get(key),
        None => Err(DatasetError::Validation("dataset has no data".into())),
    }
}

fn take_ref(obj: &mut Map<String, Value>, name: &str) -> Result<Option<ContentKey>> {
    match obj.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => ContentKey::from_hex(&s)
            .map(Some)
            .map_err(|e| DatasetError::Decode(format!("{name} reference: {e}"))),
        Some(other) => Err(DatasetError::Decode(format!(
            "{name} reference must be a content key, got {other}"
        ))),
    }
}
