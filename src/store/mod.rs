//! Content-addressed blob stores.
//!
//! A [`ContentStore`] keys every blob by the BLAKE3 digest of its bytes, so
//! `put` is idempotent: storing the same bytes twice yields the same key
//! and leaves one copy.  That is what lets concurrent saves of identical
//! content proceed without coordination.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{DatasetError, Result};
use crate::hash::ContentKey;

pub trait ContentStore {
    /// Store `data`, returning its content key.
    fn put(&self, data: &[u8]) -> Result<ContentKey>;
    /// Fetch the blob stored under `key`; `NotFound` if absent.
    fn get(&self, key: &ContentKey) -> Result<Vec<u8>>;
    fn has(&self, key: &ContentKey) -> Result<bool>;
}

// ── In-memory store ──────────────────────────────────────────────────────────

/// Map-backed store, safe to share between threads.
#[derive(Debug, Default)]
pub struct MemStore {
    blobs: Mutex<HashMap<ContentKey, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentStore for MemStore {
    fn put(&self, data: &[u8]) -> Result<ContentKey> {
        let key = ContentKey::of(data);
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.entry(key).or_insert_with(|| data.to_vec());
        Ok(key)
    }

    fn get(&self, key: &ContentKey) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or(DatasetError::NotFound(*key))
    }

    fn has(&self, key: &ContentKey) -> Result<bool> {
        Ok(self.blobs.lock().unwrap_or_else(PoisonError::into_inner).contains_key(key))
    }
}

// ── Directory store ──────────────────────────────────────────────────────────

/// One file per blob under `root`, named by the key's hex digest.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if necessary.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_owned();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &ContentKey) -> PathBuf {
        self.root.join(key.to_hex())
    }
}

impl ContentStore for FsStore {
    fn put(&self, data: &[u8]) -> Result<ContentKey> {
        let key = ContentKey::of(data);
        let path = self.path(&key);
        if path.exists() {
            return Ok(key);
        }
        // each writer gets its own temp file; the rename publishes a complete blob
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        match tmp.persist(&path) {
            Ok(_) => {
                debug!("stored {} bytes at {}", data.len(), path.display());
                Ok(key)
            }
            // a concurrent writer published the same content first
            Err(_) if path.exists() => Ok(key),
            Err(e) => Err(e.error.into()),
        }
    }

    fn get(&self, key: &ContentKey) -> Result<Vec<u8>> {
        match fs::read(self.path(key)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DatasetError::NotFound(*key)),
            Err(e) => Err(e.into()),
        }
    }

    fn has(&self, key: &ContentKey) -> Result<bool> {
        Ok(self.path(key).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn exercise(store: &dyn ContentStore) {
        let k1 = store.put(b"alpha").unwrap();
        let k2 = store.put(b"alpha").unwrap();
        assert_eq!(k1, k2);
        assert_eq!(k1, ContentKey::of(b"alpha"));
        assert_eq!(store.get(&k1).unwrap(), b"alpha");
        assert!(store.has(&k1).unwrap());

        let missing = ContentKey::of(b"never stored");
        assert!(!store.has(&missing).unwrap());
        assert!(matches!(store.get(&missing), Err(DatasetError::NotFound(k)) if k == missing));
    }

    #[test]
    fn mem_store_contract() {
        let store = MemStore::new();
        exercise(&store);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fs_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path().join("blobs")).unwrap();
        exercise(&store);
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 1);
    }

    #[test]
    fn concurrent_identical_puts_agree() {
        let store = Arc::new(MemStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&store);
                thread::spawn(move || s.put(b"same bytes").unwrap())
            })
            .collect();
        let keys: Vec<ContentKey> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fs_store_concurrent_identical_puts_agree() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::open(dir.path()).unwrap());
        let blob: Arc<Vec<u8>> = Arc::new((0..4 << 20).map(|i| (i % 251) as u8).collect());

        for _ in 0..5 {
            let barrier = Arc::new(Barrier::new(8));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let (s, b, data) = (Arc::clone(&store), Arc::clone(&barrier), Arc::clone(&blob));
                    thread::spawn(move || {
                        b.wait();
                        s.put(&data)
                    })
                })
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap().unwrap(), ContentKey::of(&blob));
            }
            assert_eq!(store.get(&ContentKey::of(&blob)).unwrap(), *blob);
            fs::remove_file(store.path(&ContentKey::of(&blob))).unwrap();
        }
        // no temp files left behind
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }
}
