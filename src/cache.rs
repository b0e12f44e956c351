use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::datasets::Result;

/// Somewhere to persist tokenized datasets between runs
pub trait CacheStore {
    /// Read the entry stored under `key`, or `None` on a miss
    fn read(&self, key: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any previous entry
    fn write(&self, key: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// A cache where each key is a file path on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCache;

impl CacheStore for FsCache {
    fn read(&self, key: &Path) -> io::Result<Option<Vec<u8>>> {
        if !key.exists() {
            return Ok(None);
        }

        fs::read(key).map(Some)
    }

    fn write(&self, key: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(key, bytes)
    }
}

/// An in-memory cache, mostly useful in tests
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<PathBuf, Vec<u8>>>,
    reads: Mutex<usize>,
    writes: Mutex<usize>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes stored under `key`
    pub fn entry(&self, key: &Path) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).cloned()
    }

    /// All keys currently stored
    pub fn keys(&self) -> Vec<PathBuf> {
        let mut keys: Vec<_> = lock(&self.entries).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of reads that found an entry
    pub fn hits(&self) -> usize {
        *lock(&self.reads)
    }

    /// Number of writes performed
    pub fn writes(&self) -> usize {
        *lock(&self.writes)
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, key: &Path) -> io::Result<Option<Vec<u8>>> {
        let entry = lock(&self.entries).get(key).cloned();

        if entry.is_some() {
            *lock(&self.reads) += 1;
        }

        Ok(entry)
    }

    fn write(&self, key: &Path, bytes: &[u8]) -> io::Result<()> {
        lock(&self.entries).insert(key.to_path_buf(), bytes.to_vec());
        *lock(&self.writes) += 1;

        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Return the entry cached under `key`, or run `build` and persist its output
///
/// The key is trusted as-is: an entry is never checked against the source file it was built
/// from, so editing a source file requires deleting its cache entry by hand.
pub fn load_or_build<S, T, F>(store: &S, key: &Path, build: F) -> Result<T>
where
    S: CacheStore + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    if let Some(bytes) = store.read(key)? {
        log::info!("Loading cached features from {}", key.display());

        return Ok(serde_json::from_slice(&bytes)?);
    }

    log::info!("No cache at {}, building features", key.display());

    let value = build()?;

    store.write(key, &serde_json::to_vec(&value)?)?;
    log::info!("Saved features to {}", key.display());

    Ok(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::datasets::DatasetError;

    #[test]
    fn builds_once_then_reads_back() {
        let store = MemoryCache::new();
        let key = Path::new("data/cached_test");

        let first: Vec<i64> = load_or_build(&store, key, || Ok(vec![1, 2, 3])).unwrap();
        let second: Vec<i64> =
            load_or_build(&store, key, || panic!("a cache hit must not rebuild")).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.hits(), 1);
        assert_eq!(store.keys(), vec![key.to_path_buf()]);
    }

    #[test]
    fn build_failures_are_not_cached() {
        let store = MemoryCache::new();
        let key = Path::new("data/cached_failure");

        let result: Result<Vec<i64>> =
            load_or_build(&store, key, || Err(DatasetError::UnknownLabel("x".into())));

        assert!(matches!(result, Err(DatasetError::UnknownLabel(_))));
        assert!(store.entry(key).is_none());
    }

    #[test]
    fn corrupt_entries_fail_to_deserialize() {
        let store = MemoryCache::new();
        let key = Path::new("data/cached_corrupt");
        store.write(key, b"{not json").unwrap();

        let result: Result<Vec<i64>> = load_or_build(&store, key, || Ok(vec![]));

        assert!(matches!(result, Err(DatasetError::Json(_))));
    }

    #[test]
    fn fs_cache_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("cached_entry");

        assert!(FsCache.read(&key).unwrap().is_none());

        FsCache.write(&key, b"[1,2]").unwrap();

        assert_eq!(FsCache.read(&key).unwrap(), Some(b"[1,2]".to_vec()));
    }
}
