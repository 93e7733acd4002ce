//! Client-local cart storage.
//!
//! Anonymous carts live in storage owned by the current client, addressed by a fixed key. Values
//! are opaque strings so a damaged entry can be represented and recovered from.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Key the anonymous cart is stored under.
pub const CART_STORAGE_KEY: &str = "storefront.cart";

/// Errors from client-local storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// The cart could not be serialised.
    #[error("failed to serialise cart: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store cannot be used right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage for the anonymous cart.
#[automock]
pub trait CartStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory [`CartStore`].
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    values: Mutex<FxHashMap<String, String>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `value` under `key`.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = FxHashMap::default();
        values.insert(key.to_string(), value.to_string());

        Self {
            values: Mutex::new(values),
        }
    }
}

impl CartStore for MemoryCartStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|_err| StoreError::Unavailable("memory store lock poisoned".to_string()))?;

        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_err| StoreError::Unavailable("memory store lock poisoned".to_string()))?;

        values.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_err| StoreError::Unavailable("memory store lock poisoned".to_string()))?;

        values.remove(key);

        Ok(())
    }
}

/// [`CartStore`] keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    dir: PathBuf,
}

impl FileCartStore {
    /// Store files under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory files are kept in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CartStore for FileCartStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn memory_store_reads_back_writes() -> TestResult {
        let store = MemoryCartStore::new();

        assert_eq!(store.read(CART_STORAGE_KEY)?, None);

        store.write(CART_STORAGE_KEY, "{}")?;
        assert_eq!(store.read(CART_STORAGE_KEY)?.as_deref(), Some("{}"));

        store.remove(CART_STORAGE_KEY)?;
        store.remove(CART_STORAGE_KEY)?;
        assert_eq!(store.read(CART_STORAGE_KEY)?, None);

        Ok(())
    }

    #[test]
    fn file_store_creates_its_directory() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let store = FileCartStore::new(tmp.path().join("nested").join("carts"));

        assert_eq!(store.read(CART_STORAGE_KEY)?, None);

        store.write(CART_STORAGE_KEY, r#"{"items":[]}"#)?;

        assert!(store.dir().join("storefront.cart.json").exists());
        assert_eq!(store.read(CART_STORAGE_KEY)?.as_deref(), Some(r#"{"items":[]}"#));

        Ok(())
    }

    #[test]
    fn file_store_remove_is_idempotent() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let store = FileCartStore::new(tmp.path());

        store.write(CART_STORAGE_KEY, "x")?;
        store.remove(CART_STORAGE_KEY)?;
        store.remove(CART_STORAGE_KEY)?;

        assert_eq!(store.read(CART_STORAGE_KEY)?, None);

        Ok(())
    }
}
