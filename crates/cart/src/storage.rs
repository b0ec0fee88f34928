//! Durable cart storage.
//!
//! The cart is kept the way a browser keeps it in `localStorage`: a single
//! string key holding the JSON-encoded cart array. [`JsonFileStorage`] keeps
//! the whole key-value map in one JSON file and rewrites it atomically
//! (temp file + rename) on every save. [`MemoryStorage`] holds the value in
//! memory for tests and throwaway sessions.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rocketshoes_core::Cart;
use thiserror::Error;

/// Storage key the cart lives under.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Errors that can occur reading or writing the persisted cart.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the storage file failed.
    #[error("Storage I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored value is not a valid cart.
    #[error("Malformed stored data: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A writer panicked while holding the storage lock.
    #[error("Storage lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Persistence port for the cart.
///
/// `save` overwrites the whole stored cart; there are no partial writes.
pub trait CartStorage: Send + Sync {
    /// Load the stored cart, or `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Malformed` if the stored value does not parse
    /// as a cart, or `StorageError::Io` if it cannot be read.
    fn load(&self) -> Result<Option<Cart>, StorageError>;

    /// Overwrite the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be written.
    fn save(&self, cart: &Cart) -> Result<(), StorageError>;
}

// =============================================================================
// JsonFileStorage
// =============================================================================

/// `localStorage`-style key-value file.
///
/// The file holds a JSON object of string keys to string values. Keys other
/// than the cart key are preserved across saves.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Storage at `path` using the default cart key.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_map(&self) -> Result<Option<BTreeMap<String, String>>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        replace_file(&self.path, &serde_json::to_vec_pretty(map)?).map_err(|e| self.io_error(e))
    }
}

/// Write `contents` to `<path>.tmp`, then rename it over `path`.
///
/// The temp file is removed if the rename fails.
fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<Cart>, StorageError> {
        let _guard = self.lock.lock()?;

        let Some(map) = self.read_map()? else {
            return Ok(None);
        };

        map.get(CART_STORAGE_KEY)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let _guard = self.lock.lock()?;

        let mut map = match self.read_map() {
            Ok(map) => map.unwrap_or_default(),
            Err(StorageError::Malformed(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Storage file is not a key-value object, rewriting it"
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        map.insert(CART_STORAGE_KEY.to_string(), serde_json::to_string(cart)?);
        self.write_map(&map)
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage holding the raw serialized cart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a raw stored value (which need not be valid).
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw stored value.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Cart>, StorageError> {
        let raw = self.raw.lock()?;
        raw.as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(cart)?;
        *self.raw.lock()? = Some(serialized);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use rocketshoes_core::{Price, Product, ProductId};

    use super::*;

    fn sample_cart() -> Cart {
        Cart::from_products(vec![Product {
            id: ProductId::new(1),
            name: "Tênis de Caminhada Leve Confortável".to_string(),
            price: Price::from_cents(17_990),
            image_url: "https://cdn.example.test/1.jpg".to_string(),
            amount: NonZeroU32::new(2).unwrap(),
        }])
        .unwrap()
    }

    #[test]
    fn test_file_storage_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("storage.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_round_trip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/state/storage.json"));

        storage.save(&sample_cart()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample_cart()));
    }

    #[test]
    fn test_file_storage_value_is_json_string_under_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        JsonFileStorage::new(&path).save(&sample_cart()).unwrap();

        let map: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let raw = map.get(CART_STORAGE_KEY).unwrap();
        assert!(raw.starts_with('['));
        assert_eq!(serde_json::from_str::<Cart>(raw).unwrap(), sample_cart());
    }

    #[test]
    fn test_file_storage_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"@RocketShoes:theme":"dark"}"#).unwrap();

        JsonFileStorage::new(&path).save(&sample_cart()).unwrap();

        let map: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(map.get("@RocketShoes:theme").map(String::as_str), Some("dark"));
        assert!(map.contains_key(CART_STORAGE_KEY));
    }

    #[test]
    fn test_replace_file_cleans_up_temp_when_rename_fails() {
        let dir = tempfile::tempdir().unwrap();
        // Renaming a file over a non-empty directory fails
        let target = dir.path().join("storage.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        assert!(replace_file(&target, b"{}").is_err());
        assert!(!dir.path().join("storage.json.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn test_replace_file_leaves_no_temp_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("storage.json");

        replace_file(&target, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_malformed_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"@RocketShoes:cart":"[{not json"}"#).unwrap();

        let err = JsonFileStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed(_)));
    }

    #[test]
    fn test_file_storage_overwrites_malformed_file_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "garbage").unwrap();

        let storage = JsonFileStorage::new(&path);
        storage.save(&sample_cart()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample_cart()));
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save(&sample_cart()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample_cart()));
        assert!(storage.raw().unwrap().contains("\"amount\":2"));
    }

    #[test]
    fn test_memory_storage_malformed() {
        let storage = MemoryStorage::with_raw("{oops");
        assert!(matches!(storage.load(), Err(StorageError::Malformed(_))));
    }
}
