//! File-backed cart storage.
//!
//! One JSON document per cart key, stored as `<dir>/<key>.json`. Writes go
//! to a temporary sibling file first and are renamed into place, so a crash
//! mid-write leaves the previous snapshot intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use shopfront_core::cart::{CartStorage, StorageError};

/// Maximum key length, well below common filename limits.
const MAX_KEY_LENGTH: usize = 128;

/// Stores cart snapshots as files in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for cart files, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the cart files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check that the directory accepts writes.
    ///
    /// # Errors
    ///
    /// Returns an error if a probe file cannot be written and removed.
    pub fn check_writable(&self) -> Result<(), StorageError> {
        let probe = self.dir.join(".write-probe");
        fs::write(&probe, b"ok")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Keys become filenames, so only `[A-Za-z0-9_-]` is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

impl CartStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &path)?;
        tracing::debug!(key, bytes = value.len(), "Cart snapshot written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopfront_core::cart::{CartStore, ItemCandidate, NoopNotifier};
    use shopfront_core::{ProductId, VariantSelection};

    use super::*;

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert_eq!(storage.load("cart-1").unwrap(), None);
    }

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("carts")).unwrap();

        storage.save("cart-1", r#"{"version":1}"#).unwrap();
        assert_eq!(
            storage.load("cart-1").unwrap().as_deref(),
            Some(r#"{"version":1}"#)
        );
        assert!(dir.path().join("carts/cart-1.json").exists());

        storage.remove("cart-1").unwrap();
        storage.remove("cart-1").unwrap();
        assert_eq!(storage.load("cart-1").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();

        for key in ["", "../etc/passwd", "a/b", "cart.json", "spaces here"] {
            assert!(
                matches!(storage.save(key, "{}"), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
        assert!(storage.load(&"x".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_check_writable() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(storage.check_writable().is_ok());
    }

    #[test]
    fn test_cart_store_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = ItemCandidate {
            product_id: ProductId::new("P1"),
            variant_selection: VariantSelection::from_pairs([("size", "M")]),
            name: "Tee".to_string(),
            slug: "tee".to_string(),
            image_url: None,
            unit_price: Decimal::new(1999, 2),
            stock_limit: 5,
        };

        {
            let storage = FileStorage::new(dir.path()).unwrap();
            let mut cart = CartStore::open(storage, "cart-abc", NoopNotifier).unwrap();
            cart.add_item(candidate.clone()).unwrap();
            cart.add_item(candidate).unwrap();
        }

        let storage = FileStorage::new(dir.path()).unwrap();
        let cart = CartStore::open(storage, "cart-abc", NoopNotifier).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Decimal::new(3998, 2));
    }
}
