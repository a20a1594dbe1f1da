//! File-backed key-value store.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use storefront::storage::{KeyValueStore, StorageError};
use tempfile::NamedTempFile;

/// Durable [`KeyValueStore`] writing one `<key>.json` file per record.
///
/// Writes go to a uniquely named staging file in the same directory and are
/// renamed into place, so readers only ever see whole records.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(StorageError::Backend(format!("invalid storage key: {key:?}")));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let mut staging = NamedTempFile::new_in(&self.dir)?;

        staging.write_all(value.as_bytes())?;
        staging.persist(&path).map_err(io::Error::from)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use storefront::{cart::CartStore, items::LineItem};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn set_get_remove_round_trip() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;

        store.set("token", "abc")?;
        assert_eq!(store.get("token")?, Some("abc".to_string()));
        assert!(dir.path().join("token.json").exists());

        store.remove("token")?;
        assert_eq!(store.get("token")?, None);

        Ok(())
    }

    #[test]
    fn remove_missing_key_is_ok() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;

        store.remove("cart")?;

        Ok(())
    }

    #[test]
    fn open_creates_nested_directory() -> TestResult {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("state").join("storefront");

        let store = FileStore::open(&nested)?;

        assert!(store.dir().is_dir());

        Ok(())
    }

    #[test]
    fn rejects_path_like_keys() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::Backend(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::Backend(_))));

        Ok(())
    }

    #[test]
    fn concurrent_writers_to_one_key_all_succeed() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path())?;

        let writers: Vec<_> = (0..8)
            .map(|n| {
                let mut store = store.clone();

                std::thread::spawn(move || {
                    (0..25).try_for_each(|_| store.set("cart", &format!("[{n}]")))
                })
            })
            .collect();

        for writer in writers {
            assert!(matches!(writer.join(), Ok(Ok(()))));
        }

        let record = store.get("cart")?.unwrap_or_default();
        assert!(record.starts_with('[') && record.ends_with(']'));
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);

        Ok(())
    }

    #[test]
    fn cart_survives_process_restart() -> TestResult {
        let dir = tempfile::tempdir()?;

        {
            let mut cart = CartStore::load(FileStore::open(dir.path())?, INR);
            cart.add_item(LineItem::new("p1", "Brass Lamp", 799_00, 2))?;
        }

        let cart = CartStore::load(FileStore::open(dir.path())?, INR);

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items().first().map(LineItem::unit_price), Some(799_00));

        Ok(())
    }
}
