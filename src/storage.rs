//! File-backed key-value storage: one `<key>.json` file per key.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::error::StorageError;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Raw value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Store `value` under `key`. The write lands atomically.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {
                debug!(key, "Removed key");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_get_remove() -> Result<(), StorageError> {
        let dir = tempdir()?;
        let storage = LocalStorage::new(dir.path().join("nested"));
        assert_eq!(storage.get("k")?, None);

        storage.set("k", "[1]")?;
        assert_eq!(storage.get("k")?.as_deref(), Some("[1]"));

        storage.remove("k")?;
        storage.remove("k")?;
        assert_eq!(storage.get("k")?, None);
        Ok(())
    }
}
