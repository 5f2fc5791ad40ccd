use std::path::Path;

use tracing::debug;
use tracing::warn;

use super::DurableStorage;
use crate::StorageError;

const FILTERS_TREE: &str = "_filters_tree";

/// Storage backed by a sled tree.
pub struct SledStorage {
    tree: sled::Tree,
}

impl SledStorage {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    /// Opens (or creates) a sled database at `path` and uses its filters tree.
    pub fn open(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self, StorageError> {
        debug!("open sled filters storage at: {:?}", &path);

        let db = sled::Config::default()
            .path(path.as_ref())
            .cache_capacity(4 * 1024 * 1024) //4MB
            .flush_every_ms(Some(100))
            .use_compression(true)
            .open()
            .map_err(|e| {
                warn!(
                    "Try to open DB at this location: {:?} and failed: {:?}",
                    path, e
                );
                e
            })?;

        Ok(Self::new(db.open_tree(FILTERS_TREE)?))
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.tree.flush()?;
        Ok(())
    }
}

impl DurableStorage for SledStorage {
    fn get(
        &self,
        name: &str,
    ) -> Result<Option<String>, StorageError> {
        match self.tree.get(name)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| StorageError::DataCorruption {
                    location: format!("{FILTERS_TREE}/{name}"),
                }),
            None => Ok(None),
        }
    }

    fn set(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        self.tree.insert(name, value.as_bytes())?;
        Ok(())
    }

    fn remove(
        &self,
        name: &str,
    ) -> Result<(), StorageError> {
        self.tree.remove(name)?;
        Ok(())
    }
}
