use dashmap::DashMap;
use tracing::trace;

use super::DurableStorage;
use crate::StorageError;

/// In-memory storage, optionally bounded to emulate a browser-style quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would push the total stored bytes past `limit`.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            quota: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes_without(
        &self,
        name: &str,
    ) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != name)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(
        &self,
        name: &str,
    ) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(name).map(|entry| entry.value().clone()))
    }

    fn set(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if self.used_bytes_without(name) + name.len() + value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    name: name.to_string(),
                    limit,
                });
            }
        }

        trace!("memory storage set {name}: {} bytes", value.len());
        self.entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(
        &self,
        name: &str,
    ) -> Result<(), StorageError> {
        self.entries.remove(name);
        Ok(())
    }
}
