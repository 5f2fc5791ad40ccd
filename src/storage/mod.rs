//! Durable storage primitive used for filter persistence.
//!
//! The engine only needs a synchronous string key-value store. Three
//! adapters ship with the crate: an in-memory map, one JSON file per entry,
//! and a sled tree.

mod file;
mod memory;
mod sled_storage;

pub use self::file::*;
pub use self::memory::*;
pub use self::sled_storage::*;


#[cfg(test)]
use mockall::automock;

use crate::StorageError;

#[cfg_attr(test, automock)]
pub trait DurableStorage: Send + Sync + 'static {
    fn get(
        &self,
        name: &str,
    ) -> Result<Option<String>, StorageError>;

    fn set(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), StorageError>;

    fn remove(
        &self,
        name: &str,
    ) -> Result<(), StorageError>;
}
