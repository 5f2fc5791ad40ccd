use std::sync::Arc;

use crate::DurableStorage;
use crate::FlatQueryCodec;
use crate::Location;
use crate::MemoryLocation;
use crate::MemoryStorage;
use crate::QueryCodec;

/// Injected collaborators a store reads from and persists to.
#[derive(Clone)]
pub struct Backends {
    pub codec: Arc<dyn QueryCodec>,
    pub location: Arc<dyn Location>,
    pub storage: Arc<dyn DurableStorage>,
}

impl Backends {
    pub fn new(
        codec: Arc<dyn QueryCodec>,
        location: Arc<dyn Location>,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        Self {
            codec,
            location,
            storage,
        }
    }

    /// Flat codec, empty in-memory location and in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(FlatQueryCodec),
            Arc::new(MemoryLocation::default()),
            Arc::new(MemoryStorage::new()),
        )
    }

    pub fn with_codec(
        mut self,
        codec: Arc<dyn QueryCodec>,
    ) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_location(
        mut self,
        location: Arc<dyn Location>,
    ) -> Self {
        self.location = location;
        self
    }

    pub fn with_storage(
        mut self,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        self.storage = storage;
        self
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}
