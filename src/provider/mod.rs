//! Store ownership.
//!
//! A [`FiltersProvider`] owns one store; consumers reach it through a
//! [`FiltersScope`]. A scope with no provider behind it is a wiring mistake,
//! and every consumer operation on it fails with [`Error::MissingProvider`].


use tracing::debug;
use tracing::error;

use crate::Backends;
use crate::Error;
use crate::FilterHandle;
use crate::FilterStore;
use crate::FiltersConfig;
use crate::FiltersView;
use crate::Result;

#[derive(Debug)]
pub struct FiltersProvider {
    store: FilterStore,
}

impl FiltersProvider {
    pub fn new(
        config: FiltersConfig,
        backends: Backends,
    ) -> Result<Self> {
        Ok(Self {
            store: FilterStore::new(config, backends)?,
        })
    }

    /// Builds the store from a TOML file layered with `FILTERS__*` variables.
    pub fn from_config_file(
        path: &str,
        backends: Backends,
    ) -> Result<Self> {
        Self::new(FiltersConfig::load(Some(path))?, backends)
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn scope(&self) -> FiltersScope {
        FiltersScope {
            store: Some(self.store.clone()),
        }
    }
}

impl Drop for FiltersProvider {
    fn drop(&mut self) {
        if self.store.scheduler().has_pending() {
            debug!("flushing pending filters before provider shutdown");
            self.store.flush();
        }
    }
}

/// What a consumer holds: a provider's store, or nothing.
#[derive(Debug, Clone, Default)]
pub struct FiltersScope {
    store: Option<FilterStore>,
}

impl FiltersScope {
    /// A scope with no enclosing provider.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Result<&FilterStore> {
        self.store.as_ref().ok_or_else(|| {
            error!("filters consumer used outside of a FiltersProvider");
            Error::MissingProvider
        })
    }

    /// Whole-store consumer.
    pub fn use_filters(
        &self,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Result<FiltersView> {
        Ok(self.store()?.view(on_change))
    }

    /// Consumer bound to a single key.
    pub fn use_filter(
        &self,
        key: &str,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Result<FilterHandle> {
        FilterHandle::new(self.store()?, key, on_change)
    }
}
