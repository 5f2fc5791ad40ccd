use tracing::trace;

use crate::value::shallow_eq_entry;
use crate::Error;
use crate::FilterKey;
use crate::FilterStore;
use crate::FilterValue;
use crate::Result;
use crate::Subscription;

/// Consumer bound to a single filter.
///
/// While alive it keeps its key in the store's query subscriptions, so the
/// value is written to the query string on the next persistence pass.
pub struct FilterHandle {
    key: FilterKey,
    store: FilterStore,
    _subscription: Subscription,
}

impl FilterHandle {
    pub fn new(
        store: &FilterStore,
        key: &str,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self> {
        if !store.contains_key(key) {
            return Err(Error::UndefinedFilter(key.to_string()));
        }

        let watched = key.to_string();
        let subscription = store.subscribe(move |prev, next| {
            if !shallow_eq_entry(prev.filters.get(&watched), next.filters.get(&watched)) {
                trace!("filter {watched:?} changed");
                on_change();
            }
        });
        store.acquire_query_interest(key);

        Ok(Self {
            key: key.to_string(),
            store: store.clone(),
            _subscription: subscription,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> FilterValue {
        self.store.get(&self.key).unwrap_or_default()
    }

    pub fn set(
        &self,
        value: impl Into<FilterValue>,
    ) {
        self.store.set_filter(&self.key, value);
    }

    pub fn reset(&self) {
        self.store.reset_filter(&self.key);
    }
}

impl Drop for FilterHandle {
    fn drop(&mut self) {
        self.store.release_query_interest(&self.key);
    }
}

impl std::fmt::Debug for FilterHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FilterHandle")
            .field("key", &self.key)
            .finish()
    }
}
