//! Dependency-tracked consumers of a [`FilterStore`].
//!
//! A [`FiltersView`] records every key its consumer reads. On each store
//! transition it compares only those keys, with
//! [`FilterValue::shallow_eq`], and calls the consumer back on the first
//! difference. The next read after a callback starts a fresh access list, so
//! keys read in an earlier episode stop counting. Until that read the old
//! list stays in effect.

mod handle;

pub use handle::*;


use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::value::shallow_eq_entry;
use crate::FilterKey;
use crate::FilterStore;
use crate::FilterValue;
use crate::FiltersMap;
use crate::StoreState;
use crate::Subscription;

#[derive(Debug, Default)]
pub(crate) struct AccessTracker {
    keys: Mutex<Vec<FilterKey>>,
    stale: AtomicBool,
}

impl AccessTracker {
    pub(crate) fn record(
        &self,
        key: &str,
    ) {
        let mut keys = self.keys.lock();
        if self.stale.swap(false, Ordering::AcqRel) {
            keys.clear();
        }
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    /// First observed key whose value differs between the two states.
    pub(crate) fn first_change(
        &self,
        prev: &StoreState,
        next: &StoreState,
    ) -> Option<FilterKey> {
        self.keys
            .lock()
            .iter()
            .find(|key| !shallow_eq_entry(prev.filters.get(*key), next.filters.get(*key)))
            .cloned()
    }

    pub(crate) fn end_episode(&self) {
        self.stale.store(true, Ordering::Release);
    }

    pub(crate) fn keys(&self) -> Vec<FilterKey> {
        self.keys.lock().clone()
    }
}

pub struct FiltersView {
    store: FilterStore,
    tracker: Arc<AccessTracker>,
    _subscription: Subscription,
}

impl FiltersView {
    pub fn new(
        store: &FilterStore,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let tracker = Arc::new(AccessTracker::default());
        let observer = tracker.clone();
        let subscription = store.subscribe(move |prev, next| {
            if let Some(key) = observer.first_change(prev, next) {
                trace!("view notified by change on {key:?}");
                observer.end_episode();
                on_change();
            }
        });

        Self {
            store: store.clone(),
            tracker,
            _subscription: subscription,
        }
    }

    /// Reads `key` and records it as a dependency of this consumer.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<FilterValue> {
        self.tracker.record(key);
        self.store.get(key)
    }

    /// Reads every filter; the consumer then depends on all keys.
    pub fn filters(&self) -> FiltersMap {
        let filters = self.store.state().filters.clone();
        for key in filters.keys() {
            self.tracker.record(key);
        }
        filters
    }

    /// Keys the consumer currently depends on.
    pub fn observed_keys(&self) -> Vec<FilterKey> {
        self.tracker.keys()
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn set_filter(
        &self,
        key: &str,
        value: impl Into<FilterValue>,
    ) {
        self.store.set_filter(key, value);
    }

    pub fn set_filters<I, K, V>(
        &self,
        entries: I,
    ) where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FilterKey>,
        V: Into<FilterValue>,
    {
        self.store.set_filters(entries);
    }

    pub fn reset_filter(
        &self,
        key: &str,
    ) {
        self.store.reset_filter(key);
    }

    pub fn reset_filters(&self) {
        self.store.reset_filters();
    }
}

impl std::fmt::Debug for FiltersView {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FiltersView")
            .field("observed_keys", &self.observed_keys())
            .finish()
    }
}
