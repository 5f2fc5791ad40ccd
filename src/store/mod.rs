//! The filter store: canonical filters, query subscriptions and listeners.
//!
//! State is an immutable [`StoreState`] snapshot swapped atomically on every
//! transition, so snapshots handed to listeners and readers stay valid after
//! later mutations. Mutations, and the write-back they arm, are serialized;
//! listeners run after the swap, outside any lock, in registration order.

mod subscription;

pub use subscription::*;


use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::metrics;
use crate::metrics::UNKNOWN_KEY_MUTATIONS;
use crate::resolver::load_initial_filters;
use crate::Backends;
use crate::Error;
use crate::FilterKey;
use crate::FilterValue;
use crate::FiltersConfig;
use crate::FiltersMap;
use crate::FiltersView;
use crate::Result;
use crate::WriteBackScheduler;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub filters: FiltersMap,
    /// Keys a live consumer wants written to the query string
    pub subscribed_keys: BTreeSet<FilterKey>,
}

pub type Listener = dyn Fn(&StoreState, &StoreState) + Send + Sync;

/// Cheap-to-clone handle on one store instance.
#[derive(Clone)]
pub struct FilterStore {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    defaults: FiltersMap,
    storage_name: String,
    state: ArcSwap<StoreState>,
    write_lock: Mutex<()>,
    listeners: RwLock<BTreeMap<u64, Arc<Listener>>>,
    next_listener_id: AtomicU64,
    query_interest: Mutex<HashMap<FilterKey, usize>>,
    scheduler: WriteBackScheduler,
}

impl FilterStore {
    /// Resolves the initial filters from `backends` and builds the store.
    ///
    /// Must be called from within a tokio runtime: the write-back timer is
    /// spawned on it.
    pub fn new(
        config: FiltersConfig,
        backends: Backends,
    ) -> Result<Self> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|_| Error::RuntimeUnavailable)?;
        metrics::ensure_registered();

        let filters = load_initial_filters(&config, &backends);
        info!(
            "filters store {:?} initialized with {} keys",
            config.storage_name,
            filters.len()
        );

        let scheduler = WriteBackScheduler::new(handle, &config, backends);
        Ok(Self {
            inner: Arc::new(StoreInner {
                defaults: config.initial_filters,
                storage_name: config.storage_name,
                state: ArcSwap::from_pointee(StoreState {
                    filters,
                    subscribed_keys: BTreeSet::new(),
                }),
                write_lock: Mutex::new(()),
                listeners: RwLock::new(BTreeMap::new()),
                next_listener_id: AtomicU64::new(0),
                query_interest: Mutex::new(HashMap::new()),
                scheduler,
            }),
        })
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<StoreState> {
        self.inner.state.load_full()
    }

    /// Current value of one filter.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<FilterValue> {
        self.inner.state.load().filters.get(key).cloned()
    }

    /// Default values supplied at construction. Also the fixed key space.
    pub fn defaults(&self) -> &FiltersMap {
        &self.inner.defaults
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.inner.defaults.contains_key(key)
    }

    pub fn storage_name(&self) -> &str {
        &self.inner.storage_name
    }

    pub fn scheduler(&self) -> &WriteBackScheduler {
        &self.inner.scheduler
    }

    pub fn set_filter(
        &self,
        key: &str,
        value: impl Into<FilterValue>,
    ) {
        if !self.accepts(key, "update") {
            return;
        }

        let value = value.into();
        self.commit(true, |state| {
            let mut next = state.clone();
            next.filters.insert(key.to_string(), value);
            Some(next)
        });
    }

    /// Applies every known entry as one transition; unknown keys are skipped
    /// individually.
    pub fn set_filters<I, K, V>(
        &self,
        entries: I,
    ) where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FilterKey>,
        V: Into<FilterValue>,
    {
        let accepted: Vec<(FilterKey, FilterValue)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(key, _)| self.accepts(key, "update"))
            .collect();

        if accepted.is_empty() {
            return;
        }

        self.commit(true, |state| {
            let mut next = state.clone();
            next.filters.extend(accepted);
            Some(next)
        });
    }

    /// Restores the construction-time default of `key`.
    pub fn reset_filter(
        &self,
        key: &str,
    ) {
        if !self.accepts(key, "reset") {
            return;
        }

        let default = self.inner.defaults.get(key).cloned().unwrap_or_default();
        self.commit(true, |state| {
            let mut next = state.clone();
            next.filters.insert(key.to_string(), default);
            Some(next)
        });
    }

    /// Restores every default, keeping the query subscriptions.
    pub fn reset_filters(&self) {
        let defaults = self.inner.defaults.clone();
        self.commit(true, |state| {
            Some(StoreState {
                filters: defaults,
                subscribed_keys: state.subscribed_keys.clone(),
            })
        });
    }

    /// Marks `key` as wanted in the query string. Idempotent; does not
    /// schedule persistence.
    pub fn subscribe_key(
        &self,
        key: &str,
    ) {
        if !self.accepts(key, "subscribe") {
            return;
        }

        self.commit(false, |state| {
            if state.subscribed_keys.contains(key) {
                return None;
            }
            let mut next = state.clone();
            next.subscribed_keys.insert(key.to_string());
            Some(next)
        });
    }

    /// Idempotent inverse of [`FilterStore::subscribe_key`].
    pub fn unsubscribe_key(
        &self,
        key: &str,
    ) {
        self.commit(false, |state| {
            if !state.subscribed_keys.contains(key) {
                return None;
            }
            let mut next = state.clone();
            next.subscribed_keys.remove(key);
            Some(next)
        });
    }

    /// Registers `listener` for every committed transition. The listener
    /// stays registered until the returned [`Subscription`] is dropped.
    pub fn subscribe(
        &self,
        listener: impl Fn(&StoreState, &StoreState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().insert(id, Arc::new(listener));
        Subscription::new(Arc::downgrade(&self.inner), id)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Dependency-tracked view; `on_change` runs when a key it read changes.
    pub fn view(
        &self,
        on_change: impl Fn() + Send + Sync + 'static,
    ) -> FiltersView {
        FiltersView::new(self, on_change)
    }

    /// Persists the current state now instead of waiting for the timer.
    pub fn flush(&self) {
        self.inner.scheduler.flush(&self.state());
    }

    /// Removes the persisted payload from durable storage.
    pub fn clear_persisted(&self) {
        self.inner.scheduler.clear_storage();
    }

    /// Counted subscription used by per-key consumers: the key enters the
    /// subscription set with its first holder and leaves with its last.
    /// The count changes inside the same commit as the set.
    pub(crate) fn acquire_query_interest(
        &self,
        key: &str,
    ) {
        if !self.accepts(key, "subscribe") {
            return;
        }

        self.commit(false, |state| {
            let mut interest = self.inner.query_interest.lock();
            *interest.entry(key.to_string()).or_insert(0) += 1;
            if state.subscribed_keys.contains(key) {
                return None;
            }
            let mut next = state.clone();
            next.subscribed_keys.insert(key.to_string());
            Some(next)
        });
    }

    pub(crate) fn release_query_interest(
        &self,
        key: &str,
    ) {
        self.commit(false, |state| {
            let mut interest = self.inner.query_interest.lock();
            match interest.get_mut(key) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    return None;
                }
                Some(_) => {
                    interest.remove(key);
                }
                None => return None,
            }
            if !state.subscribed_keys.contains(key) {
                return None;
            }
            let mut next = state.clone();
            next.subscribed_keys.remove(key);
            Some(next)
        });
    }

    fn accepts(
        &self,
        key: &str,
        action: &str,
    ) -> bool {
        if self.inner.defaults.contains_key(key) {
            return true;
        }

        warn!(
            "The \"{}\" key you are trying to {} is not defined in the initial filters, so it is skipped.",
            key, action
        );
        UNKNOWN_KEY_MUTATIONS
            .with_label_values(&[self.inner.storage_name.as_str()])
            .inc();
        false
    }

    /// Swaps in the next state and arms persistence under the write lock,
    /// so the timer always carries the latest committed state. Listeners run
    /// after the lock is released.
    fn commit(
        &self,
        persist: bool,
        update: impl FnOnce(&StoreState) -> Option<StoreState>,
    ) {
        let (prev, next) = {
            let _guard = self.inner.write_lock.lock();
            let prev = self.inner.state.load_full();
            let Some(next) = update(&prev) else {
                return;
            };
            let next = Arc::new(next);
            self.inner.state.store(next.clone());
            if persist {
                self.inner.scheduler.schedule(next.clone());
            }
            (prev, next)
        };

        self.notify(&prev, &next);
    }

    fn notify(
        &self,
        prev: &StoreState,
        next: &StoreState,
    ) {
        let listeners: Vec<Arc<Listener>> = self.inner.listeners.read().values().cloned().collect();
        debug!("notifying {} listeners", listeners.len());
        for listener in listeners {
            listener(prev, next);
        }
    }
}

impl std::fmt::Debug for FilterStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FilterStore")
            .field("storage_name", &self.inner.storage_name)
            .field("state", &self.state())
            .finish()
    }
}
