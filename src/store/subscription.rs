use std::sync::Weak;

use super::StoreInner;

/// Listener registration guard. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters the listener immediately"]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(
        store: Weak<StoreInner>,
        id: u64,
    ) -> Self {
        Self { store, id }
    }

    /// Unregisters now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.listeners.read().contains_key(&self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.listeners.write().remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
