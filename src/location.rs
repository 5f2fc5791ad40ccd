//! Navigation seam: where the raw query string lives.

#[cfg(test)]
use mockall::automock;
use parking_lot::RwLock;
use tracing::trace;

#[cfg_attr(test, automock)]
pub trait Location: Send + Sync + 'static {
    /// Current raw query string, possibly with a leading `?`.
    fn query(&self) -> String;

    /// Replaces the query string in place, without adding a history entry.
    fn replace_query(
        &self,
        raw: &str,
    );
}

/// Location kept in memory, with a navigation history.
///
/// `replace_query` rewrites the current entry; only [`MemoryLocation::push_query`]
/// grows the history.
#[derive(Debug)]
pub struct MemoryLocation {
    history: RwLock<Vec<String>>,
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryLocation {
    pub fn new(initial_query: impl Into<String>) -> Self {
        Self {
            history: RwLock::new(vec![initial_query.into()]),
        }
    }

    /// Navigates to a new query, adding a history entry.
    pub fn push_query(
        &self,
        raw: impl Into<String>,
    ) {
        self.history.write().push(raw.into());
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> String {
        self.history.read().last().cloned().unwrap_or_default()
    }

    fn replace_query(
        &self,
        raw: &str,
    ) {
        trace!("replace query with {raw:?}");
        let mut history = self.history.write();
        match history.last_mut() {
            Some(current) => *current = raw.to_string(),
            None => history.push(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_does_not_grow_history() {
        let location = MemoryLocation::new("?category=dog");
        location.replace_query("?category=cat");

        assert_eq!(location.query(), "?category=cat");
        assert_eq!(location.history_len(), 1);
    }

    #[test]
    fn push_grows_history() {
        let location = MemoryLocation::default();
        location.push_query("?page=2");

        assert_eq!(location.query(), "?page=2");
        assert_eq!(location.history_len(), 2);
    }
}
