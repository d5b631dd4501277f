//! Registry of live optimization runs.

use super::OptimizationRun;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Keeps runs addressable by id so a caller can cancel or query a run
/// from another thread.
pub trait SessionStore: Send + Sync {
    /// Registers `run`, returning the run it replaced.
    fn insert(&self, id: &str, run: Arc<OptimizationRun>) -> Option<Arc<OptimizationRun>>;

    fn get(&self, id: &str) -> Option<Arc<OptimizationRun>>;

    fn remove(&self, id: &str) -> Option<Arc<OptimizationRun>>;

    /// Registered ids, sorted.
    fn ids(&self) -> Vec<String>;
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    runs: RwLock<HashMap<String, Arc<OptimizationRun>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<OptimizationRun>>> {
        self.runs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<OptimizationRun>>> {
        self.runs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, id: &str, run: Arc<OptimizationRun>) -> Option<Arc<OptimizationRun>> {
        self.write().insert(id.to_string(), run)
    }

    fn get(&self, id: &str) -> Option<Arc<OptimizationRun>> {
        self.read().get(id).cloned()
    }

    fn remove(&self, id: &str) -> Option<Arc<OptimizationRun>> {
        self.write().remove(id)
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::session::RunInput;

    fn run() -> Arc<OptimizationRun> {
        Arc::new(OptimizationRun::initialize(RunInput::new(fixtures::sample_records())).unwrap())
    }

    #[test]
    fn test_insert_get_remove() {
        let store = InMemorySessionStore::new();
        assert!(store.insert("b", run()).is_none());
        assert!(store.insert("a", run()).is_none());
        assert!(store.insert("a", run()).is_some());
        assert_eq!(store.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.get("a").is_some());
        assert!(store.remove("a").is_some());
        assert!(store.get("a").is_none());
        assert_eq!(store.ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_cancel_through_store_affects_only_that_run() {
        let store = InMemorySessionStore::new();
        store.insert("one", run());
        store.insert("two", run());
        store.get("one").unwrap().cancel();
        assert!(store.get("one").unwrap().cancel_token().is_cancelled());
        assert!(!store.get("two").unwrap().cancel_token().is_cancelled());
    }
}
