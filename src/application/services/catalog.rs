//! Executor catalog - compiled-in handlers that module files refer to by key

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::traits::{CommandExecutor, EventExecutor};

/// Maps an `execute` key to the executor it names
pub struct ExecutorCatalog<E: ?Sized> {
    entries: HashMap<String, Arc<E>>,
}

pub type CommandCatalog = ExecutorCatalog<dyn CommandExecutor>;
pub type EventCatalog = ExecutorCatalog<dyn EventExecutor>;

impl<E: ?Sized> ExecutorCatalog<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register an executor under `key`, replacing any previous one
    pub fn register(&mut self, key: impl Into<String>, executor: Arc<E>) -> &mut Self {
        let key = key.into();
        if self.entries.insert(key.clone(), executor).is_some() {
            tracing::warn!("Executor '{}' registered twice; keeping the latest", key);
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, executor: Arc<E>) -> Self {
        self.register(key, executor);
        self
    }

    pub fn resolve(&self, key: &str) -> Option<Arc<E>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: ?Sized> Default for ExecutorCatalog<E> {
    fn default() -> Self {
        Self::new()
    }
}
