//! Adapter registry
//!
//! Built explicitly at startup and handed to the orchestrator; it is not
//! mutated while a run is in progress.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use common::{Error, Result};

use crate::adapter::Adapter;

/// Name to adapter lookup table
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name.
    ///
    /// Registering a name twice replaces the earlier adapter (last
    /// registration wins); the replaced adapter is returned.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) -> Option<Arc<dyn Adapter>> {
        let name = adapter.name().to_string();
        let previous = self.adapters.insert(name.clone(), adapter);
        if previous.is_some() {
            warn!(adapter = %name, "Adapter registered twice, keeping the latest");
        } else {
            debug!(adapter = %name, "Adapter registered");
        }
        previous
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, adapter: impl Adapter + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Adapter>> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::AdapterNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.adapters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;
    use assert_matches::assert_matches;
    use common::Ticker;

    #[test]
    fn test_register_and_lookup() {
        let registry = AdapterRegistry::new()
            .with(MockAdapter::new())
            .with(MockAdapter::new().with_name("backup"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("mock"));
        assert_eq!(registry.get("backup").unwrap().name(), "backup");
        assert_eq!(
            registry.names().into_iter().collect::<Vec<_>>(),
            vec!["backup".to_string(), "mock".to_string()]
        );
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let registry = AdapterRegistry::new();
        assert_matches!(
            registry.get("polygon").err(),
            Some(Error::AdapterNotFound(name)) if name == "polygon"
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_last_wins() {
        let mut registry = AdapterRegistry::new();
        assert!(registry.register(Arc::new(MockAdapter::new())).is_none());
        let replaced = registry.register(Arc::new(MockAdapter::new().with_failure("second")));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);

        let adapter = registry.get("mock").unwrap();
        let result = adapter.fetch(&[Ticker::new("A").unwrap()]).await;
        assert!(result.is_err(), "latest registration should be active");
    }
}
