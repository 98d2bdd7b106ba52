//! Strategy registry

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use common::{Error, Result};

use crate::strategy::Strategy;

/// Name to strategy lookup table, populated at startup
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy; a repeated name replaces the earlier one
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) -> Option<Arc<dyn Strategy>> {
        let name = strategy.name().to_string();
        let previous = self.strategies.insert(name.clone(), strategy);
        if previous.is_some() {
            warn!(strategy = %name, "Strategy registered twice, keeping the latest");
        } else {
            debug!(strategy = %name, "Strategy registered");
        }
        previous
    }

    pub fn with(mut self, strategy: impl Strategy + 'static) -> Self {
        self.register(Arc::new(strategy));
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Strategy>> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| Error::StrategyNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.strategies.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
