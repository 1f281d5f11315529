//! Strategy registry for lookup by name.
//!
//! The `StrategyRegistry` maps names to factories. It is built explicitly
//! and handed to the orchestrator; there is no process-wide registry.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

use super::minimax::MinimaxStrategy;
use super::traits::{FirstLegalStrategy, GreedyStrategy, Strategy, UniformStrategy};

type StrategyFactory = Box<dyn Fn() -> Arc<dyn Strategy> + Send + Sync>;

/// Registry of strategy factories.
///
/// ## Example
///
/// ```
/// use othello_selfplay::strategy::{StrategyRegistry, UniformStrategy};
/// use std::sync::Arc;
///
/// let mut registry = StrategyRegistry::new();
/// registry.register("coin-flip", || Arc::new(UniformStrategy::new()));
///
/// let strategy = registry.build("coin-flip").unwrap();
/// assert_eq!(strategy.name(), "uniform");
/// assert!(registry.build("missing").is_err());
/// ```
#[derive(Default)]
pub struct StrategyRegistry {
    factories: FxHashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in strategies:
    /// `uniform`, `first-legal`, `greedy`, `minimax`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("uniform", || Arc::new(UniformStrategy::new()));
        registry.register("first-legal", || Arc::new(FirstLegalStrategy::new()));
        registry.register("greedy", || Arc::new(GreedyStrategy::new()));
        registry.register("minimax", || Arc::new(MinimaxStrategy::default()));
        registry
    }

    /// Register a factory under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Strategy> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Build a strategy by name.
    pub fn build(&self, name: &str) -> Result<Arc<dyn Strategy>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownStrategy(name.to_string()))
    }

    /// Check if a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("names", &self.names())
            .finish()
    }
}
