//! Registry of reasoning-agent strategies.
//!
//! The registry stores strategy factories (closures) rather than strategy
//! instances, so services are created fresh when needed. The orchestration
//! engine calls [`AgentServiceRegistry::create_registry`] once per
//! evaluation run to get an instance map that shares no state with any
//! other run.
//!
//! # Example
//!
//! ```
//! use gauntlet_core::agent::registry::AgentServiceRegistry;
//! use gauntlet_core::agent::DirectService;
//!
//! let mut registry = AgentServiceRegistry::default();
//! registry.register_service("direct_terse", || Box::new(DirectService::new()));
//!
//! let service = registry.create_service("direct_terse").unwrap();
//! assert_eq!(service.agent_type(), "none");
//! ```

use super::{ChainOfThoughtService, DirectService, ReasoningAgentService};
use super::chain_of_thought::CHAIN_OF_THOUGHT_AGENT_TYPE;
use super::direct::DIRECT_AGENT_TYPE;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Factory function type for creating strategy instances.
///
/// `Arc<dyn Fn() -> ...>` lets factories be cloned and shared between a
/// registry and the instance maps built from it.
pub type ServiceFactory = Arc<dyn Fn() -> Box<dyn ReasoningAgentService> + Send + Sync>;

/// Error returned when a requested agent type has no registered factory.
#[derive(Debug, Clone, Error)]
#[error("unknown agent type '{requested}'; supported types: {types}", types = .supported.join(", "))]
pub struct UnknownAgentType {
    /// The type that was asked for.
    pub requested: String,
    /// Every type the registry can create, sorted.
    pub supported: Vec<String>,
}

/// Registry mapping agent types to strategy factories.
///
/// A pure catalog: it holds no instances and no per-run state. Cloning a
/// registry shares the factories but not any instances they produce, and
/// registering a new type never mutates instance maps created earlier.
#[derive(Clone)]
pub struct AgentServiceRegistry {
    factories: HashMap<String, ServiceFactory>,
}

impl AgentServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the built-in strategies registered:
    /// `"none"` (direct prompting) and `"chain_of_thought"`.
    pub fn with_builtin_services() -> Self {
        let mut registry = Self::new();
        registry.register_service(DIRECT_AGENT_TYPE, || Box::new(DirectService::new()));
        registry.register_service(CHAIN_OF_THOUGHT_AGENT_TYPE, || {
            Box::new(ChainOfThoughtService::new())
        });
        registry
    }

    /// Register a strategy factory under the given agent type.
    ///
    /// Re-registering a type replaces its factory. Instance maps produced
    /// by earlier [`create_registry`](Self::create_registry) calls are
    /// unaffected.
    pub fn register_service<F>(&mut self, agent_type: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ReasoningAgentService> + Send + Sync + 'static,
    {
        self.factories.insert(agent_type.into(), Arc::new(factory));
    }

    /// Instantiate a fresh strategy for the given agent type.
    pub fn create_service(
        &self,
        agent_type: &str,
    ) -> Result<Box<dyn ReasoningAgentService>, UnknownAgentType> {
        match self.factories.get(agent_type) {
            Some(factory) => Ok(factory()),
            None => Err(UnknownAgentType {
                requested: agent_type.to_string(),
                supported: self.supported_types(),
            }),
        }
    }

    /// Build a fresh `agent_type -> instance` map for one evaluation run.
    ///
    /// Two calls return maps with the same keys and concrete types but
    /// distinct instances, so per-instance state never leaks across runs.
    pub fn create_registry(&self) -> HashMap<String, Box<dyn ReasoningAgentService>> {
        self.factories
            .iter()
            .map(|(agent_type, factory)| (agent_type.clone(), factory()))
            .collect()
    }

    /// All registered agent types, sorted alphabetically.
    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<_> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Check whether an agent type is registered.
    pub fn contains(&self, agent_type: &str) -> bool {
        self.factories.contains_key(agent_type)
    }

    /// Number of registered agent types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for AgentServiceRegistry {
    /// The default registry carries the built-in strategies.
    fn default() -> Self {
        Self::with_builtin_services()
    }
}

impl std::fmt::Debug for AgentServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentServiceRegistry")
            .field("supported_types", &self.supported_types())
            .finish()
    }
}
