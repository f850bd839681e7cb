//! Actor registry for discovering actors by name.

use std::collections::HashMap;
use std::sync::RwLock;

use ractor::ActorRef;

use crate::messages::{JobMessage, SupervisorMessage};

/// Global actor registry for discovering actors.
///
/// This provides a way to look up actors by name without passing
/// references through the entire call stack.
pub struct ActorRegistry {
    supervisor: RwLock<Option<ActorRef<SupervisorMessage>>>,
    jobs: RwLock<HashMap<String, ActorRef<JobMessage>>>,
}

impl ActorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            supervisor: RwLock::new(None),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register the supervisor.
    pub fn register_supervisor(&self, supervisor: ActorRef<SupervisorMessage>) {
        *self.supervisor.write().unwrap() = Some(supervisor);
    }

    /// Get the supervisor.
    pub fn get_supervisor(&self) -> Option<ActorRef<SupervisorMessage>> {
        self.supervisor.read().unwrap().clone()
    }

    /// Register a job actor.
    pub fn register_job(&self, name: &str, job: ActorRef<JobMessage>) {
        self.jobs.write().unwrap().insert(name.to_string(), job);
    }

    /// Unregister a job actor.
    pub fn unregister_job(&self, name: &str) {
        self.jobs.write().unwrap().remove(name);
    }

    /// Get a job actor by name.
    pub fn get_job(&self, name: &str) -> Option<ActorRef<JobMessage>> {
        self.jobs.read().unwrap().get(name).cloned()
    }

    /// List all registered job names.
    pub fn list_jobs(&self) -> Vec<String> {
        self.jobs.read().unwrap().keys().cloned().collect()
    }
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance.
static REGISTRY: std::sync::LazyLock<ActorRegistry> = std::sync::LazyLock::new(ActorRegistry::new);

/// Get the global actor registry.
pub fn global_registry() -> &'static ActorRegistry {
    &REGISTRY
}
