//! Agent Context
//!
//! Bundles the injected collaborators and node identity that every
//! provisioning operation needs.

use crate::domain::ports::{CommandExecutorRef, DesiredStateStoreRef};
use std::path::PathBuf;

/// Per-node context handed to provisioning operations.
#[derive(Clone)]
pub struct AgentContext {
    /// Executor for external partitioning and probing tools
    pub executor: CommandExecutorRef,
    /// Cluster-wide desired-state store
    pub store: DesiredStateStoreRef,
    /// Identity of this node in the cluster
    pub node_id: String,
    /// Root directory for node-local configuration
    pub config_dir: PathBuf,
}

impl AgentContext {
    /// Create a new context.
    pub fn new(
        executor: CommandExecutorRef,
        store: DesiredStateStoreRef,
        node_id: impl Into<String>,
        config_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            store,
            node_id: node_id.into(),
            config_dir: config_dir.into(),
        }
    }
}
