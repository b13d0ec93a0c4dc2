//! Domain Module
//!
//! Core trait definitions (ports) and the node-level context handed to every
//! provisioning operation.

pub mod context;
pub mod ports;

pub use context::AgentContext;
pub use ports::{
    ClusterConnection, ClusterConnectionRef, CommandExecutor, CommandExecutorRef,
    DesiredStateStore, DesiredStateStoreRef,
};
