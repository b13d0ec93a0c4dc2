//! Domain Ports - Core trait definitions for the OSD provisioner
//!
//! These traits define the boundaries between the provisioning logic and
//! external systems. Adapters implement these traits to provide concrete
//! functionality; tests supply recording fakes.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// Command Executor Port
// =============================================================================

/// Port for invoking external system tools (`sgdisk`, `lsblk`, `df`).
///
/// Partitioning commands are not idempotent mid-sequence, so callers issue
/// them strictly one at a time and treat any failure as fatal for the device.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion, discarding its output.
    ///
    /// `name` is a short human-readable label for the operation, carried into
    /// logs and errors.
    async fn execute(&self, name: &str, command: &str, args: &[String]) -> Result<()>;

    /// Run a command to completion and return its stdout.
    async fn execute_with_output(
        &self,
        name: &str,
        command: &str,
        args: &[String],
    ) -> Result<String>;
}

// =============================================================================
// Desired-State Store Port
// =============================================================================

/// Port for the cluster-wide desired-state store.
///
/// Keys are slash-separated paths; values are plain strings. The store is the
/// single shared mutable resource in this subsystem, so set-valued keys must
/// be updated through `compare_and_set` rather than blind writes.
#[async_trait]
pub trait DesiredStateStore: Send + Sync {
    /// Read the value at `key`, or `None` if it has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally upsert `key` to `value`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Atomically write `value` at `key` only if the current value equals
    /// `expected` (`None` meaning the key must be absent). Returns `false`
    /// when the precondition does not hold.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool>;
}

// =============================================================================
// Cluster Connection Port
// =============================================================================

/// Port for the cluster monitor RPC used during bootstrap.
#[async_trait]
pub trait ClusterConnection: Send + Sync {
    /// Issue a mon command and return its JSON response.
    async fn mon_command(&self, command: serde_json::Value) -> Result<serde_json::Value>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type CommandExecutorRef = Arc<dyn CommandExecutor>;
pub type DesiredStateStoreRef = Arc<dyn DesiredStateStore>;
pub type ClusterConnectionRef = Arc<dyn ClusterConnection>;
