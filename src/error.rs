//! Error types for the OSD provisioner
//!
//! Provides structured error types for all provisioning components including
//! partition scheme building, device formatting, desired-state publication,
//! and OSD bootstrap.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the provisioner
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // OSD Identity Errors
    // =========================================================================
    #[error("OSD identity not found at {path}: {reason}")]
    IdentityNotFound { path: PathBuf, reason: String },

    // =========================================================================
    // Device Formatting Errors
    // =========================================================================
    #[error("Device {device} already in use: {reason}")]
    DeviceInUse { device: String, reason: String },

    #[error("Partition tool failed during {operation}: `{command}`: {reason}")]
    PartitionToolFailure {
        operation: String,
        command: String,
        reason: String,
    },

    #[error("Partition label {label:?} does not match the ownership format")]
    MalformedOwnershipLabel { label: String },

    // =========================================================================
    // Desired-State Store Errors
    // =========================================================================
    #[error("Store error: {0}")]
    Store(String),

    #[error("Write conflict on {key} after {attempts} attempts")]
    StoreWriteConflict { key: String, attempts: u32 },

    // =========================================================================
    // Cluster Errors
    // =========================================================================
    #[error("Cluster auth error: {0}")]
    ClusterAuth(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is retryable by the caller.
    ///
    /// Store conflicts and transport failures are transient; everything that
    /// touched a disk is fatal for that device and owned by the orchestrator's
    /// whole-operation retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::StoreWriteConflict { .. } | Error::ClusterAuth(_)
        )
    }

    /// Check if this error is the expected first-boot signal: the OSD has not
    /// been bootstrapped on this node yet.
    pub fn is_not_bootstrapped(&self) -> bool {
        matches!(self, Error::IdentityNotFound { .. })
    }
}

/// Result type alias for the provisioner
pub type Result<T> = std::result::Result<T, Error>;
