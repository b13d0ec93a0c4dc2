//! OSD Device Provisioner
//!
//! Provisions physical storage devices for a distributed storage daemon (OSD)
//! node: computes how metadata and data partitions are laid out on raw disks,
//! verifies it is safe to destroy/repartition a disk, performs the
//! partitioning, and publishes the resulting device-to-OSD ownership into the
//! cluster-wide desired-state store for the rest of the orchestrator to
//! converge on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      OSD Device Provisioner                         │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────┐   ┌───────────────────┐  ┌────────────────┐  │
//! │  │  Partition Scheme │──▶│  Ownership/Safety │─▶│    Device      │  │
//! │  │      Builder      │   │     Detector      │  │   Formatter    │  │
//! │  └───────────────────┘   └───────────────────┘  └───────┬────────┘  │
//! │                                                         │           │
//! │                                              ┌──────────┴────────┐  │
//! │                                              │   Desired-State   │  │
//! │                                              │     Publisher     │  │
//! │                                              └───────────────────┘  │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                        Injected Collaborators                       │
//! │  ┌────────────────┐  ┌─────────────────────┐  ┌──────────────────┐  │
//! │  │    Command     │  │    Desired-State    │  │     Cluster      │  │
//! │  │    Executor    │  │        Store        │  │    Connection    │  │
//! │  └────────────────┘  └─────────────────────┘  └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`provision`]: Partition schemes, ownership detection, device formatting
//! - [`state`]: Desired-state publication and the in-memory store adapter
//! - [`osd`]: OSD identity files and the bootstrap keyring
//! - [`exec`]: Shell adapter for the command executor port
//! - [`domain`]: Collaborator ports and the agent context
//! - [`error`]: Error types and handling

pub mod domain;
pub mod error;
pub mod exec;
pub mod osd;
pub mod provision;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use domain::{
    AgentContext, ClusterConnection, ClusterConnectionRef, CommandExecutor, CommandExecutorRef,
    DesiredStateStore, DesiredStateStoreRef,
};

pub use error::{Error, Result};

pub use exec::ShellExecutor;

pub use osd::{bootstrap_osd_keyring_path, create_osd_bootstrap_keyring, load_osd_info, OsdIdentity};

pub use provision::{
    block_partition_details, format_device, partition_bluestore_metadata, partition_bluestore_osd,
    rook_owns_partitions, BluestoreConfig, DiscoveredPartition, MetadataDeviceInfo, OsdConfig,
    PartitionRole, PartitionScheme, PartitionSchemeEntry, PartitionSpec,
};

pub use state::{device_role_key, publish_device_ownership, DeviceRole, MemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
