//! Provisioning Module
//!
//! Partition scheme computation, ownership detection, device probing, and the
//! destructive formatting path for OSD storage devices.

pub mod device;
pub mod ownership;
pub mod probe;
pub mod scheme;

pub use device::{
    block_partition_details, format_device, partition_bluestore_metadata, partition_bluestore_osd,
};
pub use ownership::{partition_label, rook_owns_partitions, OwnedLabel, OWNERSHIP_LABEL_PREFIX};
pub use probe::{get_device_filesystem, get_device_partitions, DiscoveredPartition};
pub use scheme::{
    BluestoreConfig, MetadataDeviceInfo, MetadataPartition, PartitionRole, PartitionScheme,
    PartitionSchemeEntry, PartitionSpec, DB_DEFAULT_SIZE_MB, REMAINING_SPACE, WAL_DEFAULT_SIZE_MB,
};

use std::path::{Path, PathBuf};
use uuid::Uuid;

// =============================================================================
// OSD Configuration
// =============================================================================

/// Everything needed to provision and later start one OSD on this node.
#[derive(Debug, Clone)]
pub struct OsdConfig {
    /// Numeric OSD identity in the cluster
    pub id: u32,
    /// Cluster-unique OSD UUID
    pub osd_uuid: Uuid,
    /// Node-local configuration root shared by all OSDs
    pub config_root: PathBuf,
    /// This OSD's own directory under the configuration root
    pub root_path: PathBuf,
    /// Partition layout for this OSD's devices
    pub scheme: PartitionSchemeEntry,
    /// Overwrite devices holding data this system does not own
    pub force_format: bool,
}

impl OsdConfig {
    /// Create a config rooted at `<config_root>/osd<id>`.
    pub fn new(id: u32, osd_uuid: Uuid, config_root: &Path, scheme: PartitionSchemeEntry) -> Self {
        Self {
            id,
            osd_uuid,
            config_root: config_root.to_path_buf(),
            root_path: config_root.join(format!("osd{}", id)),
            scheme,
            force_format: false,
        }
    }

    /// Same config with forced formatting enabled.
    pub fn with_force_format(mut self, force_format: bool) -> Self {
        self.force_format = force_format;
        self
    }
}
