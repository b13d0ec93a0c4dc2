//! Partition Scheme Builder
//!
//! Computes the ordered set of partitions (WAL, DB, BLOCK) for an OSD, for
//! both collocated and distributed metadata layouts. Both layouts produce the
//! same spec shape so the device formatter needs no mode-specific logic; the
//! mode only changes which device each role targets and how many OSDs' specs
//! end up on one physical device.
//!
//! Partition ordering is significant: specs are emitted WAL, DB, BLOCK on a
//! data device, and WAL, DB, WAL, DB, ... across OSDs on a shared metadata
//! device. Downstream tooling addresses partitions by ordinal position, so the
//! physical partition table must be created in exactly this emission order.

use crate::error::Result;
use crate::provision::ownership::partition_label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Default WAL partition size when the bluestore config does not override it
pub const WAL_DEFAULT_SIZE_MB: u64 = 576;

/// Default DB partition size when the bluestore config does not override it
pub const DB_DEFAULT_SIZE_MB: u64 = 20480;

/// Size value meaning "take the remainder of the disk"
pub const REMAINING_SPACE: u64 = 0;

/// File name for the persisted partition scheme under a config directory
const SCHEME_FILE_NAME: &str = "partition-scheme.json";

// =============================================================================
// Partition Roles
// =============================================================================

/// Role a partition plays for the storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionRole {
    Wal,
    Db,
    Block,
}

impl std::fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionRole::Wal => write!(f, "WAL"),
            PartitionRole::Db => write!(f, "DB"),
            PartitionRole::Block => write!(f, "BLOCK"),
        }
    }
}

impl PartitionRole {
    /// Parse the role token used in partition labels.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "WAL" => Some(PartitionRole::Wal),
            "DB" => Some(PartitionRole::Db),
            "BLOCK" => Some(PartitionRole::Block),
            _ => None,
        }
    }
}

// =============================================================================
// Bluestore Configuration
// =============================================================================

/// Partition size overrides for the bluestore backend.
///
/// A zero value means "use the backend default size" for that partition.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BluestoreConfig {
    pub wal_size_mb: u64,
    pub database_size_mb: u64,
}

impl BluestoreConfig {
    fn wal_size(&self) -> u64 {
        if self.wal_size_mb == 0 {
            WAL_DEFAULT_SIZE_MB
        } else {
            self.wal_size_mb
        }
    }

    fn database_size(&self) -> u64 {
        if self.database_size_mb == 0 {
            DB_DEFAULT_SIZE_MB
        } else {
            self.database_size_mb
        }
    }
}

// =============================================================================
// Partition Spec
// =============================================================================

/// One partition to be created on a physical device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// 1-based ordinal in the device's partition table
    pub num: u32,
    pub role: PartitionRole,
    /// Short device name (e.g. `sda`)
    pub device: String,
    /// Partition size; `REMAINING_SPACE` takes the rest of the disk
    pub size_mb: u64,
    /// Ownership label embedded in the GPT entry
    pub label: String,
    /// GUID assigned to the partition entry
    pub partition_uuid: Uuid,
    /// GUID assigned to the whole disk when this spec is committed
    pub disk_uuid: Uuid,
}

impl PartitionSpec {
    /// The `sgdisk` arguments that create, name, and identify this partition.
    pub fn sgdisk_args(&self) -> Vec<String> {
        let new_part = if self.size_mb == REMAINING_SPACE {
            format!("--largest-new={}", self.num)
        } else {
            format!("--new={}:0:+{}M", self.num, self.size_mb)
        };
        vec![
            new_part,
            format!("--change-name={}:{}", self.num, self.label),
            format!("--partition-guid={}:{}", self.num, self.partition_uuid),
        ]
    }
}

// =============================================================================
// Partition Scheme Entry
// =============================================================================

/// The full partition layout for a single OSD.
///
/// Built once per OSD and never mutated after population; a layout change
/// requires a new entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionSchemeEntry {
    pub osd_id: u32,
    pub osd_uuid: Uuid,
    /// Whether WAL/DB share the data device
    pub collocated: bool,
    /// Specs in emission order
    pub partitions: Vec<PartitionSpec>,
}

impl PartitionSchemeEntry {
    /// Create an empty entry; the caller fills `osd_id` and `osd_uuid` before
    /// populating partitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a collocated layout: WAL, DB, and BLOCK all on `device`.
    ///
    /// WAL and DB sizes come from `config` (or the backend defaults), BLOCK
    /// takes the remainder of the disk. All three specs share one fresh disk
    /// GUID since they land on the same physical device.
    pub fn populate_collocated(&mut self, device: &str, config: &BluestoreConfig) {
        let disk_uuid = Uuid::new_v4();
        self.collocated = true;
        self.push_spec(1, PartitionRole::Wal, device, config.wal_size(), disk_uuid);
        self.push_spec(2, PartitionRole::Db, device, config.database_size(), disk_uuid);
        self.push_spec(3, PartitionRole::Block, device, REMAINING_SPACE, disk_uuid);
    }

    /// Populate a distributed layout: WAL and DB on the shared metadata
    /// device, BLOCK on `data_device`.
    ///
    /// The WAL/DB partition numbers continue the accumulator's sequence so
    /// that every OSD assigned to the metadata device gets its pair in
    /// assignment order. The matching records are appended to `metadata` for
    /// the later single-pass commit.
    pub fn populate_distributed(
        &mut self,
        data_device: &str,
        metadata: &mut MetadataDeviceInfo,
        config: &BluestoreConfig,
    ) {
        self.collocated = false;

        let wal_num = metadata.partitions.len() as u32 + 1;
        let wal = self.push_metadata_spec(
            wal_num,
            PartitionRole::Wal,
            config.wal_size(),
            metadata,
        );
        metadata.partitions.push(wal);

        let db = self.push_metadata_spec(
            wal_num + 1,
            PartitionRole::Db,
            config.database_size(),
            metadata,
        );
        metadata.partitions.push(db);

        let block_disk_uuid = Uuid::new_v4();
        self.push_spec(
            1,
            PartitionRole::Block,
            data_device,
            REMAINING_SPACE,
            block_disk_uuid,
        );
    }

    /// The BLOCK spec of this entry, if populated.
    pub fn block_partition(&self) -> Option<&PartitionSpec> {
        self.partitions
            .iter()
            .find(|p| p.role == PartitionRole::Block)
    }

    /// The data device this entry's BLOCK partition targets, if populated.
    pub fn data_device(&self) -> Option<&str> {
        self.block_partition().map(|p| p.device.as_str())
    }

    fn push_spec(
        &mut self,
        num: u32,
        role: PartitionRole,
        device: &str,
        size_mb: u64,
        disk_uuid: Uuid,
    ) {
        self.partitions.push(PartitionSpec {
            num,
            role,
            device: device.to_string(),
            size_mb,
            label: partition_label(self.osd_id, role),
            partition_uuid: Uuid::new_v4(),
            disk_uuid,
        });
    }

    /// Push a WAL/DB spec onto this entry targeting the metadata device, and
    /// return the matching accumulator record.
    fn push_metadata_spec(
        &mut self,
        num: u32,
        role: PartitionRole,
        size_mb: u64,
        metadata: &MetadataDeviceInfo,
    ) -> MetadataPartition {
        let partition_uuid = Uuid::new_v4();
        self.partitions.push(PartitionSpec {
            num,
            role,
            device: metadata.device.clone(),
            size_mb,
            label: partition_label(self.osd_id, role),
            partition_uuid,
            disk_uuid: metadata.disk_uuid,
        });
        MetadataPartition {
            osd_id: self.osd_id,
            role,
            size_mb,
            partition_uuid,
        }
    }
}

// =============================================================================
// Metadata Device Info
// =============================================================================

/// One WAL or DB partition accumulated on a shared metadata device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataPartition {
    pub osd_id: u32,
    pub role: PartitionRole,
    pub size_mb: u64,
    pub partition_uuid: Uuid,
}

/// A single physical device hosting WAL/DB partitions for one or more OSDs in
/// distributed mode.
///
/// Grows by appending as OSDs are assigned to it; the partition table is only
/// written when the accumulated layout is committed in a single pass, so a
/// partial provisioning failure never leaves a half-applied table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDeviceInfo {
    /// Short device name (e.g. `sda`)
    pub device: String,
    /// GUID assigned to the disk when the layout is committed
    pub disk_uuid: Uuid,
    /// Accumulated partitions in assignment order
    pub partitions: Vec<MetadataPartition>,
}

impl MetadataDeviceInfo {
    /// Create an empty accumulator for one physical metadata device.
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            disk_uuid: Uuid::new_v4(),
            partitions: Vec::new(),
        }
    }

    /// Materialize the accumulated records as partition specs in append
    /// order, numbered 1..n.
    pub fn partition_specs(&self) -> Vec<PartitionSpec> {
        self.partitions
            .iter()
            .enumerate()
            .map(|(i, p)| PartitionSpec {
                num: i as u32 + 1,
                role: p.role,
                device: self.device.clone(),
                size_mb: p.size_mb,
                label: partition_label(p.osd_id, p.role),
                partition_uuid: p.partition_uuid,
                disk_uuid: self.disk_uuid,
            })
            .collect()
    }

    /// The distinct OSD IDs sharing this device.
    pub fn osd_ids(&self) -> BTreeSet<u32> {
        self.partitions.iter().map(|p| p.osd_id).collect()
    }
}

// =============================================================================
// Partition Scheme
// =============================================================================

/// The complete partition layout computed for one provisioning pass: one
/// entry per OSD plus the optional shared metadata device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionScheme {
    pub entries: Vec<PartitionSchemeEntry>,
    pub metadata: Option<MetadataDeviceInfo>,
}

impl PartitionScheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the persisted scheme under `config_dir`.
    pub fn file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(SCHEME_FILE_NAME)
    }

    /// Persist the scheme as JSON under `config_dir` so the OSD start-up path
    /// can recover the layout it was given.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)?;
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(Self::file_path(config_dir), raw)?;
        Ok(())
    }

    /// Load a previously persisted scheme, or `None` if none was saved.
    pub fn load(config_dir: &Path) -> Result<Option<Self>> {
        let path = Self::file_path(config_dir);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }
}
