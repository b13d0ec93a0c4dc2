//! Device Formatter & Metadata-Device Partitioner
//!
//! Executes the zap/clear/create partitioning sequence against a device,
//! gated by the ownership and filesystem probes. The create step emits every
//! partition of the scheme in a single `sgdisk` invocation so the table is
//! written in one pass, in emission order.
//!
//! Provisioning of a single device is sequential: each tool invocation is
//! awaited before the next, and any failure is fatal for this device. Whether
//! to retry the whole provisioning attempt is the caller's decision.

use crate::domain::AgentContext;
use crate::error::{Error, Result};
use crate::provision::ownership::rook_owns_partitions;
use crate::provision::probe::{get_device_filesystem, get_device_partitions};
use crate::provision::scheme::{MetadataDeviceInfo, PartitionSpec};
use crate::provision::OsdConfig;
use crate::state::publisher::{publish_device_ownership, DeviceRole};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

// =============================================================================
// Device Formatter
// =============================================================================

/// Partition the data device of `config`'s scheme entry.
///
/// Existing partitions block formatting unless they are all Rook-owned
/// (possibly by a different, since-removed OSD) or `force_format` is set. A
/// mounted filesystem always blocks unless forced.
pub async fn format_device(
    context: &AgentContext,
    config: &OsdConfig,
    force_format: bool,
) -> Result<()> {
    let block = config.scheme.block_partition().ok_or_else(|| {
        Error::Internal(format!(
            "scheme entry for osd {} has no block partition",
            config.id
        ))
    })?;
    let device = block.device.clone();

    ensure_safe_to_format(context, &device, force_format).await?;

    // only the specs that land on the data device; in the distributed layout
    // WAL/DB live on the metadata device and are committed separately
    let specs: Vec<PartitionSpec> = config
        .scheme
        .partitions
        .iter()
        .filter(|s| s.device == device)
        .cloned()
        .collect();

    partition_device(context, &device, &specs, block.disk_uuid).await
}

/// Probe `device` and fail with `DeviceInUse` when it holds data this system
/// does not own, unless `force_format` overrides.
async fn ensure_safe_to_format(
    context: &AgentContext,
    device: &str,
    force_format: bool,
) -> Result<()> {
    let executor = context.executor.as_ref();

    let partitions = get_device_partitions(executor, device).await?;
    if !partitions.is_empty() {
        if rook_owns_partitions(&partitions) {
            info!(
                "device {} has {} partition(s) owned by this system, safe to overwrite",
                device,
                partitions.len()
            );
        } else if force_format {
            warn!(
                "device {} has partitions not created by this system, formatting anyway",
                device
            );
        } else {
            return Err(Error::DeviceInUse {
                device: device.to_string(),
                reason: "existing partitions were not created by this system".to_string(),
            });
        }
    }

    if let Some(fs) = get_device_filesystem(executor, device).await? {
        if force_format {
            warn!(
                "device {} is formatted with {}, formatting anyway",
                device, fs
            );
        } else {
            return Err(Error::DeviceInUse {
                device: device.to_string(),
                reason: format!("already formatted with {}", fs),
            });
        }
    }

    Ok(())
}

/// Run the zap/clear/create sequence for `specs` against `device`.
///
/// The create step is a single invocation carrying every partition in spec
/// order plus the disk GUID, so downstream consumers can address partitions
/// by ordinal and the disk by `disk_uuid` without re-probing.
async fn partition_device(
    context: &AgentContext,
    device: &str,
    specs: &[PartitionSpec],
    disk_uuid: Uuid,
) -> Result<()> {
    let executor = context.executor.as_ref();
    let device_path = format!("/dev/{}", device);

    info!("partitioning {} with {} partition(s)", device, specs.len());

    executor
        .execute(
            &format!("zap {}", device),
            "sgdisk",
            &["--zap-all".to_string(), device_path.clone()],
        )
        .await?;

    executor
        .execute(
            &format!("clear {}", device),
            "sgdisk",
            &[
                "--clear".to_string(),
                "--mbrtogpt".to_string(),
                device_path.clone(),
            ],
        )
        .await?;

    let mut args: Vec<String> = specs.iter().flat_map(|s| s.sgdisk_args()).collect();
    args.push(format!("--disk-guid={}", disk_uuid));
    args.push(device_path);

    executor
        .execute(&format!("partition {}", device), "sgdisk", &args)
        .await?;

    info!("partitioned {}", device);
    Ok(())
}

// =============================================================================
// OSD Provisioning
// =============================================================================

/// Provision the data device for one OSD: format it, persist the scheme entry
/// under the OSD root, and record the device-to-OSD ownership in the
/// desired-state store.
///
/// The data record always targets this entry's BLOCK device; the metadata
/// record is co-published only for the collocated layout, since a distributed
/// entry's WAL/DB land on a shared device committed by
/// [`partition_bluestore_metadata`].
pub async fn partition_bluestore_osd(context: &AgentContext, config: &OsdConfig) -> Result<()> {
    info!(
        "provisioning osd {} on device {:?}",
        config.id,
        config.scheme.data_device()
    );

    format_device(context, config, config.force_format).await?;

    save_osd_scheme(config)?;

    let block = block_partition_details(config)?;
    publish_device_ownership(
        context.store.as_ref(),
        &context.node_id,
        &block.disk_uuid,
        DeviceRole::Data,
        config.id,
    )
    .await?;

    if config.scheme.collocated {
        publish_device_ownership(
            context.store.as_ref(),
            &context.node_id,
            &block.disk_uuid,
            DeviceRole::Metadata,
            config.id,
        )
        .await?;
    }

    info!("provisioned osd {}", config.id);
    Ok(())
}

/// The BLOCK spec of the OSD's scheme entry.
pub fn block_partition_details(config: &OsdConfig) -> Result<&PartitionSpec> {
    config.scheme.block_partition().ok_or_else(|| {
        Error::Internal(format!(
            "scheme entry for osd {} has no block partition",
            config.id
        ))
    })
}

/// Persist the OSD's scheme entry under its root path for the start-up path.
fn save_osd_scheme(config: &OsdConfig) -> Result<()> {
    std::fs::create_dir_all(&config.root_path)?;
    let raw = serde_json::to_string_pretty(&config.scheme)?;
    std::fs::write(config.root_path.join("partition-scheme.json"), raw)?;
    Ok(())
}

// =============================================================================
// Metadata-Device Partitioner
// =============================================================================

/// Commit the accumulated WAL/DB layout to the shared metadata device in a
/// single pass, persist the layout under `config_dir`, and record the set of
/// OSDs sharing the device in the desired-state store.
pub async fn partition_bluestore_metadata(
    context: &AgentContext,
    metadata: &MetadataDeviceInfo,
    config_dir: &Path,
) -> Result<()> {
    if metadata.partitions.is_empty() {
        return Err(Error::Configuration(format!(
            "no OSDs assigned to metadata device {}",
            metadata.device
        )));
    }

    info!(
        "partitioning metadata device {} for osd(s) {:?}",
        metadata.device,
        metadata.osd_ids()
    );

    ensure_safe_to_format(context, &metadata.device, false).await?;

    let specs = metadata.partition_specs();
    partition_device(context, &metadata.device, &specs, metadata.disk_uuid).await?;

    save_metadata_scheme(metadata, config_dir)?;

    // one record per OSD: the metadata key holds the set of all OSDs sharing
    // this device, merged under concurrent publishers
    for osd_id in metadata.osd_ids() {
        publish_device_ownership(
            context.store.as_ref(),
            &context.node_id,
            &metadata.disk_uuid,
            DeviceRole::Metadata,
            osd_id,
        )
        .await?;
    }

    info!("partitioned metadata device {}", metadata.device);
    Ok(())
}

/// Persist the metadata device layout under `config_dir`.
fn save_metadata_scheme(metadata: &MetadataDeviceInfo, config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let raw = serde_json::to_string_pretty(metadata)?;
    std::fs::write(
        config_dir.join(format!("{}-metadata-scheme.json", metadata.device)),
        raw,
    )?;
    Ok(())
}
