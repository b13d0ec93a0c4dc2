//! Device Probing
//!
//! Read-only queries against a device through the command executor: existing
//! partitions via `lsblk` and filesystem presence via `df`. The formatter
//! gates every destructive operation on these probes.

use crate::domain::ports::CommandExecutor;
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// A partition read back from the device inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPartition {
    /// Kernel name (e.g. `sda1`)
    pub name: String,
    pub size_mb: u64,
    /// lsblk TYPE field (`part`)
    pub partition_type: String,
    /// Parent disk name (e.g. `sda`)
    pub parent: String,
    /// GPT partition label; the sole ownership signal
    pub label: String,
}

// =============================================================================
// Partition Probing
// =============================================================================

/// List the existing partitions of `device` (short name, e.g. `sda`).
pub async fn get_device_partitions(
    executor: &dyn CommandExecutor,
    device: &str,
) -> Result<Vec<DiscoveredPartition>> {
    let output = executor
        .execute_with_output(
            &format!("lsblk {}", device),
            "lsblk",
            &[
                format!("/dev/{}", device),
                "--bytes".to_string(),
                "--pairs".to_string(),
                "--output".to_string(),
                "NAME,SIZE,TYPE,PKNAME,PARTLABEL".to_string(),
            ],
        )
        .await?;

    let mut partitions = Vec::new();
    for line in output.lines() {
        let fields = parse_key_value_pairs(line);
        if fields.get("TYPE").map(String::as_str) != Some("part") {
            continue;
        }
        let size_bytes: u64 = fields
            .get("SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        partitions.push(DiscoveredPartition {
            name: fields.get("NAME").cloned().unwrap_or_default(),
            size_mb: size_bytes / (1024 * 1024),
            partition_type: "part".to_string(),
            parent: fields.get("PKNAME").cloned().unwrap_or_default(),
            label: fields.get("PARTLABEL").cloned().unwrap_or_default(),
        });
    }

    debug!(
        "found {} partition(s) on {}: {:?}",
        partitions.len(),
        device,
        partitions.iter().map(|p| &p.name).collect::<Vec<_>>()
    );
    Ok(partitions)
}

// =============================================================================
// Filesystem Probing
// =============================================================================

/// Return the filesystem type mounted from `device` or any of its partitions,
/// or `None` when the device carries no mounted filesystem.
pub async fn get_device_filesystem(
    executor: &dyn CommandExecutor,
    device: &str,
) -> Result<Option<String>> {
    let output = executor
        .execute_with_output(
            &format!("get filesystems on {}", device),
            "df",
            &["--all".to_string(), "--output=source,fstype".to_string()],
        )
        .await?;

    let prefix = format!("/dev/{}", device);
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(source), Some(fstype)) = (fields.next(), fields.next()) else {
            continue;
        };
        if let Some(rest) = source.strip_prefix(&prefix) {
            // match the device itself or its numbered partitions, not a
            // longer device name sharing the prefix (sda vs sdaa)
            if rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()) {
                return Ok(Some(fstype.to_string()));
            }
        }
    }
    Ok(None)
}

/// Parse one line of `lsblk --pairs` output (`KEY="VALUE" KEY="VALUE" ...`).
fn parse_key_value_pairs(line: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut rest = line.trim();
    while let Some(eq) = rest.find("=\"") {
        let key = rest[..eq].trim().to_string();
        let value_start = eq + 2;
        let Some(value_len) = rest[value_start..].find('"') else {
            break;
        };
        let value = rest[value_start..value_start + value_len].to_string();
        fields.insert(key, value);
        rest = &rest[value_start + value_len + 1..];
    }
    fields
}
