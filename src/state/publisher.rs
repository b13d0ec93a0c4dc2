//! Desired-State Publisher
//!
//! Writes per-device, per-role OSD ownership records into the distributed
//! store, keyed by node and disk identity. The orchestration layer reads
//! these records to converge actual cluster membership.
//!
//! A data device belongs to exactly one OSD at a time, so the data record is
//! a plain overwrite. A metadata device may be shared by several OSDs
//! provisioned incrementally, so the metadata record is a set merged through
//! compare-and-set; a blind write could lose a concurrent publisher's update.

use crate::domain::ports::DesiredStateStore;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Root of the OSD desired-state tree in the distributed store
pub const DESIRED_STATE_ROOT: &str = "/rook/services/ceph/osd/desired";

/// Bounded internal retry for set-valued merges before surfacing a conflict
pub const MAX_CAS_ATTEMPTS: u32 = 5;

// =============================================================================
// Device Roles
// =============================================================================

/// Role a device plays for the OSDs recorded against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    /// Holds an OSD's BLOCK partition; owned by exactly one OSD
    Data,
    /// Holds WAL/DB partitions; may be shared by several OSDs
    Metadata,
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRole::Data => write!(f, "data"),
            DeviceRole::Metadata => write!(f, "metadata"),
        }
    }
}

/// Store key for a device's ownership record on a node.
pub fn device_role_key(node_id: &str, disk_uuid: &Uuid, role: DeviceRole) -> String {
    format!(
        "{}/{}/device/{}/osd-id-{}",
        DESIRED_STATE_ROOT, node_id, disk_uuid, role
    )
}

// =============================================================================
// Publication
// =============================================================================

/// Idempotent upsert of the ownership record for one device and role.
pub async fn publish_device_ownership(
    store: &dyn DesiredStateStore,
    node_id: &str,
    disk_uuid: &Uuid,
    role: DeviceRole,
    osd_id: u32,
) -> Result<()> {
    let key = device_role_key(node_id, disk_uuid, role);
    match role {
        DeviceRole::Data => {
            // last write wins: a data device has exactly one owner
            store.set(&key, &osd_id.to_string()).await?;
        }
        DeviceRole::Metadata => {
            publish_metadata_member(store, &key, osd_id).await?;
        }
    }
    info!("recorded osd {} as {} owner of disk {}", osd_id, role, disk_uuid);
    Ok(())
}

/// Merge `osd_id` into the set-valued metadata record at `key` with
/// read-merge-CAS, retrying on conflict.
async fn publish_metadata_member(
    store: &dyn DesiredStateStore,
    key: &str,
    osd_id: u32,
) -> Result<()> {
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let current = store.get(key).await?;
        let merged = merge_osd_id(current.as_deref(), osd_id);
        if current.as_deref() == Some(merged.as_str()) {
            // already a member
            return Ok(());
        }
        if store
            .compare_and_set(key, current.as_deref(), &merged)
            .await?
        {
            return Ok(());
        }
        debug!(
            "conflict writing {} (attempt {}/{}), re-reading",
            key, attempt, MAX_CAS_ATTEMPTS
        );
    }
    Err(Error::StoreWriteConflict {
        key: key.to_string(),
        attempts: MAX_CAS_ATTEMPTS,
    })
}

// =============================================================================
// Set Encoding
// =============================================================================

/// Parse a comma-joined ID set from its store encoding.
///
/// Tokens are kept as strings so that values written by other components are
/// preserved through a merge rather than dropped.
pub fn parse_osd_id_set(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn merge_osd_id(existing: Option<&str>, osd_id: u32) -> String {
    let mut ids = existing.map(parse_osd_id_set).unwrap_or_default();
    ids.insert(osd_id.to_string());
    ids.into_iter().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::memory::MemoryStore;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn disk_uuid() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_device_role_key_layout() {
        let uuid = Uuid::nil();
        assert_eq!(
            device_role_key("node123", &uuid, DeviceRole::Data),
            format!(
                "/rook/services/ceph/osd/desired/node123/device/{}/osd-id-data",
                uuid
            )
        );
        assert!(device_role_key("node123", &uuid, DeviceRole::Metadata).ends_with("osd-id-metadata"));
    }

    #[tokio::test]
    async fn test_data_role_overwrites() {
        let store = MemoryStore::new();
        let uuid = disk_uuid();

        publish_device_ownership(&store, "node123", &uuid, DeviceRole::Data, 1)
            .await
            .unwrap();
        // the device was reassigned to another OSD
        publish_device_ownership(&store, "node123", &uuid, DeviceRole::Data, 4)
            .await
            .unwrap();

        let key = device_role_key("node123", &uuid, DeviceRole::Data);
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_metadata_role_merges_regardless_of_order() {
        let uuid = disk_uuid();
        for ids in [[1u32, 2], [2, 1]] {
            let store = MemoryStore::new();
            for id in ids {
                publish_device_ownership(&store, "node123", &uuid, DeviceRole::Metadata, id)
                    .await
                    .unwrap();
            }
            let key = device_role_key("node123", &uuid, DeviceRole::Metadata);
            let raw = store.get(&key).await.unwrap().unwrap();
            assert_eq!(parse_osd_id_set(&raw), parse_osd_id_set("1,2"));
        }
    }

    #[tokio::test]
    async fn test_metadata_role_republish_is_idempotent() {
        let store = MemoryStore::new();
        let uuid = disk_uuid();
        for _ in 0..2 {
            publish_device_ownership(&store, "node123", &uuid, DeviceRole::Metadata, 2)
                .await
                .unwrap();
        }
        let key = device_role_key("node123", &uuid, DeviceRole::Metadata);
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("2"));
    }

    /// Store whose value moves under the publisher for a fixed number of CAS
    /// attempts, as if concurrent publishers kept winning the race.
    struct ContendedStore {
        inner: MemoryStore,
        failures: AtomicU32,
    }

    #[async_trait]
    impl crate::domain::ports::DesiredStateStore for ContendedStore {
        async fn get(&self, key: &str) -> crate::error::Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> crate::error::Result<()> {
            self.inner.set(key, value).await
        }

        async fn compare_and_set(
            &self,
            key: &str,
            expected: Option<&str>,
            value: &str,
        ) -> crate::error::Result<bool> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > 0).then(|| n - 1)
            }).is_ok()
            {
                // a concurrent writer replaced the value since our read
                self.inner.set(key, "99").await?;
                return Ok(false);
            }
            self.inner.compare_and_set(key, expected, value).await
        }
    }

    #[tokio::test]
    async fn test_metadata_conflict_is_retried_then_merged() {
        let store = ContendedStore {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(2),
        };
        let uuid = disk_uuid();

        publish_device_ownership(&store, "node123", &uuid, DeviceRole::Metadata, 1)
            .await
            .unwrap();

        let key = device_role_key("node123", &uuid, DeviceRole::Metadata);
        let raw = store.inner.get(&key).await.unwrap().unwrap();
        let ids = parse_osd_id_set(&raw);
        assert!(ids.contains("1"));
        assert!(ids.contains("99"));
    }

    #[tokio::test]
    async fn test_metadata_conflict_exhausts_retries() {
        let store = ContendedStore {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(u32::MAX),
        };
        let uuid = disk_uuid();

        let err = publish_device_ownership(&store, "node123", &uuid, DeviceRole::Metadata, 1)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            Error::StoreWriteConflict { attempts, .. } if attempts == MAX_CAS_ATTEMPTS
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_osd_id_set() {
        assert!(parse_osd_id_set("").is_empty());
        let ids = parse_osd_id_set("2,1, 3");
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), ["1", "2", "3"]);
    }
}
