//! In-Memory Desired-State Store
//!
//! A process-local store adapter with full compare-and-set semantics. Used in
//! standalone mode and as the backing store in tests; clustered deployments
//! inject their own adapter over the distributed store.

use crate::domain::ports::DesiredStateStore;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Path-keyed in-memory key/value store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries under `prefix`, in key order.
    pub fn entries_under(&self, prefix: &str) -> Vec<(String, String)> {
        self.entries
            .read()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl DesiredStateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        let mut entries = self.entries.write();
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}
