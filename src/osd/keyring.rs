//! Bootstrap Keyring Writer
//!
//! Requests the bootstrap-osd key from the cluster monitors and writes the
//! INI-style keyring file consumed when new OSDs join the cluster.

use crate::domain::ports::ClusterConnection;
use crate::error::{Error, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const BOOTSTRAP_OSD_ENTITY: &str = "client.bootstrap-osd";
const BOOTSTRAP_OSD_MON_CAPS: &str = "allow profile bootstrap-osd";

/// Keyring path for `cluster_name` under `config_dir`.
pub fn bootstrap_osd_keyring_path(config_dir: &Path, cluster_name: &str) -> PathBuf {
    config_dir
        .join("bootstrap-osd")
        .join(format!("{}.keyring", cluster_name))
}

/// Request the bootstrap key from the cluster and write the keyring file.
pub async fn create_osd_bootstrap_keyring(
    connection: &dyn ClusterConnection,
    config_dir: &Path,
    cluster_name: &str,
) -> Result<()> {
    let command = json!({
        "prefix": "auth get-or-create-key",
        "entity": BOOTSTRAP_OSD_ENTITY,
        "caps": ["mon", BOOTSTRAP_OSD_MON_CAPS],
        "format": "json",
    });
    let response = connection.mon_command(command).await?;
    let key = response
        .get("key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::ClusterAuth(format!("auth response missing key: {}", response)))?;

    let path = bootstrap_osd_keyring_path(config_dir, cluster_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = format!(
        "[{}]\n\tkey = {}\n\tcaps mon = \"{}\"\n",
        BOOTSTRAP_OSD_ENTITY, key, BOOTSTRAP_OSD_MON_CAPS
    );
    fs::write(&path, contents)?;

    info!("wrote bootstrap-osd keyring to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClusterConnection;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn test_keyring_contents() {
        let dir = tempfile::tempdir().unwrap();
        let connection = MockClusterConnection::new(json!({"key": "mysecurekey"}));

        create_osd_bootstrap_keyring(&connection, dir.path(), "mycluster")
            .await
            .unwrap();

        let path = bootstrap_osd_keyring_path(dir.path(), "mycluster");
        assert!(path.ends_with("bootstrap-osd/mycluster.keyring"));

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[client.bootstrap-osd]"));
        assert!(contents.contains("key = mysecurekey"));
        assert!(contents.contains("caps mon = \"allow profile bootstrap-osd\""));

        let commands = connection.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["prefix"], "auth get-or-create-key");
        assert_eq!(commands[0]["entity"], "client.bootstrap-osd");
    }

    #[tokio::test]
    async fn test_missing_key_in_auth_response() {
        let dir = tempfile::tempdir().unwrap();
        let connection = MockClusterConnection::new(json!({"status": "denied"}));

        let err = create_osd_bootstrap_keyring(&connection, dir.path(), "mycluster")
            .await
            .unwrap_err();
        assert_matches!(err, Error::ClusterAuth(_));
        assert!(!bootstrap_osd_keyring_path(dir.path(), "mycluster").exists());
    }
}
