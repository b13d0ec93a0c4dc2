//! OSD Identity Loader
//!
//! An OSD that has been bootstrapped on this node leaves its identity in two
//! files under its root directory: `whoami` (the numeric OSD ID) and `fsid`
//! (the OSD UUID). Absence of either is the expected, non-fatal signal that
//! bootstrap has not happened yet.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

const WHOAMI_FILE: &str = "whoami";
const FSID_FILE: &str = "fsid";

/// Identity of a bootstrapped OSD, immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsdIdentity {
    pub id: u32,
    pub uuid: Uuid,
}

/// Load the OSD identity from `root_path`.
///
/// A missing or malformed file maps to [`Error::IdentityNotFound`], which
/// callers route into the bootstrap flow rather than treating as fatal.
pub fn load_osd_info(root_path: &Path) -> Result<OsdIdentity> {
    let id = read_identity_file(root_path, WHOAMI_FILE, |raw| raw.parse::<u32>().ok())?;
    let uuid = read_identity_file(root_path, FSID_FILE, |raw| Uuid::parse_str(raw).ok())?;

    debug!("loaded osd identity {} ({}) from {:?}", id, uuid, root_path);
    Ok(OsdIdentity { id, uuid })
}

fn read_identity_file<T>(
    root_path: &Path,
    file: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    let path = root_path.join(file);
    let raw = fs::read_to_string(&path).map_err(|e| Error::IdentityNotFound {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    parse(raw.trim()).ok_or_else(|| Error::IdentityNotFound {
        path,
        reason: format!("malformed contents {:?}", raw.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_load_fails_on_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_osd_info(dir.path()).unwrap_err();
        assert_matches!(err, Error::IdentityNotFound { .. });
        assert!(err.is_not_bootstrapped());
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let uuid = Uuid::new_v4();
        fs::write(dir.path().join("whoami"), "23").unwrap();
        fs::write(dir.path().join("fsid"), uuid.to_string()).unwrap();

        let identity = load_osd_info(dir.path()).unwrap();
        assert_eq!(identity.id, 23);
        assert_eq!(identity.uuid, uuid);
    }

    #[test]
    fn test_load_tolerates_trailing_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let uuid = Uuid::new_v4();
        fs::write(dir.path().join("whoami"), "7\n").unwrap();
        fs::write(dir.path().join("fsid"), format!("{}\n", uuid)).unwrap();

        let identity = load_osd_info(dir.path()).unwrap();
        assert_eq!(identity.id, 7);
        assert_eq!(identity.uuid, uuid);
    }

    #[test]
    fn test_load_fails_on_malformed_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("whoami"), "not-a-number").unwrap();
        fs::write(dir.path().join("fsid"), Uuid::new_v4().to_string()).unwrap();
        assert_matches!(
            load_osd_info(dir.path()),
            Err(Error::IdentityNotFound { .. })
        );

        fs::write(dir.path().join("whoami"), "23").unwrap();
        fs::write(dir.path().join("fsid"), "not-a-uuid").unwrap();
        assert_matches!(
            load_osd_info(dir.path()),
            Err(Error::IdentityNotFound { .. })
        );
    }
}
