//! OSD Module
//!
//! Node-local OSD identity and the cluster-join bootstrap keyring.

pub mod identity;
pub mod keyring;

pub use identity::{load_osd_info, OsdIdentity};
pub use keyring::{bootstrap_osd_keyring_path, create_osd_bootstrap_keyring};
