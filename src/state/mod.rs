//! Desired-State Module
//!
//! Publication of device-to-OSD ownership into the cluster-wide desired-state
//! store, plus the in-memory store adapter used in standalone mode and tests.

pub mod memory;
pub mod publisher;

pub use memory::MemoryStore;
pub use publisher::{
    device_role_key, parse_osd_id_set, publish_device_ownership, DeviceRole, DESIRED_STATE_ROOT,
    MAX_CAS_ATTEMPTS,
};
