//! Ownership & Safety Detection
//!
//! Partition labels are the sole signal of prior ownership: a partition this
//! system created carries a `ROOK-OSD<id>-<ROLE>` label. Before any
//! destructive operation the formatter asks whether every existing partition
//! on a device was created here (possibly for a different, since-removed OSD).
//! Any label that fails the strict parse is treated as foreign data and must
//! never be silently overwritten.

use crate::error::{Error, Result};
use crate::provision::probe::DiscoveredPartition;
use crate::provision::scheme::PartitionRole;

/// Label prefix for partitions created by this system.
///
/// The format is load-bearing: the embedded OSD ID is parsed back out for
/// ownership detection, so any future label variant must remain a strict,
/// parseable extension of `ROOK-OSD<digits>-<ROLE>`.
pub const OWNERSHIP_LABEL_PREFIX: &str = "ROOK-OSD";

/// Generate the canonical label for a partition owned by `osd_id`.
pub fn partition_label(osd_id: u32, role: PartitionRole) -> String {
    format!("{}{}-{}", OWNERSHIP_LABEL_PREFIX, osd_id, role)
}

// =============================================================================
// Label Parsing
// =============================================================================

/// A partition label successfully parsed as one of ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedLabel {
    pub osd_id: u32,
    pub role: PartitionRole,
}

impl OwnedLabel {
    /// Strictly parse `label` as `ROOK-OSD<digits>-<WAL|DB|BLOCK>`.
    ///
    /// Anything else, including a recognizable prefix with a mangled suffix,
    /// is `Error::MalformedOwnershipLabel`: an unrecognized label must never
    /// grant ownership.
    pub fn parse(label: &str) -> Result<Self> {
        let malformed = || Error::MalformedOwnershipLabel {
            label: label.to_string(),
        };

        let rest = label
            .strip_prefix(OWNERSHIP_LABEL_PREFIX)
            .ok_or_else(malformed)?;
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(malformed)?;
        if digits_end == 0 {
            return Err(malformed());
        }
        let osd_id: u32 = rest[..digits_end].parse().map_err(|_| malformed())?;

        let suffix = rest[digits_end..].strip_prefix('-').ok_or_else(malformed)?;
        let role = PartitionRole::parse(suffix).ok_or_else(malformed)?;

        Ok(OwnedLabel { osd_id, role })
    }
}

// =============================================================================
// Ownership Check
// =============================================================================

/// True iff every partition in `partitions` carries a label this system
/// created.
///
/// An empty list is `false`: there is nothing to own, and callers decide
/// "safe to format" through a separate empty-check rather than through
/// ownership.
pub fn rook_owns_partitions(partitions: &[DiscoveredPartition]) -> bool {
    if partitions.is_empty() {
        return false;
    }
    partitions
        .iter()
        .all(|p| OwnedLabel::parse(&p.label).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn part(label: &str) -> DiscoveredPartition {
        DiscoveredPartition {
            name: "sda1".into(),
            size_mb: 30,
            partition_type: "part".into(),
            parent: "sda".into(),
            label: label.into(),
        }
    }

    #[test]
    fn test_parse_owned_labels() {
        let parsed = OwnedLabel::parse("ROOK-OSD0-WAL").unwrap();
        assert_eq!(parsed.osd_id, 0);
        assert_eq!(parsed.role, PartitionRole::Wal);

        let parsed = OwnedLabel::parse("ROOK-OSD123-BLOCK").unwrap();
        assert_eq!(parsed.osd_id, 123);
        assert_eq!(parsed.role, PartitionRole::Block);

        assert_eq!(partition_label(23, PartitionRole::Db), "ROOK-OSD23-DB");
    }

    #[test]
    fn test_parse_rejects_foreign_labels() {
        for label in [
            "",
            "my-data",
            "ROOK-OSD-WAL",
            "ROOK-OSD1",
            "ROOK-OSD1-",
            "ROOK-OSD1-JOURNAL",
            "ROOK-OSD1-WALx",
            "rook-osd1-wal",
            "OSD1-WAL",
        ] {
            assert_matches!(
                OwnedLabel::parse(label),
                Err(Error::MalformedOwnershipLabel { .. }),
                "label {:?} should not parse",
                label
            );
        }
    }

    #[test]
    fn test_owns_all_labeled_partitions() {
        let partitions = vec![
            part("ROOK-OSD0-WAL"),
            part("ROOK-OSD0-DB"),
            part("ROOK-OSD0-BLOCK"),
        ];
        assert!(rook_owns_partitions(&partitions));

        // partitions from different OSDs are still ours
        let mixed = vec![part("ROOK-OSD1-WAL"), part("ROOK-OSD4-DB")];
        assert!(rook_owns_partitions(&mixed));
    }

    #[test]
    fn test_does_not_own_empty_or_foreign() {
        assert!(!rook_owns_partitions(&[]));

        let one_foreign = vec![
            part("ROOK-OSD0-WAL"),
            part("backup-volume"),
            part("ROOK-OSD0-BLOCK"),
        ];
        assert!(!rook_owns_partitions(&one_foreign));
    }
}
