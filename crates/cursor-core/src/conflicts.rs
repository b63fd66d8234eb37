//! Conflict resolution for concurrent per-cursor operations.
//!
//! When several cursors propose edits in the same command pass their ranges may
//! overlap. The resolver detects overlaps and removes every operation belonging to a
//! deterministic "losing" cursor, so a cursor either applies its whole edit or none of
//! it. The tie-break is fixed: the higher owner id loses (later-created cursors defer
//! to earlier ones). If the first cursor ever loses, the configuration is considered
//! pathological and the whole command is aborted.

use crate::edits::EditOperation;
use std::collections::BTreeSet;
use tracing::warn;

/// The outcome of conflict resolution.
#[derive(Debug)]
pub struct ConflictResolution {
    /// The surviving operations.
    pub operations: Vec<EditOperation>,
    /// Owners whose operations were purged. Their cursors do not survive the command.
    pub losing_owners: BTreeSet<usize>,
}

/// Filter `operations` down to a conflict-free set.
///
/// Operations are sorted by range end, descending; adjacent pairs overlap exactly when
/// the earlier-processed operation starts before the later one ends. Each conflict
/// purges **all** operations of the higher owner id and rewinds the scan by one.
/// Returns `None` when owner `0` loses a conflict: the batch is aborted and nothing
/// should be applied.
pub fn resolve(mut operations: Vec<EditOperation>) -> Option<ConflictResolution> {
    operations.sort_by(|a, b| {
        b.range
            .end
            .cmp(&a.range.end)
            .then_with(|| b.range.start.cmp(&a.range.start))
            .then_with(|| a.owner.cmp(&b.owner))
            .then_with(|| a.sequence.cmp(&b.sequence))
    });

    let mut losing_owners = BTreeSet::new();
    let mut i = 1;
    while i < operations.len() {
        let previous = &operations[i - 1];
        let current = &operations[i];
        if previous.range.start < current.range.end {
            let loser = previous.owner.max(current.owner);
            if loser == 0 {
                warn!(
                    "operations of the first cursor conflict with another cursor; \
                     aborting the whole command"
                );
                return None;
            }
            losing_owners.insert(loser);
            operations.retain(|op| op.owner != loser);
            i = i.saturating_sub(1).max(1);
            continue;
        }
        i += 1;
    }

    Some(ConflictResolution {
        operations,
        losing_owners,
    })
}
