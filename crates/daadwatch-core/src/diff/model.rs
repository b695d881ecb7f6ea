//! Diff output types.

use crate::model::{ProgrammeId, ProgrammeRecord};
use serde::{Deserialize, Serialize};

/// What to do when one side of a diff lists the same identifier twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the diff with `DuplicateIdentifier`; the join would be ambiguous.
    #[default]
    Reject,
    /// Keep the first occurrence in source order and drop the rest.
    FirstWins,
}

/// Options for [`compute_diff`](crate::diff::compute_diff)
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Source fields excluded from comparison
    pub ignored_fields: Vec<String>,
}

/// The three change sets of one run, plus the unchanged identifiers
///
/// Every sequence is ordered by [`ProgrammeId`] ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Current records whose id was absent before
    pub added: Vec<ProgrammeRecord>,
    /// Previous records whose id is absent now
    pub removed: Vec<ProgrammeRecord>,
    /// Current ("after") records whose canonical form changed
    pub updated: Vec<ProgrammeRecord>,
    pub unchanged: Vec<ProgrammeId>,
    /// Records dropped under `DuplicatePolicy::FirstWins`, both sides
    pub duplicates_dropped: usize,
}

impl ChangeSet {
    /// True when there is nothing to report
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            added: self.added.len(),
            removed: self.removed.len(),
            updated: self.updated.len(),
            unchanged: self.unchanged.len(),
        }
    }
}

/// Sizes of each change set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub unchanged: usize,
}
