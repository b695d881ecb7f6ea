//! Change-set computation.
//!
//! The core entry point is [`compute_diff`], which joins the previous and
//! current catalogs on [`ProgrammeId`] and classifies every identifier.

use crate::diff::model::{ChangeSet, DiffOptions, DuplicatePolicy};
use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{ProgrammeId, ProgrammeRecord};
use crate::normalize::Normalizer;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Which side of the diff a record came from, for error messages
#[derive(Debug, Clone, Copy)]
enum Side {
    Previous,
    Current,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Previous => "previous snapshot",
            Side::Current => "current catalog",
        }
    }
}

/// Build the identifier → record index for one side
///
/// Returns the index plus the number of duplicates dropped.
fn index_records<'a>(
    records: &'a [ProgrammeRecord],
    side: Side,
    policy: DuplicatePolicy,
) -> Result<(BTreeMap<&'a ProgrammeId, &'a ProgrammeRecord>, usize)> {
    let mut index = BTreeMap::new();
    let mut dropped = 0;
    for record in records {
        match index.entry(record.id()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => match policy {
                DuplicatePolicy::Reject => {
                    return Err(ExError::new(ExErrorKind::DuplicateIdentifier)
                        .with_op("index_records")
                        .with_record_id(record.id().as_str())
                        .with_message(format!(
                            "identifier appears more than once in the {}",
                            side.label()
                        )));
                }
                DuplicatePolicy::FirstWins => {
                    tracing::warn!(
                        programme_id = %record.id(),
                        side = side.label(),
                        "duplicate identifier dropped, first occurrence kept"
                    );
                    dropped += 1;
                }
            },
        }
    }
    Ok((index, dropped))
}

/// Compute the change sets between two catalogs.
///
/// - `added`: current records whose id is not in `previous`
/// - `removed`: previous records whose id is not in `current`
/// - `updated`: current records whose canonical form differs from the previous one
///
/// All outputs are ordered by identifier ascending.
///
/// # Errors
///
/// - `DuplicateIdentifier` if either side repeats an id and the policy is `Reject`
/// - `DeterminismViolation` if the partition check failed (should never occur)
pub fn compute_diff(
    previous: &[ProgrammeRecord],
    current: &[ProgrammeRecord],
    options: &DiffOptions,
) -> Result<ChangeSet> {
    let (prev_index, prev_dropped) =
        index_records(previous, Side::Previous, options.duplicate_policy)?;
    let (curr_index, curr_dropped) =
        index_records(current, Side::Current, options.duplicate_policy)?;

    let normalizer = Normalizer::new().with_ignored_fields(options.ignored_fields.iter().cloned());

    let mut changes = ChangeSet {
        duplicates_dropped: prev_dropped + curr_dropped,
        ..ChangeSet::default()
    };

    // BTreeMap iteration is already in identifier order.
    for (id, curr) in &curr_index {
        match prev_index.get(id) {
            None => changes.added.push((*curr).clone()),
            Some(prev) => {
                if normalizer.normalize(prev) == normalizer.normalize(curr) {
                    changes.unchanged.push((*id).clone());
                } else {
                    changes.updated.push((*curr).clone());
                }
            }
        }
    }
    changes.removed = prev_index
        .iter()
        .filter(|(id, _)| !curr_index.contains_key(*id))
        .map(|(_, prev)| (*prev).clone())
        .collect();

    // Partition guard: every id seen lands in exactly one bucket.
    let union = prev_index
        .keys()
        .chain(curr_index.keys())
        .collect::<BTreeSet<_>>()
        .len();
    let counts = changes.counts();
    if counts.added + counts.removed + counts.updated + counts.unchanged != union {
        return Err(ExError::new(ExErrorKind::DeterminismViolation)
            .with_op("compute_diff")
            .with_message("change sets do not partition the identifier union"));
    }

    Ok(changes)
}

/// Apply the duplicate policy to a catalog about to be persisted.
///
/// Under `FirstWins` later duplicates are dropped and source order is kept.
/// A snapshot written through this never fails the next run's index check.
///
/// # Errors
///
/// `DuplicateIdentifier` if an id repeats and the policy is `Reject`.
pub fn dedupe_catalog(
    records: Vec<ProgrammeRecord>,
    policy: DuplicatePolicy,
) -> Result<Vec<ProgrammeRecord>> {
    let (_, dropped) = index_records(&records, Side::Current, policy)?;
    if dropped == 0 {
        return Ok(records);
    }
    let mut seen = BTreeSet::new();
    Ok(records
        .into_iter()
        .filter(|r| seen.insert(r.id().clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn recs(values: Vec<Value>) -> Vec<ProgrammeRecord> {
        ProgrammeRecord::from_values(values).unwrap()
    }

    fn ids(records: &[ProgrammeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn test_outputs_sorted_by_id() {
        let prev = recs(vec![json!({"id": 30}), json!({"id": 4})]);
        let curr = recs(vec![json!({"id": 12}), json!({"id": 2}), json!({"id": 100})]);
        let d = compute_diff(&prev, &curr, &DiffOptions::default()).unwrap();
        assert_eq!(ids(&d.added), vec!["2", "12", "100"]);
        assert_eq!(ids(&d.removed), vec!["4", "30"]);
    }

    #[test]
    fn test_updated_carries_after_view() {
        let prev = recs(vec![json!({"id": 1, "city": "Bonn"})]);
        let curr = recs(vec![json!({"id": 1, "city": "Köln"})]);
        let d = compute_diff(&prev, &curr, &DiffOptions::default()).unwrap();
        assert_eq!(d.updated.len(), 1);
        assert_eq!(d.updated[0].get("city"), Some(&json!("Köln")));
    }

    #[test]
    fn test_reject_duplicate_names_side_and_id() {
        let curr = recs(vec![json!({"id": 5}), json!({"id": "5"})]);
        let err = compute_diff(&[], &curr, &DiffOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DuplicateIdentifier);
        assert_eq!(err.record_id(), Some("5"));
        assert!(err.message().contains("current catalog"));
    }

    #[test]
    fn test_first_wins_keeps_first_occurrence() {
        let prev = recs(vec![json!({"id": 5, "city": "A"})]);
        let curr = recs(vec![json!({"id": 5, "city": "A"}), json!({"id": 5, "city": "B"})]);
        let opts = DiffOptions {
            duplicate_policy: DuplicatePolicy::FirstWins,
            ..DiffOptions::default()
        };
        let d = compute_diff(&prev, &curr, &opts).unwrap();
        assert!(d.is_empty());
        assert_eq!(d.duplicates_dropped, 1);
    }

    #[test]
    fn test_ignored_fields_do_not_cause_updates() {
        let prev = recs(vec![json!({"id": 1, "score": 1})]);
        let curr = recs(vec![json!({"id": 1, "score": 2})]);
        let opts = DiffOptions {
            ignored_fields: vec!["score".to_string()],
            ..DiffOptions::default()
        };
        assert!(compute_diff(&prev, &curr, &opts).unwrap().is_empty());
        assert!(!compute_diff(&prev, &curr, &DiffOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_dedupe_catalog_applies_policy() {
        let catalog = recs(vec![
            json!({"id": 9, "city": "Ulm"}),
            json!({"id": 3}),
            json!({"id": 9, "city": "Jena"}),
        ]);

        let err = dedupe_catalog(catalog.clone(), DuplicatePolicy::Reject).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DuplicateIdentifier);
        assert_eq!(err.record_id(), Some("9"));

        let kept = dedupe_catalog(catalog.clone(), DuplicatePolicy::FirstWins).unwrap();
        assert_eq!(kept, vec![catalog[0].clone(), catalog[1].clone()]);
        compute_diff(&kept, &kept, &DiffOptions::default()).unwrap();
    }

    #[test]
    fn test_dedupe_catalog_passes_unique_catalog_through() {
        let catalog = recs(vec![json!({"id": 2}), json!({"id": 1})]);
        assert_eq!(dedupe_catalog(catalog.clone(), DuplicatePolicy::Reject).unwrap(), catalog);
    }
}
