//! Scenario tests for the diff engine and report renderer.
//!
//! All tests operate on in-memory records (no I/O).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use daadwatch_core::diff::{
    compute_diff, render, DiffOptions, DuplicatePolicy, ReportOptions,
};
use daadwatch_core::errors::ExErrorKind;
use daadwatch_core::model::ProgrammeRecord;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn recs(values: Vec<Value>) -> Vec<ProgrammeRecord> {
    ProgrammeRecord::from_values(values).unwrap()
}

fn ids(records: &[ProgrammeRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id().as_str()).collect()
}

/// A full catalog entry as the listing API returns it
fn listing_entry(id: u32, course: &str, degree: &str) -> Value {
    json!({
        "id": id,
        "courseName": course,
        "academy": "Universität Stuttgart",
        "city": "Stuttgart",
        "courseType": degree,
        "languages": ["English"],
        "programmeDuration": "4 semesters",
        "date": [
            {"start": "01.10.2026", "end": "30.09.2028", "registrationDeadline": "15.07.2026", "costs": "none"}
        ]
    })
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_scenario_a_new_programme_is_added() {
    let previous = recs(vec![json!({"id": 1, "title": "X"})]);
    let current = recs(vec![json!({"id": 1, "title": "X"}), json!({"id": 2, "title": "Y"})]);

    let changes = compute_diff(&previous, &current, &DiffOptions::default()).unwrap();

    assert_eq!(ids(&changes.added), vec!["2"]);
    assert!(changes.removed.is_empty());
    assert!(changes.updated.is_empty());
    assert_eq!(changes.added[0].get("title"), Some(&json!("Y")));
}

#[test]
fn test_scenario_b_language_reordering_is_not_a_change() {
    let previous = recs(vec![json!({"id": 1, "title": "X", "languages": ["de", "en"]})]);
    let current = recs(vec![json!({"id": 1, "title": "X", "languages": ["en", "de"]})]);

    let changes = compute_diff(&previous, &current, &DiffOptions::default()).unwrap();

    assert!(changes.is_empty());
    assert!(render(&changes, &ReportOptions::default()).segments.is_empty());
}

#[test]
fn test_scenario_d_both_empty_yields_zero_segments() {
    let changes = compute_diff(&[], &[], &DiffOptions::default()).unwrap();
    assert!(changes.is_empty());
    assert!(render(&changes, &ReportOptions::default()).segments.is_empty());
}

#[test]
fn test_offering_date_reordering_is_not_a_change() {
    let previous = recs(vec![json!({"id": 1, "date": [
        {"start": "01.04.2027", "end": "31.03.2029"},
        {"start": "01.10.2026", "end": "30.09.2028"}
    ]})]);
    let current = recs(vec![json!({"id": 1, "date": [
        {"end": "30.09.2028", "start": "01.10.2026"},
        {"start": "01.04.2027", "end": "31.03.2029"}
    ]})]);
    let changes = compute_diff(&previous, &current, &DiffOptions::default()).unwrap();
    assert!(changes.is_empty());
}

#[test]
fn test_deadline_change_is_an_update() {
    let mut before = listing_entry(7, "Data Science", "Master");
    let after = listing_entry(7, "Data Science", "Master");
    before["date"][0]["registrationDeadline"] = json!("01.06.2026");

    let changes =
        compute_diff(&recs(vec![before]), &recs(vec![after]), &DiffOptions::default()).unwrap();

    assert_eq!(ids(&changes.updated), vec!["7"]);
    assert_eq!(
        changes.updated[0].get("date").unwrap()[0]["registrationDeadline"],
        json!("15.07.2026")
    );
}

#[test]
fn test_alias_rename_between_source_versions_is_not_a_change() {
    let previous = recs(vec![json!({"id": 3, "title": "Physics", "university": "TU Berlin"})]);
    let current = recs(vec![json!({"id": 3, "courseName": "Physics", "academy": "TU Berlin"})]);
    let changes = compute_diff(&previous, &current, &DiffOptions::default()).unwrap();
    assert!(changes.is_empty());
}

#[test]
fn test_duplicate_in_previous_snapshot_is_rejected() {
    let previous = recs(vec![json!({"id": 1}), json!({"id": 1, "city": "Bonn"})]);
    let err = compute_diff(&previous, &[], &DiffOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::DuplicateIdentifier);
    assert_eq!(err.code(), "ERR_DUPLICATE_IDENTIFIER");
    assert!(err.message().contains("previous snapshot"));
}

#[test]
fn test_duplicate_first_wins_policy() {
    let current = recs(vec![
        json!({"id": 1, "city": "Bonn"}),
        json!({"id": 1, "city": "Köln"}),
    ]);
    let opts = DiffOptions {
        duplicate_policy: DuplicatePolicy::FirstWins,
        ..DiffOptions::default()
    };
    let changes = compute_diff(&[], &current, &opts).unwrap();
    assert_eq!(changes.added.len(), 1);
    assert_eq!(changes.added[0].get("city"), Some(&json!("Bonn")));
    assert_eq!(changes.duplicates_dropped, 1);
}

#[test]
fn test_full_report_layout() {
    let previous = recs(vec![
        listing_entry(10, "Old Programme", "Master"),
        listing_entry(20, "Stable Programme", "Master"),
    ]);
    let current = recs(vec![
        listing_entry(20, "Stable Programme", "Master"),
        listing_entry(30, "Mechanical Engineering", "Bachelor"),
        listing_entry(9, "Computer Science", "Master"),
    ]);
    let changes = compute_diff(&previous, &current, &DiffOptions::default()).unwrap();
    let report = render(&changes, &ReportOptions::default());

    let expected = "\
DAAD international programmes: catalog changes
Added: 2 | Removed: 1 | Updated: 0

## Added programmes (2)

### Master
- Computer Science (ID 9)
  Institution: Universität Stuttgart
  City: Stuttgart
  Subject: Not specified
  Languages: English
  Duration: 4 semesters
  Offering: 01.10.2026 to 30.09.2028 | Deadline: 15.07.2026 | Cost: none

### Bachelor
- Mechanical Engineering (ID 30)
  Institution: Universität Stuttgart
  City: Stuttgart
  Subject: Not specified
  Languages: English
  Duration: 4 semesters
  Offering: 01.10.2026 to 30.09.2028 | Deadline: 15.07.2026 | Cost: none

## Removed programmes (1)
- Old Programme (ID 10)
  Institution: Universität Stuttgart
  City: Stuttgart
  Subject: Not specified
  Languages: English
  Duration: 4 semesters
  Offering: 01.10.2026 to 30.09.2028 | Deadline: 15.07.2026 | Cost: none
";
    assert_eq!(report.document, expected);
    assert_eq!(report.segments, vec![expected.to_string()]);
}

#[test]
fn test_large_report_is_split_into_bounded_segments() {
    let current: Vec<Value> = (0..200)
        .map(|i| listing_entry(i, &format!("Programme {}", i), "Master"))
        .collect();
    let changes = compute_diff(&[], &recs(current), &DiffOptions::default()).unwrap();
    let report = render(&changes, &ReportOptions::default());

    assert!(report.segments.len() > 1);
    assert!(report.segments.iter().all(|s| s.chars().count() <= 4000));
    assert_eq!(report.segments.concat(), report.document);
}
