//! Human-readable change report renderer.
//!
//! Turns a [`ChangeSet`] into one logical text document and slices it into
//! transport-sized segments. Pure formatting: no I/O.

use crate::diff::model::ChangeSet;
use crate::model::{CanonicalRecord, ProgrammeRecord};
use crate::normalize::Normalizer;
use std::collections::BTreeMap;

/// Default per-segment character budget (Telegram caps messages at 4096)
pub const DEFAULT_MAX_SEGMENT_CHARS: usize = 4000;

/// Rendering options
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// First line of every report
    pub title: String,
    pub max_segment_chars: usize,
    /// Canonical field used to sub-group the Added section; `None` for a flat list
    pub group_by: Option<String>,
    /// Substituted for empty or absent field values
    pub placeholder: String,
    pub include_updated: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "DAAD international programmes: catalog changes".to_string(),
            max_segment_chars: DEFAULT_MAX_SEGMENT_CHARS,
            group_by: Some("degree".to_string()),
            placeholder: "Not specified".to_string(),
            include_updated: true,
        }
    }
}

/// A rendered report: the full document and its segments
///
/// `segments.concat() == document` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub document: String,
    pub segments: Vec<String>,
}

impl Report {
    /// A report with zero segments means "nothing to send"
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn from_document(document: String, max_chars: usize) -> Self {
        let segments = segment(&document, max_chars);
        Self { document, segments }
    }
}

/// Group items by key, preserving input order
///
/// Groups appear in the order their key is first seen; members keep their
/// input order. Feeding id-sorted input therefore gives a fully
/// deterministic grouping.
pub fn group_stable<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<(K, Vec<T>)>
where
    K: Ord + Clone,
    F: Fn(&T) -> K,
{
    let mut position: BTreeMap<K, usize> = BTreeMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match position.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                position.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

/// Slice a document into contiguous chunks of at most `max_chars` characters
///
/// Boundaries may fall mid-line; they never fall inside a UTF-8 sequence.
/// An empty document yields no segments. A zero budget is treated as one.
pub fn segment(document: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut segments = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in document.char_indices() {
        if count == max_chars {
            segments.push(document[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < document.len() {
        segments.push(document[start..].to_string());
    }
    segments
}

/// Render the change report
///
/// Produces zero segments when no section would list anything, which
/// includes an updates-only change set with `include_updated` off.
pub fn render(changes: &ChangeSet, options: &ReportOptions) -> Report {
    let listed_updates = options.include_updated && !changes.updated.is_empty();
    if changes.added.is_empty() && changes.removed.is_empty() && !listed_updates {
        return Report::default();
    }

    let normalizer = Normalizer::new();
    let canon = |records: &[ProgrammeRecord]| -> Vec<CanonicalRecord> {
        records.iter().map(|r| normalizer.normalize(r)).collect()
    };
    let added = canon(&changes.added);
    let removed = canon(&changes.removed);
    let updated = canon(&changes.updated);

    let mut out = String::new();

    // Header
    out.push_str(&options.title);
    out.push('\n');
    out.push_str(&format!(
        "Added: {} | Removed: {} | Updated: {}\n",
        added.len(),
        removed.len(),
        updated.len()
    ));

    if !added.is_empty() {
        out.push_str(&format!("\n## Added programmes ({})\n", added.len()));
        match &options.group_by {
            Some(field) => {
                let groups = group_stable(added.iter(), |r| r.field_text(field));
                for (key, members) in groups {
                    out.push_str(&format!("\n### {}\n", or_placeholder(&key, options)));
                    for record in members {
                        push_item(&mut out, record, options);
                    }
                }
            }
            None => {
                for record in &added {
                    push_item(&mut out, record, options);
                }
            }
        }
    }

    if !removed.is_empty() {
        out.push_str(&format!("\n## Removed programmes ({})\n", removed.len()));
        for record in &removed {
            push_item(&mut out, record, options);
        }
    }

    if options.include_updated && !updated.is_empty() {
        out.push_str(&format!("\n## Updated programmes ({})\n", updated.len()));
        for record in &updated {
            push_item(&mut out, record, options);
        }
    }

    Report::from_document(out, options.max_segment_chars)
}

/// Render the one-off notice sent when no prior snapshot existed
pub fn render_baseline(programmes: usize, options: &ReportOptions) -> Report {
    let document = format!(
        "{}\nTracking started: {} programmes recorded as the initial snapshot.\n\
         Future runs will report additions, removals and updates.\n",
        options.title, programmes
    );
    Report::from_document(document, options.max_segment_chars)
}

fn or_placeholder<'a>(value: &'a str, options: &'a ReportOptions) -> &'a str {
    if value.is_empty() {
        &options.placeholder
    } else {
        value
    }
}

fn push_item(out: &mut String, r: &CanonicalRecord, options: &ReportOptions) {
    let p = |v: &str| or_placeholder(v, options).to_string();
    out.push_str(&format!("- {} (ID {})\n", p(&r.title), r.id));
    out.push_str(&format!("  Institution: {}\n", p(&r.institution)));
    out.push_str(&format!("  City: {}\n", p(&r.city)));
    out.push_str(&format!("  Subject: {}\n", p(&r.subject)));
    out.push_str(&format!("  Languages: {}\n", p(&r.languages.join(", "))));
    out.push_str(&format!("  Duration: {}\n", p(&r.duration)));
    if r.dates.is_empty() {
        out.push_str(&format!("  Offering: {}\n", options.placeholder));
    }
    for d in &r.dates {
        out.push_str(&format!(
            "  Offering: {} to {} | Deadline: {} | Cost: {}\n",
            p(&d.start),
            p(&d.end),
            p(&d.registration_deadline),
            p(&d.cost)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::engine::compute_diff;
    use crate::diff::model::DiffOptions;
    use serde_json::{json, Value};

    fn recs(values: Vec<Value>) -> Vec<ProgrammeRecord> {
        ProgrammeRecord::from_values(values).unwrap()
    }

    #[test]
    fn test_empty_changes_render_nothing() {
        let r = render(&ChangeSet::default(), &ReportOptions::default());
        assert!(r.is_empty());
        assert!(r.document.is_empty());
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prev = recs(vec![json!({"id": 1}), json!({"id": 2, "city": "Bonn"})]);
        let curr = recs(vec![json!({"id": 2, "city": "Köln"}), json!({"id": 3})]);
        let changes = compute_diff(&prev, &curr, &DiffOptions::default()).unwrap();
        let doc = render(&changes, &ReportOptions::default()).document;
        let a = doc.find("## Added").unwrap();
        let r = doc.find("## Removed").unwrap();
        let u = doc.find("## Updated").unwrap();
        assert!(a < r && r < u);
        assert!(doc.contains("Added: 1 | Removed: 1 | Updated: 1"));
    }

    #[test]
    fn test_placeholder_replaces_blank_fields() {
        let curr = recs(vec![json!({"id": 7, "courseName": "Physics"})]);
        let changes = compute_diff(&[], &curr, &DiffOptions::default()).unwrap();
        let doc = render(&changes, &ReportOptions::default()).document;
        assert!(doc.contains("- Physics (ID 7)"));
        assert!(doc.contains("  City: Not specified"));
        assert!(doc.contains("  Offering: Not specified"));
        assert!(!doc.contains(": \n"));
    }

    #[test]
    fn test_added_grouped_by_degree_in_first_seen_order() {
        let curr = recs(vec![
            json!({"id": 1, "courseType": "Master"}),
            json!({"id": 2, "courseType": "Bachelor"}),
            json!({"id": 3, "courseType": "Master"}),
            json!({"id": 4}),
        ]);
        let changes = compute_diff(&[], &curr, &DiffOptions::default()).unwrap();
        let doc = render(&changes, &ReportOptions::default()).document;
        let master = doc.find("### Master").unwrap();
        let bachelor = doc.find("### Bachelor").unwrap();
        let unspecified = doc.find("### Not specified").unwrap();
        assert!(master < bachelor && bachelor < unspecified);
        assert!(doc.find("(ID 3)").unwrap() < bachelor);
    }

    #[test]
    fn test_flat_list_when_grouping_disabled() {
        let curr = recs(vec![json!({"id": 1, "courseType": "Master"})]);
        let changes = compute_diff(&[], &curr, &DiffOptions::default()).unwrap();
        let opts = ReportOptions {
            group_by: None,
            ..ReportOptions::default()
        };
        assert!(!render(&changes, &opts).document.contains("###"));
    }

    #[test]
    fn test_updated_section_can_be_suppressed() {
        let prev = recs(vec![json!({"id": 1, "city": "A"})]);
        let curr = recs(vec![json!({"id": 1, "city": "B"})]);
        let changes = compute_diff(&prev, &curr, &DiffOptions::default()).unwrap();
        let opts = ReportOptions {
            include_updated: false,
            ..ReportOptions::default()
        };
        let report = render(&changes, &opts);
        assert!(report.is_empty(), "nothing listed, nothing to send");
        assert!(report.document.is_empty());
    }

    #[test]
    fn test_suppressed_updates_still_counted_next_to_additions() {
        let prev = recs(vec![json!({"id": 1, "city": "A"})]);
        let curr = recs(vec![json!({"id": 1, "city": "B"}), json!({"id": 2})]);
        let changes = compute_diff(&prev, &curr, &DiffOptions::default()).unwrap();
        let opts = ReportOptions {
            include_updated: false,
            ..ReportOptions::default()
        };
        let doc = render(&changes, &opts).document;
        assert!(doc.contains("Added: 1 | Removed: 0 | Updated: 1"));
        assert!(doc.contains("## Added"));
        assert!(!doc.contains("## Updated"));
    }

    #[test]
    fn test_segment_respects_char_budget_on_multibyte_text() {
        let doc = "äöü€".repeat(5);
        let segs = segment(&doc, 3);
        assert!(segs.iter().all(|s| s.chars().count() <= 3));
        assert_eq!(segs.concat(), doc);
        assert_eq!(segs.len(), 7);
    }

    #[test]
    fn test_segment_exact_multiple_has_no_empty_tail() {
        let segs = segment("abcdef", 3);
        assert_eq!(segs, vec!["abc", "def"]);
    }

    #[test]
    fn test_segment_empty_document() {
        assert!(segment("", 10).is_empty());
    }

    #[test]
    fn test_group_stable_keeps_member_order() {
        let groups = group_stable(vec![(1, 'a'), (2, 'b'), (3, 'a')], |(_, k)| *k);
        assert_eq!(groups, vec![('a', vec![(1, 'a'), (3, 'a')]), ('b', vec![(2, 'b')])]);
    }

    #[test]
    fn test_baseline_is_single_segment() {
        let r = render_baseline(1234, &ReportOptions::default());
        assert_eq!(r.segments.len(), 1);
        assert!(r.document.contains("1234 programmes"));
    }
}
