//! Record normalization.
//!
//! Maps a raw [`ProgrammeRecord`] to its [`CanonicalRecord`]. Pure and
//! deterministic: the output never depends on the order in which the source
//! listed fields, languages, or offering dates.

use crate::model::{CanonicalRecord, CanonicalValue, OfferingDate, ProgrammeRecord, ID_FIELD};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

// Source aliases, first present wins. Listing versions have renamed fields
// over time; every alias of a known field is consumed by that field.
const TITLE: &[&str] = &["courseName", "title", "name"];
const INSTITUTION: &[&str] = &["academy", "university", "institution"];
const CITY: &[&str] = &["city"];
const SUBJECT: &[&str] = &["subject", "field"];
const DEGREE: &[&str] = &["courseType", "degree", "programmeType", "degreeType"];
const LANGUAGES: &[&str] = &["languages", "language"];
const DURATION: &[&str] = &["programmeDuration", "duration"];
const DATES: &[&str] = &["date", "dates", "offerings"];

const START: &[&str] = &["start", "startDate"];
const END: &[&str] = &["end", "endDate"];
const DEADLINE: &[&str] = &["registrationDeadline", "applicationDeadline", "deadline"];
const COST: &[&str] = &["costs", "cost", "fee", "tuitionFees"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Normalizer with a configurable set of fields to disregard entirely
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    ignored_fields: BTreeSet<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields that are source-side noise (ranking scores, cache stamps) and
    /// must never register as a change
    pub fn with_ignored_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn ignored_fields(&self) -> &BTreeSet<String> {
        &self.ignored_fields
    }

    pub fn normalize(&self, record: &ProgrammeRecord) -> CanonicalRecord {
        let fields = record.fields();

        let mut extra = BTreeMap::new();
        for (key, value) in fields {
            if key == ID_FIELD || self.ignored_fields.contains(key) || is_known_key(key) {
                continue;
            }
            if let Some(v) = canonical_value(value) {
                extra.insert(key.clone(), v);
            }
        }

        CanonicalRecord {
            id: record.id().clone(),
            title: scalar(first(fields, TITLE)),
            institution: scalar(first(fields, INSTITUTION)),
            city: scalar(first(fields, CITY)),
            subject: scalar(first(fields, SUBJECT)),
            degree: scalar(first(fields, DEGREE)),
            languages: languages(first(fields, LANGUAGES)),
            duration: scalar(first(fields, DURATION)),
            dates: offering_dates(first(fields, DATES)),
            extra,
        }
    }
}

/// Normalize with default options (no ignored fields)
pub fn normalize(record: &ProgrammeRecord) -> CanonicalRecord {
    Normalizer::default().normalize(record)
}

fn is_known_key(key: &str) -> bool {
    [TITLE, INSTITUTION, CITY, SUBJECT, DEGREE, LANGUAGES, DURATION, DATES]
        .iter()
        .any(|aliases| aliases.contains(&key))
}

/// First alias present with a non-null value
fn first<'a>(fields: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_null())
}

/// Trim and collapse internal whitespace runs to one space
pub(crate) fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical text for a field expected to be scalar
fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => collapse_ws(s),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => {
            let mut parts: Vec<String> = items
                .iter()
                .map(|v| scalar(Some(v)))
                .filter(|s| !s.is_empty())
                .collect();
            parts.sort();
            parts.join(", ")
        }
        Some(other @ Value::Object(_)) => canonical_value(other)
            .map(|v| v.display_text())
            .unwrap_or_default(),
    }
}

fn languages(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(|v| scalar(Some(v))).collect(),
        Some(Value::String(s)) => s.split(',').map(collapse_ws).collect(),
        Some(other) => vec![scalar(Some(other))],
    };
    let set: BTreeSet<String> = raw.into_iter().filter(|s| !s.is_empty()).collect();
    set.into_iter().collect()
}

fn offering_dates(value: Option<&Value>) -> Vec<OfferingDate> {
    let items: Vec<&Value> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(single) => vec![single],
    };
    let mut dates: Vec<OfferingDate> = items.into_iter().map(offering_date).collect();
    // Stable: identical (start, end) keys keep source order.
    dates.sort_by_cached_key(|d| (DateKey::parse(&d.start), DateKey::parse(&d.end)));
    dates
}

fn offering_date(value: &Value) -> OfferingDate {
    match value {
        Value::Object(obj) => OfferingDate {
            start: scalar(first(obj, START)),
            end: scalar(first(obj, END)),
            registration_deadline: scalar(first(obj, DEADLINE)),
            cost: scalar(first(obj, COST)),
        },
        other => OfferingDate {
            start: scalar(Some(other)),
            ..OfferingDate::default()
        },
    }
}

/// Sort key for offering dates: calendar order where parseable, text otherwise
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DateKey {
    Date(NaiveDate),
    Text(String),
}

impl DateKey {
    fn parse(s: &str) -> Self {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .map(DateKey::Date)
            .unwrap_or_else(|| DateKey::Text(s.to_string()))
    }
}

/// Canonical form of an unknown field; `None` when empty
fn canonical_value(value: &Value) -> Option<CanonicalValue> {
    let v = match value {
        Value::Null => return None,
        Value::String(_) | Value::Bool(_) | Value::Number(_) => {
            CanonicalValue::Text(scalar(Some(value)))
        }
        Value::Array(items) => {
            let mut list: Vec<CanonicalValue> = items.iter().filter_map(canonical_value).collect();
            list.sort();
            CanonicalValue::List(list)
        }
        Value::Object(obj) => CanonicalValue::Map(
            obj.iter()
                .filter_map(|(k, v)| canonical_value(v).map(|cv| (k.clone(), cv)))
                .collect(),
        ),
    };
    (!v.is_empty()).then_some(v)
}
