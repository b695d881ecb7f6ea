//! Canonical (normalized) record types.
//!
//! All types are plain values with structural equality; two canonical records
//! are equal iff every normalized field is equal, recursively. Collections are
//! `BTreeMap` and sorted `Vec` so equality never depends on source ordering.

use crate::model::{ProgrammeId, ProgrammeRecord, ID_FIELD};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Primary field names used when a canonical record is rendered back to raw form
pub(crate) mod raw_keys {
    pub const TITLE: &str = "courseName";
    pub const INSTITUTION: &str = "academy";
    pub const CITY: &str = "city";
    pub const SUBJECT: &str = "subject";
    pub const DEGREE: &str = "courseType";
    pub const LANGUAGES: &str = "languages";
    pub const DURATION: &str = "programmeDuration";
    pub const DATES: &str = "date";
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const DEADLINE: &str = "registrationDeadline";
    pub const COST: &str = "costs";
}

/// One offering of a programme (an intake)
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct OfferingDate {
    pub start: String,
    pub end: String,
    pub registration_deadline: String,
    pub cost: String,
}

impl OfferingDate {
    fn to_raw(&self) -> Value {
        let mut obj = Map::new();
        put_text(&mut obj, raw_keys::START, &self.start);
        put_text(&mut obj, raw_keys::END, &self.end);
        put_text(&mut obj, raw_keys::DEADLINE, &self.registration_deadline);
        put_text(&mut obj, raw_keys::COST, &self.cost);
        Value::Object(obj)
    }
}

/// Canonical form of a field the normalizer has no specific knowledge of
///
/// Scalars collapse to text; maps drop empty entries; lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Text(String),
    List(Vec<CanonicalValue>),
    Map(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Empty values are indistinguishable from an absent field
    pub fn is_empty(&self) -> bool {
        match self {
            CanonicalValue::Text(s) => s.is_empty(),
            CanonicalValue::List(items) => items.is_empty(),
            CanonicalValue::Map(entries) => entries.is_empty(),
        }
    }

    pub fn to_raw(&self) -> Value {
        match self {
            CanonicalValue::Text(s) => Value::String(s.clone()),
            CanonicalValue::List(items) => Value::Array(items.iter().map(Self::to_raw).collect()),
            CanonicalValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_raw()))
                    .collect(),
            ),
        }
    }

    /// Single-line rendering for reports
    pub fn display_text(&self) -> String {
        match self {
            CanonicalValue::Text(s) => s.clone(),
            CanonicalValue::List(items) => items
                .iter()
                .map(Self::display_text)
                .collect::<Vec<_>>()
                .join(", "),
            CanonicalValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v.display_text()))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Normalized programme record used for change detection and rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    pub id: ProgrammeId,
    pub title: String,
    pub institution: String,
    pub city: String,
    pub subject: String,
    pub degree: String,
    /// Sorted, de-duplicated
    pub languages: Vec<String>,
    pub duration: String,
    /// Sorted by (start, end), stable on ties
    pub dates: Vec<OfferingDate>,
    /// Every other non-ignored, non-empty source field
    pub extra: BTreeMap<String, CanonicalValue>,
}

impl CanonicalRecord {
    /// Look up a field by canonical name (`title`, `degree`, …) or by an
    /// `extra` key
    pub fn field_text(&self, name: &str) -> String {
        match name {
            "id" => self.id.to_string(),
            "title" => self.title.clone(),
            "institution" => self.institution.clone(),
            "city" => self.city.clone(),
            "subject" => self.subject.clone(),
            "degree" => self.degree.clone(),
            "languages" => self.languages.join(", "),
            "duration" => self.duration.clone(),
            other => self
                .extra
                .get(other)
                .map(CanonicalValue::display_text)
                .unwrap_or_default(),
        }
    }

    /// Render the canonical form back as a raw record using primary field names
    ///
    /// Normalizing the result yields this record again.
    pub fn to_raw(&self) -> ProgrammeRecord {
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        put_text(&mut fields, raw_keys::TITLE, &self.title);
        put_text(&mut fields, raw_keys::INSTITUTION, &self.institution);
        put_text(&mut fields, raw_keys::CITY, &self.city);
        put_text(&mut fields, raw_keys::SUBJECT, &self.subject);
        put_text(&mut fields, raw_keys::DEGREE, &self.degree);
        if !self.languages.is_empty() {
            fields.insert(
                raw_keys::LANGUAGES.to_string(),
                Value::Array(self.languages.iter().cloned().map(Value::String).collect()),
            );
        }
        put_text(&mut fields, raw_keys::DURATION, &self.duration);
        if !self.dates.is_empty() {
            fields.insert(
                raw_keys::DATES.to_string(),
                Value::Array(self.dates.iter().map(OfferingDate::to_raw).collect()),
            );
        }
        for (k, v) in &self.extra {
            fields.insert(k.clone(), v.to_raw());
        }
        ProgrammeRecord::from_parts(self.id.clone(), fields)
    }
}

fn put_text(obj: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        obj.insert(key.to_string(), Value::String(value.to_string()));
    }
}
