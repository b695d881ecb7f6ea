use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::ProgrammeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the mandatory identifier field in raw records
pub const ID_FIELD: &str = "id";

/// A raw programme record: an identifier plus whatever descriptive fields the
/// listing supplied
///
/// The full field mapping (including `id`) is kept verbatim so that a
/// snapshot written back to disk is exactly what was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ProgrammeRecord {
    id: ProgrammeId,
    fields: Map<String, Value>,
}

impl ProgrammeRecord {
    /// Build a record from a field mapping, validating the identifier
    ///
    /// # Errors
    ///
    /// - `MissingIdentifier` if `id` is absent, null, or blank
    /// - `InvalidRecord` if `id` is neither a string nor an integer
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        let id = match fields.get(ID_FIELD) {
            None | Some(Value::Null) => {
                return Err(ExError::new(ExErrorKind::MissingIdentifier)
                    .with_op("parse_record")
                    .with_message("record has no `id` field"))
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(ExError::new(ExErrorKind::MissingIdentifier)
                    .with_op("parse_record")
                    .with_message("record has a blank `id`"))
            }
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
            Some(other) => {
                return Err(ExError::new(ExErrorKind::InvalidRecord)
                    .with_op("parse_record")
                    .with_message(format!("unsupported `id` value: {}", other)))
            }
        };
        Ok(Self {
            id: ProgrammeId::new(id),
            fields,
        })
    }

    /// Build a record from an arbitrary JSON value
    ///
    /// # Errors
    ///
    /// `InvalidRecord` if the value is not an object, plus the errors of
    /// [`ProgrammeRecord::from_fields`].
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(ExError::new(ExErrorKind::InvalidRecord)
                .with_op("parse_record")
                .with_message(format!("record must be a JSON object, got {}", kind_of(&other)))),
        }
    }

    /// Parse a list of JSON values, reporting the position of the first bad one
    ///
    /// # Errors
    ///
    /// The first record error, with its index in the message.
    pub fn from_values(values: Vec<Value>) -> Result<Vec<Self>> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                Self::from_value(v).map_err(|e| {
                    let message = format!("record #{}: {}", i, e.message());
                    e.with_message(message)
                })
            })
            .collect()
    }

    /// Assemble a record whose `id` field is already known to match `id`
    pub(crate) fn from_parts(id: ProgrammeId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &ProgrammeId {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl TryFrom<Map<String, Value>> for ProgrammeRecord {
    type Error = ExError;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        Self::from_fields(fields)
    }
}

impl From<ProgrammeRecord> for Map<String, Value> {
    fn from(record: ProgrammeRecord) -> Self {
        record.fields
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
