//! Shape contract for persisted and submitted records.
//!
//! A record is valid when its required fields are present with the right JSON
//! types: strings for names, types and endpoints, an array of strings for
//! observations. String contents are unrestricted. The checks work on raw
//! JSON values, so every backend applies the same contract before building
//! typed values.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("unknown record type {0:?}")]
    UnknownRecordType(String),
    #[error("invalid record on line {line}: {reason}")]
    Record { line: usize, reason: String },
}

fn require_str(value: &Value, field: &'static str) -> Result<(), ValidationError> {
    match value.get(field) {
        None => Err(ValidationError::MissingField { field }),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

/// `observations` must be an array whose items are all strings.
pub fn check_observations(value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => Ok(()),
        _ => Err(ValidationError::WrongType {
            field: "observations",
            expected: "an array of strings",
        }),
    }
}

pub fn check_entity(value: &Value) -> Result<(), ValidationError> {
    require_str(value, "name")?;
    require_str(value, "entityType")?;
    match value.get("observations") {
        None => Err(ValidationError::MissingField {
            field: "observations",
        }),
        Some(obs) => check_observations(obs),
    }
}

pub fn check_relation(value: &Value) -> Result<(), ValidationError> {
    require_str(value, "from")?;
    require_str(value, "to")?;
    require_str(value, "relationType")
}

/// Check a tagged record: `"type"` selects the entity or relation shape.
pub fn check_record(value: &Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::WrongType {
            field: "record",
            expected: "an object",
        });
    }
    match value.get("type") {
        None => Err(ValidationError::MissingField { field: "type" }),
        Some(Value::String(tag)) => match tag.as_str() {
            "entity" => check_entity(value),
            "relation" => check_relation(value),
            other => Err(ValidationError::UnknownRecordType(other.to_string())),
        },
        Some(_) => Err(ValidationError::WrongType {
            field: "type",
            expected: "a string",
        }),
    }
}
