//! Audit snapshot helpers
//!
//! Snapshots are the JSON serialization of a row. Updates are reduced to the
//! fields whose values differ; sensitive fields are replaced by a marker
//! before anything is persisted.

use serde::Serialize;
use serde_json::{Map, Value};

/// Marker written in place of sensitive values
pub const REDACTED: &str = "[REDACTED]";

/// Field names whose values never reach the audit trail
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "password_hash",
    "hash_pass",
    "secret",
    "token",
    "access_token",
    "refresh_token",
    "api_key",
];

/// Bookkeeping columns that change on every write and say nothing on their own
const IGNORED_FIELDS: &[&str] = &["created_at", "updated_at"];

fn is_sensitive(field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    SENSITIVE_FIELDS.contains(&field.as_str())
}

/// Serialize a row into a snapshot. Rows that fail to serialize yield `Null`.
pub fn snapshot<T: Serialize>(row: &T) -> Value {
    serde_json::to_value(row).unwrap_or(Value::Null)
}

/// Replace the value of every sensitive field, at any depth, with [`REDACTED`]
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    if is_sensitive(&key) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, sanitize(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        other => other,
    }
}

/// Prior and new values of the fields that changed between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChanges {
    pub old_values: Value,
    pub new_values: Value,
}

/// Compare two snapshots field by field.
///
/// Returns `None` when nothing but bookkeeping columns differ. A field missing
/// on one side is reported as `null` on that side.
pub fn changed_fields(before: &Value, after: &Value) -> Option<FieldChanges> {
    let empty = Map::new();
    let before_obj = before.as_object().unwrap_or(&empty);
    let after_obj = after.as_object().unwrap_or(&empty);

    let mut old_values = Map::new();
    let mut new_values = Map::new();

    let keys = before_obj
        .keys()
        .chain(after_obj.keys().filter(|k| !before_obj.contains_key(*k)));

    for key in keys {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let old = before_obj.get(key).unwrap_or(&Value::Null);
        let new = after_obj.get(key).unwrap_or(&Value::Null);
        if old != new {
            old_values.insert(key.clone(), old.clone());
            new_values.insert(key.clone(), new.clone());
        }
    }

    if new_values.is_empty() {
        return None;
    }

    Some(FieldChanges {
        old_values: Value::Object(old_values),
        new_values: Value::Object(new_values),
    })
}
