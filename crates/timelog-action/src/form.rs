//! Edit form for a task's time logs.
//!
//! Each time log becomes four fields: a label, then comment, duration and
//! delete fields that all share the record id as their `name`. The host
//! collapses fields sharing a name into one array on submission, so a
//! submitted form arrives as `{"<id>": [comment, duration, delete], ...}`.
//! [`decode_values`] is the inverse of [`build_form`] under that encoding.

use serde_json::{Number, Value};

use crate::error::ActionError;
use crate::types::{
    seconds_from_number, FormField, SubmittedEntry, SubmittedValues, TimelogRecord,
};

/// Fields for one time log, `index` being its position in the form.
pub fn format_timelog_item(record: &TimelogRecord, index: usize) -> [FormField; 4] {
    [
        FormField::Label {
            text: format!(
                "## Timelog number {} - {}##",
                index,
                record.user.display_name()
            ),
        },
        FormField::TextField {
            name: record.id.clone(),
            label: "Comment".to_string(),
            value: record.comment.clone(),
        },
        FormField::NumberField {
            name: record.id.clone(),
            label: "Duration".to_string(),
            value: record.duration_seconds,
        },
        FormField::BooleanField {
            name: record.id.clone(),
            label: "Delete".to_string(),
            value: false,
        },
    ]
}

/// The whole form, records in query order.
pub fn build_form(records: &[TimelogRecord]) -> Vec<FormField> {
    records
        .iter()
        .enumerate()
        .flat_map(|(index, record)| format_timelog_item(record, index))
        .collect()
}

/// Decode the host's submitted values into typed entries.
///
/// Accepts the positional `[comment, duration, delete]` arrays produced by
/// [`build_form`] as well as `{comment, duration, delete}` objects. Only a
/// literal `true` in the last position marks a record for deletion.
pub fn decode_values(values: &Value) -> Result<SubmittedValues, ActionError> {
    let Value::Object(map) = values else {
        return Err(ActionError::InvalidValues(
            "expected an object keyed by record id".to_string(),
        ));
    };

    let mut decoded = SubmittedValues::new();
    for (id, value) in map {
        let entry = match value {
            Value::Array(items) => decode_positional(id, items)?,
            Value::Object(fields) => SubmittedEntry {
                comment: decode_comment(id, fields.get("comment").unwrap_or(&Value::Null))?,
                duration_seconds: decode_duration(id, fields.get("duration"))?,
                delete: fields.get("delete") == Some(&Value::Bool(true)),
            },
            other => {
                return Err(ActionError::InvalidValues(format!(
                    "{}: expected an array or object, got {}",
                    id, other
                )))
            }
        };
        decoded.push(id.clone(), entry);
    }
    Ok(decoded)
}

fn decode_positional(id: &str, items: &[Value]) -> Result<SubmittedEntry, ActionError> {
    if items.len() < 2 {
        return Err(ActionError::InvalidValues(format!(
            "{}: expected [comment, duration, delete], got {} value(s)",
            id,
            items.len()
        )));
    }
    Ok(SubmittedEntry {
        comment: decode_comment(id, &items[0])?,
        duration_seconds: decode_duration(id, items.get(1))?,
        delete: items.last() == Some(&Value::Bool(true)),
    })
}

fn decode_comment(id: &str, value: &Value) -> Result<Option<String>, ActionError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(ActionError::InvalidValues(format!(
            "{}: comment must be text, got {}",
            id, other
        ))),
    }
}

fn decode_duration(id: &str, value: Option<&Value>) -> Result<i64, ActionError> {
    let seconds = match value {
        Some(Value::Number(n)) => seconds_from_number(n),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .and_then(|n| seconds_from_number(&n)),
        _ => None,
    };
    seconds.ok_or_else(|| {
        ActionError::InvalidValues(format!(
            "{}: duration must be a number, got {}",
            id,
            value.unwrap_or(&Value::Null)
        ))
    })
}
