//! Core types for the timelog action.
//!
//! Defines store records, form fields, submitted values, commit plans and the
//! payloads exchanged with the host on discover and launch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use timelog_core::types::Selection;

// =============================================================================
// Store records
// =============================================================================

/// Owner of a time log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelogUser {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl TimelogUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A time log row as returned by the store query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelogRecord {
    pub id: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "duration", deserialize_with = "deserialize_seconds")]
    pub duration_seconds: i64,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_start")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: TimelogUser,
}

/// Convert a JSON number of seconds to whole seconds.
///
/// The store reports durations as floats; fractional seconds are rounded.
pub(crate) fn seconds_from_number(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f.round() as i64)
    })
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    seconds_from_number(&number)
        .ok_or_else(|| de::Error::custom(format!("duration out of range: {}", number)))
}

/// Accepts ISO-8601 strings with or without an offset (naive values are UTC),
/// and the encoded `{"__type__": "datetime", "value": ...}` form the store
/// uses when ISO decoding was not requested.
fn deserialize_start<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let text = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(Value::Object(mut map)) => match map.remove("value") {
            Some(Value::String(s)) => s,
            _ => return Err(de::Error::custom("encoded datetime without a string value")),
        },
        Some(other) => {
            return Err(de::Error::custom(format!(
                "expected a datetime string, got {}",
                other
            )))
        }
    };
    parse_timestamp(&text)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("invalid datetime: {}", text)))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Form
// =============================================================================

/// A form field descriptor rendered by the host UI.
///
/// Editable fields carry `name` = the record id they edit. The host returns
/// the values of fields that share a name together, in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FormField {
    #[serde(rename = "label")]
    Label {
        #[serde(rename = "value")]
        text: String,
    },
    #[serde(rename = "text")]
    TextField {
        name: String,
        label: String,
        value: Option<String>,
    },
    #[serde(rename = "number")]
    NumberField {
        name: String,
        label: String,
        value: i64,
    },
    #[serde(rename = "boolean")]
    BooleanField {
        name: String,
        label: String,
        value: bool,
    },
}

impl FormField {
    /// The submission key of an editable field; labels have none.
    pub fn name(&self) -> Option<&str> {
        match self {
            FormField::Label { .. } => None,
            FormField::TextField { name, .. }
            | FormField::NumberField { name, .. }
            | FormField::BooleanField { name, .. } => Some(name),
        }
    }
}

// =============================================================================
// Submission and commit
// =============================================================================

/// Edits submitted for one time log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedEntry {
    pub comment: Option<String>,
    pub duration_seconds: i64,
    pub delete: bool,
}

/// Submitted edits keyed by record id, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedValues {
    entries: Vec<(String, SubmittedEntry)>,
}

impl SubmittedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>, entry: SubmittedEntry) {
        self.entries.push((id.into(), entry));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SubmittedEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SubmittedEntry)> for SubmittedValues {
    fn from_iter<I: IntoIterator<Item = (K, SubmittedEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Field update for one time log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelogUpdate {
    pub id: String,
    pub comment: Option<String>,
    pub duration_seconds: i64,
}

impl TimelogUpdate {
    /// The store attributes written by this update.
    pub fn changes(&self) -> Map<String, Value> {
        let mut changes = Map::new();
        changes.insert(
            "comment".to_string(),
            self.comment.clone().map(Value::String).unwrap_or(Value::Null),
        );
        changes.insert("duration".to_string(), Value::from(self.duration_seconds));
        changes
    }
}

/// Ordered mutations derived from a submitted form.
///
/// Deletions run before updates; an id never appears in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPlan {
    pub deletions: Vec<String>,
    pub updates: Vec<TimelogUpdate>,
}

impl CommitPlan {
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.updates.is_empty()
    }
}

// =============================================================================
// Host payloads
// =============================================================================

/// Action button advertised on discover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub label: String,
    pub description: String,
    pub action_identifier: String,
}

/// Reply to a discover event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub items: Vec<ActionDescriptor>,
}

/// Data carried by a launch event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchData {
    #[serde(default)]
    pub selection: Selection,
    /// Present once the user has submitted the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_identifier: Option<String>,
}

/// What a launch invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    /// The edit form for the selected task.
    Form(Vec<FormField>),
    /// An informational message, no form.
    Info(String),
    /// The submitted edits were applied.
    Committed { deleted: usize, updated: usize },
}

/// Reply to a launch event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LaunchResponse {
    Form { items: Vec<FormField> },
    Message { success: bool, message: String },
}

impl LaunchResponse {
    pub fn success(message: impl Into<String>) -> Self {
        LaunchResponse::Message {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        LaunchResponse::Message {
            success: false,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            LaunchResponse::Form { .. } => true,
            LaunchResponse::Message { success, .. } => *success,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
