//! Query statements issued by the action.
//!
//! Builds the time log lookup and parses the `select ... from ... where ...
//! is ...` subset of the query language that the in-memory gateway serves.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::GatewayError;

/// Attributes fetched for every time log shown in the form.
pub const TIMELOG_ATTRIBUTES: [&str; 8] = [
    "id",
    "comment",
    "context_id",
    "duration",
    "name",
    "start",
    "user.first_name",
    "user.last_name",
];

static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*select\s+(?P<attrs>.+?)\s+from\s+(?P<entity>\w+)(?:\s+where\s+(?P<attr>[\w.]+)\s+is\s+(?P<value>"(?:[^"\\]|\\.)*"|\S+))?\s*$"#,
    )
    .unwrap()
});

/// Statement selecting all time logs of `entity` logged against `context_id`.
pub fn timelog_query(entity: &str, context_id: &str) -> String {
    format!(
        "select {} from {} where context_id is {}",
        TIMELOG_ATTRIBUTES.join(", "),
        entity,
        quote(context_id)
    )
}

/// Double-quote a value, escaping embedded quotes and backslashes.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `<attribute> is <value>` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub attribute: String,
    pub value: String,
}

/// A parsed select statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub attributes: Vec<String>,
    pub entity: String,
    pub filter: Option<Filter>,
}

impl SelectQuery {
    pub fn parse(expression: &str) -> Result<Self, GatewayError> {
        let caps = SELECT_RE
            .captures(expression)
            .ok_or_else(|| GatewayError::Query(format!("Unsupported query: {}", expression)))?;

        let attributes: Vec<String> = caps["attrs"]
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if attributes.is_empty() {
            return Err(GatewayError::Query(format!(
                "No attributes selected: {}",
                expression
            )));
        }

        let filter = match (caps.name("attr"), caps.name("value")) {
            (Some(attr), Some(value)) => Some(Filter {
                attribute: attr.as_str().to_string(),
                value: unquote(value.as_str()),
            }),
            _ => None,
        };

        Ok(Self {
            attributes,
            entity: caps["entity"].to_string(),
            filter,
        })
    }

    /// Top-level keys of the rows to return, in selection order.
    pub fn projected_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for attribute in &self.attributes {
            let key = attribute.split('.').next().unwrap_or(attribute);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}
