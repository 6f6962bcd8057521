//! In-memory record store.
//!
//! Serves the action's queries and mutations from a JSON document of the
//! form `{"Timelog": [{"id": ..., ...}, ...]}`. Used for local runs of the
//! event loop and as the store behind integration tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Map, Value};

use crate::error::GatewayError;
use crate::gateway::query::SelectQuery;
use crate::gateway::{QueryGateway, QueryOptions, QueryResult};

type Records = BTreeMap<String, Vec<Map<String, Value>>>;

/// Mutex-guarded records keyed by entity type.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    records: Mutex<Records>,
}

impl MemoryGateway {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a `{entity: [record, ...]}` document.
    pub fn from_document(document: Value) -> Result<Self, GatewayError> {
        let Value::Object(entities) = document else {
            return Err(GatewayError::Storage(
                "Store document must be an object keyed by entity type".to_string(),
            ));
        };

        let mut records = Records::new();
        for (entity, rows) in entities {
            let Value::Array(rows) = rows else {
                return Err(GatewayError::Storage(format!(
                    "Records of {} must be an array",
                    entity
                )));
            };
            let rows = rows
                .into_iter()
                .map(|row| into_record(&entity, row))
                .collect::<Result<Vec<_>, _>>()?;
            records.insert(entity, rows);
        }

        Ok(Self {
            records: Mutex::new(records),
        })
    }

    /// Load a store from a JSON file.
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Storage(format!("{}: {}", path.display(), e)))?;
        let document: Value = serde_json::from_str(&content)
            .map_err(|e| GatewayError::Storage(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_document(document)?;
        tracing::info!(path = %path.display(), "Record store loaded");
        Ok(store)
    }

    /// Write the store back to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), GatewayError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GatewayError::Storage(format!("{}: {}", parent.display(), e)))?;
        }
        let content = serde_json::to_string_pretty(&self.document()?)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| GatewayError::Storage(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), "Record store saved");
        Ok(())
    }

    /// Snapshot of the whole store as a JSON document.
    pub fn document(&self) -> Result<Value, GatewayError> {
        let records = self.lock()?;
        let entities: Map<String, Value> = records
            .iter()
            .map(|(entity, rows)| {
                let rows = rows.iter().cloned().map(Value::Object).collect();
                (entity.clone(), Value::Array(rows))
            })
            .collect();
        Ok(Value::Object(entities))
    }

    /// Add a record. It must be an object with an `id`.
    pub fn insert(&self, entity_type: &str, record: Value) -> Result<(), GatewayError> {
        let record = into_record(entity_type, record)?;
        self.lock()?
            .entry(entity_type.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Look up a record by id.
    pub fn get(&self, entity_type: &str, id: &str) -> Result<Option<Value>, GatewayError> {
        let records = self.lock()?;
        Ok(records
            .get(entity_type)
            .and_then(|rows| rows.iter().find(|row| record_id(row) == Some(id)))
            .cloned()
            .map(Value::Object))
    }

    /// Number of records held for `entity_type`.
    pub fn count(&self, entity_type: &str) -> Result<usize, GatewayError> {
        Ok(self.lock()?.get(entity_type).map_or(0, Vec::len))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, GatewayError> {
        self.records
            .lock()
            .map_err(|e| GatewayError::Storage(format!("Lock poisoned: {}", e)))
    }
}

fn into_record(entity_type: &str, record: Value) -> Result<Map<String, Value>, GatewayError> {
    match record {
        Value::Object(map) if record_id(&map).is_some() => Ok(map),
        _ => Err(GatewayError::Storage(format!(
            "{} record must be an object with a string id",
            entity_type
        ))),
    }
}

fn record_id(record: &Map<String, Value>) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Resolve a dotted attribute path such as `user.first_name`.
fn lookup<'a>(record: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

fn matches_value(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

/// Wrap datetime strings the way the remote store encodes them when ISO
/// decoding is off.
fn encode_dates(value: Value) -> Value {
    match value {
        Value::String(s) if DateTime::parse_from_rfc3339(&s).is_ok() => {
            json!({"__type__": "datetime", "value": s})
        }
        other => other,
    }
}

#[async_trait]
impl QueryGateway for MemoryGateway {
    async fn query(
        &self,
        expression: &str,
        options: QueryOptions,
    ) -> Result<QueryResult, GatewayError> {
        let query = SelectQuery::parse(expression)?;
        let keys = query.projected_keys();
        let records = self.lock()?;

        let data = records
            .get(&query.entity)
            .map(|rows| {
                rows.iter()
                    .filter(|row| match &query.filter {
                        Some(filter) => lookup(row, &filter.attribute)
                            .is_some_and(|v| matches_value(v, &filter.value)),
                        None => true,
                    })
                    .map(|row| {
                        let projected: Map<String, Value> = keys
                            .iter()
                            .filter_map(|key| {
                                row.get(*key).cloned().map(|v| {
                                    let v = if options.decode_dates_as_iso {
                                        v
                                    } else {
                                        encode_dates(v)
                                    };
                                    (key.to_string(), v)
                                })
                            })
                            .collect();
                        Value::Object(projected)
                    })
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(entity = %query.entity, "Query served from memory store");
        Ok(QueryResult { data })
    }

    async fn delete(&self, entity_type: &str, id: &str) -> Result<(), GatewayError> {
        let mut records = self.lock()?;
        let rows = records.get_mut(entity_type);
        let position = rows
            .as_ref()
            .and_then(|rows| rows.iter().position(|row| record_id(row) == Some(id)));

        match (rows, position) {
            (Some(rows), Some(index)) => {
                rows.remove(index);
                Ok(())
            }
            _ => Err(GatewayError::Delete {
                entity_type: entity_type.to_string(),
                id: id.to_string(),
                reason: "record not found".to_string(),
            }),
        }
    }

    async fn update(
        &self,
        entity_type: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<(), GatewayError> {
        let mut records = self.lock()?;
        let row = records
            .get_mut(entity_type)
            .and_then(|rows| rows.iter_mut().find(|row| record_id(row) == Some(id)))
            .ok_or_else(|| GatewayError::Update {
                entity_type: entity_type.to_string(),
                id: id.to_string(),
                reason: "record not found".to_string(),
            })?;

        if changes.contains_key("id") {
            return Err(GatewayError::Update {
                entity_type: entity_type.to_string(),
                id: id.to_string(),
                reason: "primary key cannot be changed".to_string(),
            });
        }
        row.extend(changes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::query::timelog_query;

    fn store() -> MemoryGateway {
        MemoryGateway::from_document(json!({
            "Timelog": [
                {
                    "id": "T1", "comment": "layout", "context_id": "42", "duration": 3600,
                    "name": "", "start": "2024-03-01T09:00:00Z",
                    "user": {"first_name": "Ada", "last_name": "Lovelace"},
                    "user_id": "U1"
                },
                {
                    "id": "T2", "comment": "anim", "context_id": "42", "duration": 1800,
                    "user": {"first_name": "Alan", "last_name": "Turing"}
                },
                {"id": "T3", "comment": "other task", "context_id": "7", "duration": 60}
            ]
        }))
        .unwrap()
    }

    fn iso() -> QueryOptions {
        QueryOptions {
            decode_dates_as_iso: true,
        }
    }

    #[tokio::test]
    async fn test_query_filters_by_context() {
        let gateway = store();
        let result = gateway.query(&timelog_query("Timelog", "42"), iso()).await.unwrap();
        let ids: Vec<&str> = result.data.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["T1", "T2"]);
    }

    #[tokio::test]
    async fn test_query_projects_selected_keys() {
        let gateway = store();
        let result = gateway.query(&timelog_query("Timelog", "42"), iso()).await.unwrap();
        let first = result.data[0].as_object().unwrap();
        assert!(first.contains_key("user"));
        assert!(!first.contains_key("user_id"));
        assert_eq!(first["start"], json!("2024-03-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_query_encodes_dates_without_iso() {
        let gateway = store();
        let result = gateway
            .query(&timelog_query("Timelog", "42"), QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(
            result.data[0]["start"],
            json!({"__type__": "datetime", "value": "2024-03-01T09:00:00Z"})
        );
    }

    #[tokio::test]
    async fn test_query_unknown_entity_or_context_is_empty() {
        let gateway = store();
        let result = gateway.query(&timelog_query("Timelog", "999"), iso()).await.unwrap();
        assert!(result.data.is_empty());
        let result = gateway.query("select id from Note", iso()).await.unwrap();
        assert!(result.data.is_empty());
    }

    #[tokio::test]
    async fn test_query_nested_filter_and_numbers() {
        let gateway = store();
        let result = gateway
            .query("select id from Timelog where user.first_name is Alan", iso())
            .await
            .unwrap();
        assert_eq!(result.data, vec![json!({"id": "T2"})]);

        let result = gateway
            .query("select id from Timelog where duration is 60", iso())
            .await
            .unwrap();
        assert_eq!(result.data, vec![json!({"id": "T3"})]);
    }

    #[tokio::test]
    async fn test_query_rejects_unsupported_statement() {
        let gateway = store();
        let err = gateway.query("update Timelog", iso()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Query(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let gateway = store();
        gateway.delete("Timelog", "T1").await.unwrap();
        assert_eq!(gateway.count("Timelog").unwrap(), 2);
        assert!(gateway.get("Timelog", "T1").unwrap().is_none());

        let err = gateway.delete("Timelog", "T1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Delete { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let gateway = store();
        let mut changes = Map::new();
        changes.insert("comment".to_string(), json!("cleanup"));
        changes.insert("duration".to_string(), json!(120));
        gateway.update("Timelog", "T2", changes).await.unwrap();

        let record = gateway.get("Timelog", "T2").unwrap().unwrap();
        assert_eq!(record["comment"], json!("cleanup"));
        assert_eq!(record["duration"], json!(120));
        assert_eq!(record["context_id"], json!("42"));
    }

    #[tokio::test]
    async fn test_update_missing_record_or_primary_key() {
        let gateway = store();
        let err = gateway.update("Timelog", "T9", Map::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Update { .. }));

        let mut changes = Map::new();
        changes.insert("id".to_string(), json!("T5"));
        let err = gateway.update("Timelog", "T1", changes).await.unwrap_err();
        assert!(err.to_string().contains("primary key"));
    }

    #[test]
    fn test_from_document_validation() {
        assert!(MemoryGateway::from_document(json!([])).is_err());
        assert!(MemoryGateway::from_document(json!({"Timelog": {}})).is_err());
        assert!(MemoryGateway::from_document(json!({"Timelog": [{"comment": "x"}]})).is_err());
        assert!(MemoryGateway::from_document(json!({})).is_ok());
    }

    #[test]
    fn test_insert_requires_id() {
        let gateway = MemoryGateway::new();
        gateway.insert("Timelog", json!({"id": "T1", "duration": 1})).unwrap();
        assert!(gateway.insert("Timelog", json!({"duration": 1})).is_err());
        assert_eq!(gateway.count("Timelog").unwrap(), 1);
        assert_eq!(gateway.count("Note").unwrap(), 0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("store.json");

        let gateway = store();
        gateway.save(&path).unwrap();

        let reloaded = MemoryGateway::load(&path).unwrap();
        assert_eq!(reloaded.count("Timelog").unwrap(), 3);
        assert_eq!(reloaded.document().unwrap(), gateway.document().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemoryGateway::load(Path::new("/nonexistent/store.json")).unwrap_err();
        assert!(matches!(err, GatewayError::Storage(_)));
    }
}
