//! Access to the platform's record store.
//!
//! The action only ever reads time logs through a query statement and
//! mutates them one record at a time. Implementations own the session,
//! transport and authentication.

pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::GatewayError;

/// Options for a query call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Return datetimes as plain ISO-8601 strings instead of encoded objects.
    pub decode_dates_as_iso: bool,
}

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub data: Vec<Value>,
}

/// Gateway to the store. Each call is one round trip.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Run a query statement and return the matching rows.
    async fn query(
        &self,
        expression: &str,
        options: QueryOptions,
    ) -> Result<QueryResult, GatewayError>;

    /// Delete a single record by primary key.
    async fn delete(&self, entity_type: &str, id: &str) -> Result<(), GatewayError>;

    /// Write `changes` onto a single record.
    async fn update(
        &self,
        entity_type: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<(), GatewayError>;
}
