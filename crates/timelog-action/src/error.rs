//! Error types for the timelog action.

/// Errors reported by a [`QueryGateway`](crate::gateway::QueryGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Delete of {entity_type} {id} failed: {reason}")]
    Delete {
        entity_type: String,
        id: String,
        reason: String,
    },
    #[error("Update of {entity_type} {id} failed: {reason}")]
    Update {
        entity_type: String,
        id: String,
        reason: String,
    },
    #[error("Malformed query result: {0}")]
    Malformed(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors from a launch invocation.
///
/// None of these reach the event hub: the controller turns every one of them
/// into a `{success: false}` reply.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Entity ID not found")]
    MissingEntity,
    #[error("Invalid submitted values: {0}")]
    InvalidValues(String),
    #[error("Invalid launch data: {0}")]
    Decode(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
