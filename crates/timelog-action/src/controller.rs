//! Action controller.
//!
//! Decides when the action is offered, builds the edit form on launch, and
//! commits the submitted form back through the gateway. A launch without
//! values queries the task's time logs; a launch with values applies them.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use timelog_core::config::ActionConfig;
use timelog_core::events::{Event, Subscription, Topic};
use timelog_core::types::{single_entity, Selection, SelectionEntry};
use tracing::{debug, info, warn};

use crate::error::{ActionError, GatewayError};
use crate::form::{build_form, decode_values};
use crate::gateway::query::timelog_query;
use crate::gateway::{QueryGateway, QueryOptions};
use crate::planner::plan_commit;
use crate::types::{
    ActionDescriptor, CommitPlan, DiscoverResponse, LaunchData, LaunchOutcome, LaunchResponse,
    TimelogRecord,
};

/// Reply when the selected task has no time logs.
pub const NO_TIMELOGS_MESSAGE: &str = "No time logs available on this task";
/// Reply after a submitted form was applied.
pub const COMMIT_SUCCESS_MESSAGE: &str = "Time logs updated successfully";

#[derive(Debug, Default, Deserialize)]
struct DiscoverData {
    #[serde(default)]
    selection: Selection,
}

/// Handles discover and launch events for the timelog edit action.
pub struct ActionController<G> {
    gateway: Arc<G>,
    config: ActionConfig,
}

impl<G: QueryGateway> ActionController<G> {
    /// Create a controller that reads and writes through `gateway`.
    pub fn new(gateway: Arc<G>, config: ActionConfig) -> Self {
        Self { gateway, config }
    }

    /// The button advertised to the host.
    pub fn descriptor(&self) -> ActionDescriptor {
        ActionDescriptor {
            label: self.config.label.clone(),
            description: self.config.description.clone(),
            action_identifier: self.config.identifier.clone(),
        }
    }

    /// Subscriptions to register on the event hub.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::topic(Topic::Discover),
            Subscription::topic(Topic::Launch).with_action_identifier(&self.config.identifier),
        ]
    }

    /// Offer the action only for a single selected task.
    pub fn discover(&self, selection: &[SelectionEntry]) -> Option<DiscoverResponse> {
        single_entity(selection, &self.config.entity_type)?;
        Some(DiscoverResponse {
            items: vec![self.descriptor()],
        })
    }

    /// Run a launch and convert the outcome, or any error, into the reply.
    pub async fn launch(&self, data: &LaunchData) -> LaunchResponse {
        match self.run_launch(data).await {
            Ok(LaunchOutcome::Form(items)) => LaunchResponse::Form { items },
            Ok(LaunchOutcome::Info(message)) => LaunchResponse::success(message),
            Ok(LaunchOutcome::Committed { .. }) => LaunchResponse::success(COMMIT_SUCCESS_MESSAGE),
            Err(e) => {
                warn!(error = %e, "Timelog action launch failed");
                LaunchResponse::failure(format!("An error occurred: {}", e))
            }
        }
    }

    /// Launch state machine: query the form, or commit submitted values.
    pub async fn run_launch(&self, data: &LaunchData) -> Result<LaunchOutcome, ActionError> {
        match data.values {
            Some(ref values) => {
                let values = decode_values(values)?;
                let plan = plan_commit(&values);
                self.commit(&plan).await
            }
            None => self.load_form(&data.selection).await,
        }
    }

    async fn load_form(&self, selection: &[SelectionEntry]) -> Result<LaunchOutcome, ActionError> {
        let entity_id = selection
            .first()
            .and_then(SelectionEntry::id)
            .ok_or(ActionError::MissingEntity)?;

        let expression = timelog_query(&self.config.timelog_entity, entity_id);
        debug!(entity_id = %entity_id, query = %expression, "Querying time logs");
        let result = self
            .gateway
            .query(
                &expression,
                QueryOptions {
                    decode_dates_as_iso: true,
                },
            )
            .await?;

        if result.data.is_empty() {
            info!(entity_id = %entity_id, "No time logs on task");
            return Ok(LaunchOutcome::Info(NO_TIMELOGS_MESSAGE.to_string()));
        }

        let records = result
            .data
            .into_iter()
            .map(|row| {
                serde_json::from_value::<TimelogRecord>(row)
                    .map_err(|e| GatewayError::Malformed(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(entity_id = %entity_id, records = records.len(), "Time log form built");
        Ok(LaunchOutcome::Form(build_form(&records)))
    }

    /// Apply a commit plan: every deletion, then every update, in order.
    ///
    /// Stops at the first gateway error. Operations applied before the error
    /// stay applied.
    pub async fn commit(&self, plan: &CommitPlan) -> Result<LaunchOutcome, ActionError> {
        let entity = &self.config.timelog_entity;
        info!(
            deletions = plan.deletions.len(),
            updates = plan.updates.len(),
            "Committing time log edits"
        );

        for id in &plan.deletions {
            self.gateway.delete(entity, id).await?;
            debug!(id = %id, "Time log deleted");
        }

        for update in &plan.updates {
            self.gateway
                .update(entity, &update.id, update.changes())
                .await?;
            debug!(id = %update.id, "Time log updated");
        }

        Ok(LaunchOutcome::Committed {
            deleted: plan.deletions.len(),
            updated: plan.updates.len(),
        })
    }

    /// Route an incoming hub event. Returns the reply payload, or `None` when
    /// the event is not for this action.
    pub async fn handle(&self, event: &Event) -> Option<Value> {
        if !self.subscriptions().iter().any(|s| s.matches(event)) {
            return None;
        }

        match event.topic() {
            Ok(Topic::Discover) => {
                let data: DiscoverData = serde_json::from_value(event.data.clone())
                    .unwrap_or_default();
                let response = self.discover(&data.selection)?;
                to_reply(&response)
            }
            Ok(Topic::Launch) => {
                info!(
                    event_id = %event.id,
                    user = event.username().unwrap_or("unknown"),
                    "Timelog action launched"
                );
                let response = match serde_json::from_value::<LaunchData>(event.data.clone()) {
                    Ok(data) => self.launch(&data).await,
                    Err(e) => {
                        let err = ActionError::Decode(e.to_string());
                        warn!(error = %err, "Timelog action launch failed");
                        LaunchResponse::failure(format!("An error occurred: {}", err))
                    }
                };
                to_reply(&response)
            }
            Ok(Topic::Reply) | Err(_) => None,
        }
    }
}

fn to_reply<T: serde::Serialize>(response: &T) -> Option<Value> {
    match serde_json::to_value(response) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "Failed to encode reply");
            None
        }
    }
}
