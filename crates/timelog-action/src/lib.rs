//! Timelog edit action.
//!
//! Offers an "edit time logs" action on single task selections, renders the
//! task's time logs as an editable form, and commits the submitted edits back
//! to the store through a [`QueryGateway`].

pub mod controller;
pub mod error;
pub mod form;
pub mod gateway;
pub mod planner;
pub mod types;

pub use controller::ActionController;
pub use error::{ActionError, GatewayError};
pub use form::{build_form, format_timelog_item};
pub use gateway::memory::MemoryGateway;
pub use gateway::{QueryGateway, QueryOptions, QueryResult};
pub use planner::plan_commit;
pub use types::{
    ActionDescriptor, CommitPlan, DiscoverResponse, FormField, LaunchData, LaunchOutcome,
    LaunchResponse, SubmittedEntry, SubmittedValues, TimelogRecord, TimelogUpdate, TimelogUser,
};
