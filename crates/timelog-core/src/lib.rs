pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::PluginConfig;
pub use error::{Result, TimelogError};
pub use events::{Event, EventSource, Subscription, Topic};
pub use types::*;
