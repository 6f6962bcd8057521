//! Event envelope exchanged with the platform's event hub.
//!
//! The hub delivers events on dotted topics and accepts replies addressed
//! to the triggering event id. Event ids are opaque strings chosen by the
//! sender. Handlers register interest through subscription expressions such
//! as `topic=ftrack.action.launch and data.actionIdentifier=show.edit.timelogs`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TimelogError;

/// Topics the action takes part in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The host asks which actions apply to the current selection.
    Discover,
    /// The user pressed an action button, or submitted its form.
    Launch,
    /// A reply to an earlier event.
    Reply,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Discover => "ftrack.action.discover",
            Topic::Launch => "ftrack.action.launch",
            Topic::Reply => "ftrack.meta.reply",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = TimelogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ftrack.action.discover" => Ok(Topic::Discover),
            "ftrack.action.launch" => Ok(Topic::Launch),
            "ftrack.meta.reply" => Ok(Topic::Reply),
            other => Err(TimelogError::Event(format!("Unknown topic: {}", other))),
        }
    }
}

/// User that triggered an event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUser {
    #[serde(default)]
    pub username: Option<String>,
}

/// Origin of an event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user: Option<EventUser>,
}

fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

/// An event as delivered by (or sent to) the hub.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default = "new_event_id")]
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<DateTime<Utc>>,
}

impl Event {
    /// Create a new event on `topic` with a fresh id.
    pub fn new(topic: Topic, data: Value) -> Self {
        Self {
            id: new_event_id(),
            topic: topic.as_str().to_string(),
            data,
            source: None,
            in_reply_to_event: None,
            sent: Some(Utc::now()),
        }
    }

    /// Parse the topic string into a known [`Topic`].
    pub fn topic(&self) -> Result<Topic, TimelogError> {
        self.topic.parse()
    }

    /// Build the reply event carrying `data` back to the sender of `self`.
    pub fn reply(&self, data: Value) -> Event {
        Event {
            in_reply_to_event: Some(self.id.clone()),
            ..Event::new(Topic::Reply, data)
        }
    }

    /// Username of the user that triggered the event, if the hub sent one.
    pub fn username(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .and_then(|u| u.username.as_deref())
    }
}

/// A subscription expression matched against incoming events.
///
/// Supports the two clauses the action uses: `topic=<name>` and an optional
/// `and data.actionIdentifier=<identifier>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub topic: Topic,
    pub action_identifier: Option<String>,
}

impl Subscription {
    pub fn topic(topic: Topic) -> Self {
        Self {
            topic,
            action_identifier: None,
        }
    }

    pub fn with_action_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.action_identifier = Some(identifier.into());
        self
    }

    /// Whether `event` should be delivered to this subscriber.
    ///
    /// Events that carry no `actionIdentifier` at all still match an
    /// identifier-scoped subscription; hosts that omit the field broadcast
    /// launches to every action.
    pub fn matches(&self, event: &Event) -> bool {
        if event.topic != self.topic.as_str() {
            return false;
        }
        match (&self.action_identifier, event.data.get("actionIdentifier")) {
            (Some(expected), Some(Value::String(actual))) => expected == actual,
            (Some(_), Some(Value::Null)) | (Some(_), None) | (None, _) => true,
            (Some(_), Some(_)) => false,
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic={}", self.topic)?;
        if let Some(ref identifier) = self.action_identifier {
            write!(f, " and data.actionIdentifier={}", identifier)?;
        }
        Ok(())
    }
}
