//! Worker message protocol, push payloads and notifications.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::oneshot;

/// Sync tag that triggers pruning of expired API responses
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

pub const ACTION_OPEN: &str = "open";
pub const ACTION_DISMISS: &str = "dismiss";

/// Messages the client posts to the worker's control loop.
#[derive(Debug)]
pub enum WorkerMessage {
  /// Activate a waiting worker now
  SkipWaiting,
  /// Reply with the static cache name
  GetVersion(oneshot::Sender<String>),
  /// Background sync with a tag
  Sync(String),
  /// Raw push data. Empty data is ignored.
  Push(String),
}

/// Commands the worker sends back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
  ShowNotification(Notification),
  OpenMovie(String),
}

/// JSON body of a push message.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PushPayload {
  pub title: String,
  #[serde(default)]
  pub body: String,
  #[serde(rename = "primaryKey", default, deserialize_with = "key_as_string")]
  pub primary_key: Option<String>,
}

/// Primary keys arrive as either strings or numbers.
fn key_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::String(s)) => Some(s),
    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

impl PushPayload {
  pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(data)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationAction {
  pub action: &'static str,
  pub title: &'static str,
}

pub const NOTIFICATION_ACTIONS: [NotificationAction; 2] = [
  NotificationAction {
    action: ACTION_OPEN,
    title: "View movie",
  },
  NotificationAction {
    action: ACTION_DISMISS,
    title: "Close",
  },
];

/// A notification built from a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub primary_key: Option<String>,
  pub arrived_at: DateTime<Utc>,
  pub actions: Vec<NotificationAction>,
}

impl Notification {
  pub fn from_push(payload: PushPayload, arrived_at: DateTime<Utc>) -> Self {
    Self {
      title: payload.title,
      body: payload.body,
      primary_key: payload.primary_key,
      arrived_at,
      actions: NOTIFICATION_ACTIONS.to_vec(),
    }
  }

  /// The user picked `action`. Opening yields a command for the client;
  /// dismissing, or anything else, just closes the notification.
  pub fn click(&self, action: &str) -> Option<ClientCommand> {
    match action {
      ACTION_OPEN => self.primary_key.clone().map(ClientCommand::OpenMovie),
      _ => None,
    }
  }
}
