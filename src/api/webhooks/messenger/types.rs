//! Messenger webhook types
//!
//! The envelope is decoded strictly; individual messaging events are decoded
//! one at a time so an unfamiliar event cannot reject the whole delivery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page webhook delivery (simplified)
#[derive(Debug, Deserialize, Serialize)]
pub struct MessengerWebhook {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<MessengerEntry>,
}

/// One page entry in a delivery
#[derive(Debug, Deserialize, Serialize)]
pub struct MessengerEntry {
    pub id: Option<String>,
    /// Raw events, decoded lazily by [`MessengerWebhook::events`]
    #[serde(default)]
    pub messaging: Vec<Value>,
}

/// A single messaging event (message, delivery, read, postback, ...)
#[derive(Debug, Deserialize, Serialize)]
pub struct MessagingEvent {
    pub sender: Option<MessengerParticipant>,
    pub recipient: Option<MessengerParticipant>,
    pub message: Option<MessengerMessage>,
}

/// Event participant
///
/// Opt-in events identify the sender by `user_ref` instead of a page-scoped id.
#[derive(Debug, Deserialize, Serialize)]
pub struct MessengerParticipant {
    pub id: Option<String>,
    pub user_ref: Option<String>,
}

/// Message payload of a messaging event
#[derive(Debug, Deserialize, Serialize)]
pub struct MessengerMessage {
    pub mid: Option<String>,
    pub text: Option<String>,
    /// Set on copies of messages the page itself sent
    #[serde(default)]
    pub is_echo: bool,
}

impl MessengerWebhook {
    /// Every messaging event across all entries, in delivery order
    ///
    /// Events that do not decode are logged and skipped.
    pub fn events(&self) -> impl Iterator<Item = MessagingEvent> + '_ {
        self.entry
            .iter()
            .flat_map(|entry| entry.messaging.iter())
            .filter_map(|raw| match MessagingEvent::deserialize(raw) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable messaging event");
                    None
                }
            })
    }
}

impl MessagingEvent {
    /// Page-scoped sender id, if present
    #[must_use]
    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().and_then(|s| s.id.as_deref())
    }
}
