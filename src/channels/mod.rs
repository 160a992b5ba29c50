//! Messaging channel adapters
//!
//! Each channel implements the `Channel` trait to deliver replies.

mod messenger;

use async_trait::async_trait;

pub use messenger::{DEFAULT_GRAPH_API_URL, MessengerChannel};

use crate::Result;

/// A message to send to a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Platform-specific recipient identifier
    pub recipient_id: String,

    /// Message content (plain text)
    pub content: String,
}

impl OutgoingMessage {
    /// Create a simple `text` message
    #[must_use]
    pub fn text(recipient_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            content: content.into(),
        }
    }
}

/// Trait for messaging channel adapters
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Send a message
    async fn send(&self, message: OutgoingMessage) -> Result<()>;
}
