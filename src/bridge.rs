//! Message pipeline
//!
//! For each incoming text: load the sender's history, generate a reply, send
//! it back through the channel and record the exchange. Completion and send
//! failures are absorbed here; only datastore errors are returned.

use std::sync::Arc;

use crate::Result;
use crate::channels::{Channel, OutgoingMessage};
use crate::completion::CompletionClient;
use crate::db::ConversationRepo;

/// What happened to one incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Reply delivered and stored
    Replied,
    /// Reply stored but the channel rejected it
    SendFailed,
    /// Completion produced no text; nothing sent or stored
    NoResponse,
}

/// Connects the conversation store, completion client and reply channel
#[derive(Clone)]
pub struct Bridge {
    conversations: ConversationRepo,
    completion: CompletionClient,
    channel: Arc<dyn Channel>,
}

impl Bridge {
    /// Create a new bridge
    #[must_use]
    pub fn new(
        conversations: ConversationRepo,
        completion: CompletionClient,
        channel: Arc<dyn Channel>,
    ) -> Self {
        Self {
            conversations,
            completion,
            channel,
        }
    }

    /// Conversation store used by this bridge
    #[must_use]
    pub const fn conversations(&self) -> &ConversationRepo {
        &self.conversations
    }

    /// Answer one message from `sender_id`
    ///
    /// # Errors
    ///
    /// Returns error if the conversation store cannot be read or written
    pub async fn handle_message(&self, sender_id: &str, text: &str) -> Result<Outcome> {
        tracing::info!(sender_id, text, "received message");

        let history = self.conversations.history(sender_id)?;
        let reply = self.completion.generate(text, &history).await;

        if reply.is_empty() {
            tracing::warn!(sender_id, "no response generated");
            return Ok(Outcome::NoResponse);
        }

        let outcome = match self
            .channel
            .send(OutgoingMessage::text(sender_id, reply.as_str()))
            .await
        {
            Ok(()) => Outcome::Replied,
            Err(e) => {
                tracing::error!(
                    channel = self.channel.name(),
                    sender_id,
                    error = %e,
                    "error sending message"
                );
                Outcome::SendFailed
            }
        };

        self.conversations.append(sender_id, text, &reply)?;

        Ok(outcome)
    }
}
