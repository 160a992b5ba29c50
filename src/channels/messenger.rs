//! Facebook Messenger channel adapter
//!
//! Replies go out through the Graph API Send endpoint. Incoming messages
//! arrive on the page webhook (see `api::webhooks::messenger`).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{Channel, OutgoingMessage};
use crate::{Error, Result};

/// Default Graph API base URL
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v12.0";

/// Messenger channel adapter
pub struct MessengerChannel {
    /// Page access token
    access_token: SecretString,
    /// Graph API base URL
    graph_url: String,
    client: Client,
}

/// Send API request body
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    messaging_type: &'static str,
    recipient: Recipient<'a>,
    message: MessageBody<'a>,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    text: &'a str,
}

impl MessengerChannel {
    /// Create a new Messenger channel adapter
    #[must_use]
    pub fn new(access_token: SecretString) -> Self {
        Self::with_graph_url(access_token, DEFAULT_GRAPH_API_URL)
    }

    /// Create an adapter against a custom Graph API base URL
    #[must_use]
    pub fn with_graph_url(access_token: SecretString, graph_url: impl Into<String>) -> Self {
        let graph_url: String = graph_url.into();
        Self {
            access_token,
            graph_url: graph_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/me/messages", self.graph_url)
    }

    /// Send a text message to a page-scoped user id
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API answers anything but 200
    pub async fn send_text(&self, recipient_id: &str, text: &str) -> Result<()> {
        let body = SendRequest {
            messaging_type: "RESPONSE",
            recipient: Recipient { id: recipient_id },
            message: MessageBody { text },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("access_token", self.access_token.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Messenger API error: {e}")))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!("Messenger API error: {status} - {body}")));
        }

        tracing::debug!(recipient_id, "Messenger message sent");
        Ok(())
    }
}

#[async_trait]
impl Channel for MessengerChannel {
    fn name(&self) -> &'static str {
        "messenger"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.send_text(&message.recipient_id, &message.content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_matches_graph_schema() {
        let body = SendRequest {
            messaging_type: "RESPONSE",
            recipient: Recipient { id: "1234" },
            message: MessageBody { text: "hello" },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messaging_type": "RESPONSE",
                "recipient": {"id": "1234"},
                "message": {"text": "hello"}
            })
        );
    }

    #[test]
    fn endpoint_targets_me_messages() {
        let channel = MessengerChannel::new(SecretString::from("token".to_string()));
        assert_eq!(
            channel.endpoint(),
            "https://graph.facebook.com/v12.0/me/messages"
        );
    }

    #[test]
    fn custom_graph_url_drops_trailing_slash() {
        let channel = MessengerChannel::with_graph_url(
            SecretString::from("token".to_string()),
            "http://127.0.0.1:9000/",
        );
        assert_eq!(channel.endpoint(), "http://127.0.0.1:9000/me/messages");
        assert_eq!(channel.name(), "messenger");
    }
}
