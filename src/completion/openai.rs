//! `OpenAI`-compatible chat completion backend

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{ChatApi, ChatRequest, ChatResponse};
use crate::{Error, Result};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion backend speaking the `OpenAI` REST API
pub struct OpenAiApi {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiApi {
    /// Create a backend against the public `OpenAI` API
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a backend against an `OpenAI`-compatible endpoint
    #[must_use]
    pub fn with_base_url(api_key: SecretString, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatApi for OpenAiApi {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!("API error {status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("invalid response: {e}")))?;

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let api = OpenAiApi::with_base_url(
            SecretString::from("sk-test".to_string()),
            "http://localhost:8080/v1/",
        );
        assert_eq!(api.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn default_endpoint_is_openai() {
        let api = OpenAiApi::new(SecretString::from("sk-test".to_string()));
        assert_eq!(api.endpoint(), "https://api.openai.com/v1/chat/completions");
    }
}
