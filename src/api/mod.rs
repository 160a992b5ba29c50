//! HTTP API server for the messenger bridge

pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::Router;
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::bridge::Bridge;
use crate::channels::MessengerChannel;
use crate::completion::{CompletionClient, OpenAiApi};
use crate::config::Config;
use crate::db::{self, ConversationRepo, DbPool};

/// Shared state for API handlers
pub struct ApiState {
    pub db: DbPool,
    /// Shared secret expected in `hub.verify_token`
    pub verify_token: SecretString,
    pub bridge: Bridge,
}

impl ApiState {
    /// Create API state from already-built components
    #[must_use]
    pub const fn new(db: DbPool, verify_token: SecretString, bridge: Bridge) -> Self {
        Self {
            db,
            verify_token,
            bridge,
        }
    }

    /// Wire up the database, completion backend and Messenger channel
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = db::init(&config.database_path)?;

        let api = OpenAiApi::with_base_url(
            SecretString::from(config.openai_api_key.expose_secret().to_owned()),
            config.llm.base_url.clone(),
        );
        let completion = CompletionClient::new(Arc::new(api))
            .model(config.llm.model.clone())
            .persona(config.persona.clone())
            .history_window(config.llm.history_window);

        let channel = MessengerChannel::with_graph_url(
            SecretString::from(config.page_access_token.expose_secret().to_owned()),
            config.graph_api_url.clone(),
        );

        let bridge = Bridge::new(
            ConversationRepo::new(db.clone()),
            completion,
            Arc::new(channel),
        );

        Ok(Self::new(
            db,
            SecretString::from(config.verify_token.expose_secret().to_owned()),
            bridge,
        ))
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(webhooks::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server around prepared state
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Create a server from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened
    pub fn from_config(config: &Config) -> Result<Self> {
        let state = ApiState::from_config(config)?;
        Ok(Self::new(Arc::new(state), config.port))
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
