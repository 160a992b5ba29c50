//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use messenger_bridge::api::{self, ApiState};
use messenger_bridge::completion::{ChatChoice, ChatRequest, ChatResponse, ChoiceMessage};
use messenger_bridge::{
    Bridge, Channel, ChatApi, CompletionClient, ConversationRepo, DbPool, Error, OutgoingMessage,
    db,
};
use secrecy::SecretString;
use tokio::net::TcpListener;

/// Verify token configured on test routers
pub const VERIFY_TOKEN: &str = "test-verify-token";

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// What the mock completion backend answers
#[derive(Clone)]
pub enum MockReply {
    Text(String),
    NoChoices,
    Fail,
}

/// Completion backend that records every request
pub struct MockChatApi {
    reply: MockReply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatApi {
    pub fn new(reply: MockReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(MockReply::Text(text.to_string()))
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn complete(&self, request: &ChatRequest) -> messenger_bridge::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            MockReply::Text(text) => Ok(ChatResponse {
                choices: vec![ChatChoice {
                    message: ChoiceMessage {
                        content: Some(text.clone()),
                    },
                }],
            }),
            MockReply::NoChoices => Ok(ChatResponse::default()),
            MockReply::Fail => Err(Error::Completion("connection reset".to_string())),
        }
    }
}

/// Channel that records sent messages instead of delivering them
#[derive(Default)]
pub struct MockChannel {
    pub fail: bool,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, message: OutgoingMessage) -> messenger_bridge::Result<()> {
        self.sent.lock().unwrap().push(message);
        if self.fail {
            Err(Error::Channel("Messenger API error: 400 Bad Request".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Build a test API router around mock backends
pub fn build_test_router(db: DbPool, api: Arc<MockChatApi>, channel: Arc<MockChannel>) -> Router {
    let bridge = Bridge::new(
        ConversationRepo::new(db.clone()),
        CompletionClient::new(api),
        channel,
    );
    let state = ApiState::new(db, SecretString::from(VERIFY_TOKEN.to_string()), bridge);
    api::router(Arc::new(state))
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server failed");
    });

    format!("http://{addr}")
}

/// A page delivery with one text message
pub fn page_message(sender_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "page",
        "entry": [{
            "id": "PAGE_ID",
            "time": 1_700_000_000_000_i64,
            "messaging": [{
                "sender": {"id": sender_id},
                "recipient": {"id": "PAGE_ID"},
                "timestamp": 1_700_000_000_000_i64,
                "message": {"mid": "m_1", "text": text}
            }]
        }]
    })
}
