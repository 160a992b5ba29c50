//! Messenger Bridge - answers Messenger page messages with an LLM
//!
//! This library provides the pieces of the bridge:
//! - Page webhook handling (subscription handshake and event delivery)
//! - Chat completion with persona and recent history
//! - Reply delivery through the Messenger Send API
//! - Append-only conversation log in `SQLite`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   POST /webhook   ┌──────────────────────────────┐
//! │  Messenger   │ ────────────────▶ │            Bridge            │
//! │  (platform)  │ ◀──────────────── │  history ▶ generate ▶ send   │
//! └──────────────┘    Send API       │            ▶ append          │
//!                                    └──────┬───────────────┬───────┘
//!                                           │               │
//!                               ┌───────────▼──┐     ┌──────▼───────┐
//!                               │ chat_history │     │ Completion   │
//!                               │   (SQLite)   │     │ API (OpenAI) │
//!                               └──────────────┘     └──────────────┘
//! ```

pub mod api;
pub mod bridge;
pub mod channels;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod persona;

pub use bridge::{Bridge, Outcome};
pub use channels::{Channel, MessengerChannel, OutgoingMessage};
pub use completion::{ChatApi, CompletionClient, OpenAiApi};
pub use config::Config;
pub use db::{ConversationRepo, ConversationTurn, DbConn, DbPool};
pub use error::{Error, Result};
pub use persona::Persona;
