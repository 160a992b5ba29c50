//! Conversation repository
//!
//! Append-only log of (user message, assistant response) pairs keyed by the
//! platform sender id. Turns are never updated or deleted.

use rusqlite::{Row, params};
use serde::Serialize;

use super::DbPool;
use crate::{Error, Result};

/// One exchange between a user and the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub user_message: String,
    pub assistant_response: String,
}

impl ConversationTurn {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            user_message: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            assistant_response: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        })
    }
}

/// Conversation repository
#[derive(Clone)]
pub struct ConversationRepo {
    pool: DbPool,
}

impl ConversationRepo {
    /// Create a new conversation repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record one exchange
    ///
    /// Content is stored as given; empty strings are accepted.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn append(&self, user_id: &str, message: &str, response: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO chat_history (user_id, user_message, assistant_response)
             VALUES (?1, ?2, ?3)",
            [user_id, message, response],
        )?;

        tracing::debug!(user_id, "stored conversation turn");
        Ok(())
    }

    /// All turns for a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn history(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT user_id, user_message, assistant_response
             FROM chat_history WHERE user_id = ?1 ORDER BY rowid ASC",
        )?;

        let turns = stmt
            .query_map([user_id], ConversationTurn::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(turns)
    }

    /// The last `limit` turns for a user, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            "SELECT user_id, user_message, assistant_response
             FROM chat_history WHERE user_id = ?1 ORDER BY rowid DESC LIMIT ?2",
        )?;

        let mut turns = stmt
            .query_map(params![user_id, limit], ConversationTurn::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        turns.reverse();

        Ok(turns)
    }

    /// Number of stored turns for a user
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self, user_id: &str) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chat_history WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or_default())
    }
}
