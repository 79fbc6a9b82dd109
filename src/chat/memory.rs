//! Per-user conversation memory, persisted through the `Database` trait.

use std::sync::Arc;

use tracing::debug;

use crate::error::DatabaseError;
use crate::llm::{ChatMessage, Role};
use crate::store::{ChatTurn, Database};

/// Conversation memory keyed by user id, so history survives sessions.
pub struct ChatMemory {
    db: Arc<dyn Database>,
}

impl ChatMemory {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// The user's most recent turns as prompt messages, oldest first.
    pub async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DatabaseError> {
        let turns = self.db.chat_history(user_id, limit).await?;
        debug!(user_id, turns = turns.len(), "Loaded conversation history");
        Ok(turns.iter().map(turn_to_message).collect())
    }

    /// The raw turns for a user, oldest first.
    pub async fn turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, DatabaseError> {
        self.db.chat_history(user_id, limit).await
    }

    /// Persist one user/assistant exchange.
    pub async fn record_exchange(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<(), DatabaseError> {
        self.db.append_chat_turn(user_id, "user", user_message).await?;
        self.db
            .append_chat_turn(user_id, "assistant", assistant_message)
            .await
    }

    /// Forget everything for a user.
    pub async fn clear(&self, user_id: &str) -> Result<(), DatabaseError> {
        self.db.clear_chat_history(user_id).await
    }
}

fn turn_to_message(turn: &ChatTurn) -> ChatMessage {
    match turn.role.as_str() {
        "assistant" => ChatMessage {
            role: Role::Assistant,
            content: turn.content.clone(),
        },
        _ => ChatMessage {
            role: Role::User,
            content: turn.content.clone(),
        },
    }
}
