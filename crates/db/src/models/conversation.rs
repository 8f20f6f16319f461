//! Persisted assistant conversations.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a conversation, stored inside the `messages` JSONB array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: Timestamp,
}

/// A row from the `chat_conversations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub conversation_id: String,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub messages: Json<Vec<ChatTurn>>,
    pub expires_at: Timestamp,
    pub email_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Visitor details attached to a conversation when it is first stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationOwner {
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}
