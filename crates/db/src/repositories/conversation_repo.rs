//! Repository for the `chat_conversations` table.

use sqlx::types::Json;
use sqlx::PgPool;
use studio_core::types::Timestamp;

use crate::models::conversation::{ChatTurn, Conversation, ConversationOwner};

const COLUMNS: &str = "id, conversation_id, user_id, user_name, user_email, messages, \
                       expires_at, email_sent_at, created_at, updated_at";

/// Persistence for assistant conversations.
///
/// Rows whose `expires_at` has passed are treated as absent by every read
/// and are replaced, not extended, by the next append.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Fetch a live conversation by its public identifier.
    pub async fn find_active(
        pool: &PgPool,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chat_conversations
             WHERE conversation_id = $1 AND expires_at > NOW()"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(conversation_id)
            .fetch_optional(pool)
            .await
    }

    /// Append turns to a conversation, creating it on first use, and push
    /// its expiry out to `expires_at`.
    ///
    /// Owner details are only filled in where the stored row has none.
    pub async fn append_turns(
        pool: &PgPool,
        conversation_id: &str,
        owner: &ConversationOwner,
        turns: &[ChatTurn],
        expires_at: Timestamp,
    ) -> Result<Conversation, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_conversations
                (conversation_id, user_id, user_name, user_email, messages, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (conversation_id) DO UPDATE SET
                messages = CASE
                    WHEN chat_conversations.expires_at <= NOW() THEN EXCLUDED.messages
                    ELSE chat_conversations.messages || EXCLUDED.messages
                END,
                email_sent_at = CASE
                    WHEN chat_conversations.expires_at <= NOW() THEN NULL
                    ELSE chat_conversations.email_sent_at
                END,
                user_id = COALESCE(chat_conversations.user_id, EXCLUDED.user_id),
                user_name = COALESCE(chat_conversations.user_name, EXCLUDED.user_name),
                user_email = COALESCE(chat_conversations.user_email, EXCLUDED.user_email),
                expires_at = EXCLUDED.expires_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(conversation_id)
            .bind(owner.user_id)
            .bind(&owner.user_name)
            .bind(&owner.user_email)
            .bind(Json(turns))
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Claim the transcript email for a live conversation.
    ///
    /// Returns `true` for exactly one caller; later calls see the stamp and
    /// return `false`.
    pub async fn mark_email_sent(pool: &PgPool, conversation_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE chat_conversations SET email_sent_at = NOW()
             WHERE conversation_id = $1 AND email_sent_at IS NULL AND expires_at > NOW()",
        )
        .bind(conversation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Undo a claim taken by [`mark_email_sent`](Self::mark_email_sent) after
    /// the transcript failed to send, so the visitor can retry.
    pub async fn release_email_claim(
        pool: &PgPool,
        conversation_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE chat_conversations SET email_sent_at = NULL WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete every conversation past its expiry. Returns the number removed.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chat_conversations WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
