//! Website assistant: conversation storage, model calls, and transcripts.
//!
//! Conversations live in Postgres with a sliding expiry rather than in
//! process memory, so any server instance can continue any conversation.

use chrono::Utc;
use sqlx::PgPool;
use studio_assistant::{ChatModel, ModelRole, ModelTurn, STUDIO_SYSTEM_PROMPT};
use studio_db::models::conversation::{ChatRole, ChatTurn, Conversation, ConversationOwner};
use studio_db::repositories::ConversationRepo;
use studio_events::{DeliveryOutcome, Notification, NotificationDispatcher, TranscriptLine};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Prior turns replayed to the model on each call.
pub const MAX_HISTORY_TURNS: usize = 40;

/// Longest client-supplied conversation id accepted.
const MAX_CONVERSATION_ID_LEN: usize = 64;

/// Name used in transcripts when the visitor gave none.
const ANONYMOUS_VISITOR: &str = "Anonymous";

/// Postgres-backed conversation store with a sliding TTL.
#[derive(Clone)]
pub struct ConversationStore {
    pool: PgPool,
    ttl: chrono::Duration,
}

impl ConversationStore {
    pub fn new(pool: PgPool, ttl_hours: i64) -> Self {
        Self {
            pool,
            ttl: chrono::Duration::hours(ttl_hours),
        }
    }

    /// Live conversation by id, if any.
    pub async fn load(&self, conversation_id: &str) -> AppResult<Option<Conversation>> {
        Ok(ConversationRepo::find_active(&self.pool, conversation_id).await?)
    }

    /// Append turns and push the expiry out by one TTL from now.
    pub async fn append(
        &self,
        conversation_id: &str,
        owner: &ConversationOwner,
        turns: &[ChatTurn],
    ) -> AppResult<Conversation> {
        let expires_at = Utc::now() + self.ttl;
        Ok(ConversationRepo::append_turns(&self.pool, conversation_id, owner, turns, expires_at).await?)
    }

    /// Claim the right to send the transcript. `false` if already sent.
    pub async fn claim_transcript(&self, conversation_id: &str) -> AppResult<bool> {
        Ok(ConversationRepo::mark_email_sent(&self.pool, conversation_id).await?)
    }

    pub async fn release_transcript(&self, conversation_id: &str) -> AppResult<()> {
        Ok(ConversationRepo::release_email_claim(&self.pool, conversation_id).await?)
    }
}

/// Assistant reply to one visitor message.
#[derive(Debug)]
pub struct ChatReply {
    pub conversation_id: String,
    pub reply: String,
    pub message_count: usize,
}

/// Outcome of ending a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptOutcome {
    Sent,
    AlreadySent,
}

/// Use the client's conversation id when well formed, else mint a new one.
pub fn resolve_conversation_id(requested: Option<&str>) -> AppResult<String> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => {
            let well_formed = id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if id.len() > MAX_CONVERSATION_ID_LEN || !well_formed {
                return Err(AppError::BadRequest("Conversation id is malformed".into()));
            }
            Ok(id.to_string())
        }
        None => Ok(format!("conv_{}", Uuid::new_v4().simple())),
    }
}

/// Map stored turns to model history, keeping only the most recent ones.
pub fn model_history(turns: &[ChatTurn]) -> Vec<ModelTurn> {
    let skip = turns.len().saturating_sub(MAX_HISTORY_TURNS);
    turns
        .iter()
        .skip(skip)
        .map(|turn| ModelTurn {
            role: match turn.role {
                ChatRole::User => ModelRole::User,
                ChatRole::Assistant => ModelRole::Model,
            },
            text: turn.content.clone(),
        })
        .collect()
}

/// Send a visitor message to the model and persist both sides of the
/// exchange.
///
/// The model is called before anything is written, so a failed call leaves
/// the stored conversation unchanged.
pub async fn send_message(
    store: &ConversationStore,
    model: &dyn ChatModel,
    conversation_id: String,
    owner: &ConversationOwner,
    message: &str,
) -> AppResult<ChatReply> {
    let history = store
        .load(&conversation_id)
        .await?
        .map(|c| model_history(&c.messages.0))
        .unwrap_or_default();

    let asked_at = Utc::now();
    let reply = model.generate(STUDIO_SYSTEM_PROMPT, &history, message).await?;

    let turns = [
        ChatTurn {
            role: ChatRole::User,
            content: message.to_string(),
            timestamp: asked_at,
        },
        ChatTurn {
            role: ChatRole::Assistant,
            content: reply.clone(),
            timestamp: Utc::now(),
        },
    ];
    let conversation = store.append(&conversation_id, owner, &turns).await?;

    tracing::debug!(
        conversation_id = %conversation_id,
        messages = conversation.messages.0.len(),
        "Chat turn stored",
    );

    Ok(ChatReply {
        conversation_id,
        reply,
        message_count: conversation.messages.0.len(),
    })
}

/// Email the transcript of a live conversation to the studio inbox.
///
/// The send is claimed first so concurrent calls deliver at most once; the
/// claim is released again if delivery fails.
pub async fn end_conversation(
    store: &ConversationStore,
    notifier: &NotificationDispatcher,
    inbox: &str,
    conversation_id: &str,
) -> AppResult<TranscriptOutcome> {
    let conversation = store
        .load(conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found or expired".into()))?;

    if conversation.messages.0.is_empty() {
        return Err(AppError::BadRequest("Conversation has no messages".into()));
    }

    if !store.claim_transcript(conversation_id).await? {
        return Ok(TranscriptOutcome::AlreadySent);
    }

    let notification = transcript(&conversation, inbox);
    match notifier.send_now(&notification).await {
        DeliveryOutcome::Delivered => {
            tracing::info!(
                conversation_id,
                messages = conversation.messages.0.len(),
                "Chat transcript sent",
            );
            Ok(TranscriptOutcome::Sent)
        }
        DeliveryOutcome::Failed(reason) => {
            store.release_transcript(conversation_id).await?;
            Err(AppError::Gateway(format!("transcript delivery failed: {reason}")))
        }
    }
}

fn transcript(conversation: &Conversation, inbox: &str) -> Notification {
    let visitor = conversation
        .user_name
        .as_deref()
        .unwrap_or(ANONYMOUS_VISITOR);
    let lines: Vec<TranscriptLine> = conversation
        .messages
        .0
        .iter()
        .map(|turn| TranscriptLine {
            speaker: match turn.role {
                ChatRole::User => visitor.to_string(),
                ChatRole::Assistant => "Assistant".to_string(),
            },
            at: turn.timestamp,
            text: turn.content.clone(),
        })
        .collect();
    Notification::chat_transcript(
        inbox,
        &conversation.conversation_id,
        visitor,
        conversation.user_email.as_deref(),
        &lines,
    )
}
