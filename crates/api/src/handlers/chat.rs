//! Handlers for the website assistant under `/chat`.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use studio_core::validation::{normalize_email, normalize_name, validate_chat_message};
use studio_db::models::conversation::{ChatTurn, ConversationOwner};
use studio_db::repositories::UserRepo;

use crate::engine::chat::{self, TranscriptOutcome};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::client_key::ClientKey;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /chat/message`.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub conversation_id: String,
    pub reply: String,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<ChatTurn>,
}

/// Request body for `POST /chat/end`.
#[derive(Debug, Deserialize)]
pub struct EndRequest {
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub sent: bool,
    pub already_sent: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/chat/message
pub async fn message(
    State(state): State<AppState>,
    ClientKey(client): ClientKey,
    MaybeAuthUser(auth): MaybeAuthUser,
    Json(input): Json<MessageRequest>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let message = validate_chat_message(&input.message)?;
    state.chat_limiter.enforce(&client).await?;

    let conversation_id = chat::resolve_conversation_id(input.conversation_id.as_deref())?;

    let mut owner = ConversationOwner {
        user_id: None,
        user_name: normalize_name(input.user_name.as_deref())?,
        user_email: match input.user_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => Some(normalize_email(email)?),
            _ => None,
        },
    };
    if let Some(auth) = auth {
        if let Some(user) = UserRepo::find_by_id(&state.pool, auth.user_id).await? {
            owner.user_id = Some(user.id);
            owner.user_name = owner.user_name.or(user.name);
            owner.user_email = Some(user.email);
        }
    }

    let reply = chat::send_message(
        &state.conversations(),
        state.chat_model.as_ref(),
        conversation_id,
        &owner,
        &message,
    )
    .await?;

    Ok(Json(DataResponse {
        data: MessageResponse {
            conversation_id: reply.conversation_id,
            reply: reply.reply,
            message_count: reply.message_count,
        },
    }))
}

/// GET /api/v1/chat/history/{conversation_id}
///
/// Conversations owned by an account are only visible to that account.
pub async fn history(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Path(conversation_id): Path<String>,
) -> AppResult<Json<DataResponse<HistoryResponse>>> {
    let not_found = || AppError::NotFound("Conversation not found or expired".into());

    let conversation = state
        .conversations()
        .load(&conversation_id)
        .await?
        .ok_or_else(not_found)?;

    if let Some(owner_id) = conversation.user_id {
        if auth.map(|a| a.user_id) != Some(owner_id) {
            return Err(not_found());
        }
    }

    Ok(Json(DataResponse {
        data: HistoryResponse {
            conversation_id: conversation.conversation_id,
            messages: conversation.messages.0,
        },
    }))
}

/// POST /api/v1/chat/end
///
/// Email the transcript to the studio inbox. Ending twice sends once.
pub async fn end(
    State(state): State<AppState>,
    Json(input): Json<EndRequest>,
) -> AppResult<Json<DataResponse<EndResponse>>> {
    let outcome = chat::end_conversation(
        &state.conversations(),
        &state.notifier,
        &state.config.studio_inbox,
        input.conversation_id.trim(),
    )
    .await?;

    Ok(Json(DataResponse {
        data: EndResponse {
            sent: outcome == TranscriptOutcome::Sent,
            already_sent: outcome == TranscriptOutcome::AlreadySent,
        },
    }))
}
