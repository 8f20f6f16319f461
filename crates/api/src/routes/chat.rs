//! Route definitions for the website assistant.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;

/// Routes mounted at `/chat`. Open to visitors.
///
/// ```text
/// POST /message                     -> message (rate limited)
/// GET  /history/{conversation_id}   -> history
/// POST /end                         -> end
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/message", post(chat::message))
        .route("/history/{conversation_id}", get(chat::history))
        .route("/end", post(chat::end))
}
