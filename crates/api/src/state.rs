use std::sync::Arc;

use studio_assistant::ChatModel;
use studio_events::NotificationDispatcher;
use studio_payments::PaymentGateway;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: studio_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Payment processor used by the purchase flow.
    pub payments: Arc<dyn PaymentGateway>,
    /// Outbound email dispatcher.
    pub notifier: NotificationDispatcher,
    /// Generative model behind the chat widget.
    pub chat_model: Arc<dyn ChatModel>,
    /// Per-client limiter for chat messages.
    pub chat_limiter: Arc<RateLimiter>,
    /// Per-client limiter for signup and login attempts.
    pub auth_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Conversation store bound to this state's pool and session TTL.
    pub fn conversations(&self) -> crate::engine::chat::ConversationStore {
        crate::engine::chat::ConversationStore::new(
            self.pool.clone(),
            self.config.chat_session_ttl_hours,
        )
    }
}
