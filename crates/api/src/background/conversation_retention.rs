//! Hourly purge of expired assistant conversations.
//!
//! Expired rows are already invisible to reads; the purge only reclaims
//! space.

use std::time::Duration;

use sqlx::PgPool;
use studio_db::repositories::ConversationRepo;
use tokio_util::sync::CancellationToken;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Delete every expired conversation once. Returns the number removed.
pub async fn purge_once(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let deleted = ConversationRepo::purge_expired(pool).await?;
    if deleted > 0 {
        tracing::info!(deleted, "Expired conversations purged");
    }
    Ok(deleted)
}

/// Purge on every tick until `cancel` fires.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = PURGE_INTERVAL.as_secs(),
        "Conversation retention started"
    );
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = purge_once(&pool).await {
                    tracing::error!(error = %e, "Conversation purge failed");
                }
            }
        }
    }
    tracing::info!("Conversation retention stopped");
}
