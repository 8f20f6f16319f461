//! Liveness probe at `/health` (outside `/api/v1`).

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"` when the ledger answers, `"degraded"` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Payment processor mode (`sandbox`, `live`, or `disabled`).
    pub payments: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = studio_db::health_check(&state.pool).await.is_ok();
    if !db_healthy {
        tracing::warn!("Health check: ledger database unreachable");
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        payments: state.payments.public_config().mode,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
