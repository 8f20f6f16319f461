//! Route definitions for the `/payments` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// GET  /config                     -> config (public)
/// POST /orders                     -> create_order (auth)
/// POST /orders/{order_id}/capture  -> capture_order (auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(payments::config))
        .route("/orders", post(payments::create_order))
        .route("/orders/{order_id}/capture", post(payments::capture_order))
}
