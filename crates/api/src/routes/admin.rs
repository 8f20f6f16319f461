//! Route definitions for admin project management.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. All require the admin role.
///
/// ```text
/// POST /projects               -> create_project
/// PUT  /projects/{id}/status   -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", post(admin::create_project))
        .route("/projects/{id}/status", put(admin::update_status))
}
