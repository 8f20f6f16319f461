//! Route definitions for the client dashboard.

use axum::routing::get;
use axum::Router;

use crate::handlers::me;
use crate::state::AppState;

/// Routes mounted at `/me`. All require a session.
///
/// ```text
/// GET /purchases  -> purchases
/// GET /projects   -> projects
/// GET /loyalty    -> loyalty
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(me::purchases))
        .route("/projects", get(me::projects))
        .route("/loyalty", get(me::loyalty))
}
