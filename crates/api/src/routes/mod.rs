pub mod admin;
pub mod auth;
pub mod chat;
pub mod health;
pub mod me;
pub mod payments;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                          create account (public)
/// /auth/login                           sign in, sets session cookie (public)
/// /auth/logout                          clear session cookie
/// /auth/status                          session check
///
/// /payments/config                      public checkout identifiers
/// /payments/orders                      create order (auth)
/// /payments/orders/{order_id}/capture   capture and record purchase (auth)
///
/// /me/purchases                         purchase history (auth)
/// /me/projects                          project progress (auth)
/// /me/loyalty                           loyalty counter and vouchers (auth)
///
/// /admin/projects                       create project (admin)
/// /admin/projects/{id}/status           change status, feeds loyalty (admin)
///
/// /chat/message                         assistant turn (public, rate limited)
/// /chat/history/{conversation_id}       stored turns
/// /chat/end                             email transcript to the studio
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/payments", payments::router())
        .nest("/me", me::router())
        .nest("/admin", admin::router())
        .nest("/chat", chat::router())
}
