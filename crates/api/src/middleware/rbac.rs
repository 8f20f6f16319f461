//! Role guard for studio staff endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use studio_core::error::CoreError;
use studio_core::roles::ROLE_ADMIN;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// A signed-in studio admin. Clients get 403, visitors 401.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role == ROLE_ADMIN {
            return Ok(RequireAdmin(user));
        }

        tracing::warn!(
            user_id = user.user_id,
            role = %user.role,
            path = %parts.uri.path(),
            "Admin route refused",
        );
        Err(AppError::Core(CoreError::Forbidden(
            "Only studio staff can manage projects".into(),
        )))
    }
}
