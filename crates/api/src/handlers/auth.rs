//! Handlers for the `/auth` resource (signup, login, logout, status).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use studio_core::error::CoreError;
use studio_core::roles::ROLE_CLIENT;
use studio_core::validation::{normalize_email, normalize_name, validate_password};
use studio_db::models::user::{CreateUser, UserResponse};
use studio_db::repositories::UserRepo;
use studio_events::Notification;

use crate::auth::cookie::{cleared_cookie, session_cookie};
use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_against_placeholder, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::client_key::ClientKey;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for `GET /auth/status`.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub user: Option<UserResponse>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create a client account (and its loyalty row) and send a welcome email.
/// Does not sign the user in.
pub async fn signup(
    State(state): State<AppState>,
    ClientKey(client): ClientKey,
    Json(input): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    state.auth_limiter.enforce(&client).await?;

    let email = normalize_email(&input.email)?;
    validate_password(&input.password)?;
    let name = normalize_name(input.name.as_deref())?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create = CreateUser {
        email,
        name,
        password_hash,
        role: ROLE_CLIENT.to_string(),
    };
    let user = UserRepo::create(&state.pool, &create)
        .await
        .map_err(duplicate_email)?;

    tracing::info!(user_id = user.id, "Account created");
    state
        .notifier
        .dispatch(Notification::welcome(&user.email, user.name.as_deref()));

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Verify credentials and set the session cookie.
pub async fn login(
    State(state): State<AppState>,
    ClientKey(client): ClientKey,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    state.auth_limiter.enforce(&client).await?;

    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let email = normalize_email(&input.email).map_err(|_| invalid())?;
    let Some(user) = UserRepo::find_by_email(&state.pool, &email).await? else {
        verify_against_placeholder(&input.password);
        return Err(invalid());
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected");
        return Err(invalid());
    }

    let token = generate_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let cookie = cookie_header(session_cookie(&token, &state.config.jwt))?;

    tracing::info!(user_id = user.id, "Login succeeded");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Expire the session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let cookie = cookie_header(cleared_cookie(&state.config.jwt))?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]))
}

/// GET /api/v1/auth/status
///
/// Report whether the request carries a valid session.
pub async fn status(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
) -> AppResult<Json<DataResponse<SessionStatus>>> {
    let user = match auth {
        Some(auth) => UserRepo::find_by_id(&state.pool, auth.user_id).await?,
        None => None,
    };

    Ok(Json(DataResponse {
        data: SessionStatus {
            authenticated: user.is_some(),
            user: user.as_ref().map(UserResponse::from),
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cookie_header(value: Option<HeaderValue>) -> AppResult<HeaderValue> {
    value.ok_or_else(|| AppError::InternalError("Session cookie is not a valid header".into()))
}

fn duplicate_email(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some("uq_users_email") {
            return AppError::Core(CoreError::Conflict(
                "An account with this email already exists".into(),
            ));
        }
    }
    AppError::Database(err)
}
