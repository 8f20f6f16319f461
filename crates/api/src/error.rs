use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use studio_assistant::ChatModelError;
use studio_core::error::CoreError;
use studio_payments::PaymentError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `studio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The payment processor rejected or failed a call.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// The AI chat service failed.
    #[error(transparent)]
    Assistant(#[from] ChatModelError),

    /// Any other external service (email) failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// The processor reported a capture status other than `COMPLETED`.
    #[error("Payment not completed (status: {status})")]
    PaymentIncomplete { status: String },

    /// Money was captured by the processor but the local record failed.
    #[error("Captured order {order_id} was not recorded")]
    CaptureNotRecorded { order_id: String },

    /// The processor captured a different amount than the package price.
    #[error("Captured amount for order {order_id} does not match the package price")]
    CaptureAmountMismatch { order_id: String },

    /// The client exceeded a rate limit.
    #[error("Rate limited; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// A resource addressed by a non-numeric key does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- External services ---
            AppError::Payment(err) => classify_payment_error(err),
            AppError::Assistant(err) => {
                tracing::error!(error = %err, "Chat model error");
                let message = if err.is_quota() {
                    "The assistant is busy right now. Please try again in a minute."
                } else {
                    "The assistant is unavailable right now. Please try again later."
                };
                (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR", message.to_string())
            }
            AppError::Gateway(msg) => {
                tracing::error!(error = %msg, "Gateway error");
                (
                    StatusCode::BAD_GATEWAY,
                    "GATEWAY_ERROR",
                    "An external service is unavailable. Please try again.".to_string(),
                )
            }

            // --- Purchase outcomes ---
            AppError::PaymentIncomplete { status } => (
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_INCOMPLETE",
                format!("Payment was not completed (status: {status})"),
            ),
            AppError::CaptureNotRecorded { order_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CAPTURE_NOT_RECORDED",
                format!(
                    "Your payment was received but could not be recorded. \
                     Please contact support with order {order_id}."
                ),
            ),

            AppError::CaptureAmountMismatch { order_id } => (
                StatusCode::CONFLICT,
                "CAPTURE_AMOUNT_MISMATCH",
                format!(
                    "The amount paid does not match the package price. \
                     Please contact support with order {order_id}."
                ),
            ),

            // --- HTTP-specific errors ---
            AppError::RateLimited { retry_after_secs } => {
                let body = json!({
                    "error": "Too many requests. Please slow down.",
                    "code": "RATE_LIMITED",
                    "retry_after": retry_after_secs,
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
                return response;
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a payment gateway error.
///
/// Amount validation failures are the caller's fault (400). Everything else
/// is an upstream failure the client may retry (502).
fn classify_payment_error(err: &PaymentError) -> (StatusCode, &'static str, String) {
    match err {
        PaymentError::InvalidAmount(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        other => {
            tracing::error!(error = %other, "Payment gateway error");
            (
                StatusCode::BAD_GATEWAY,
                "GATEWAY_ERROR",
                "The payment service is unavailable. Please try again.".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
