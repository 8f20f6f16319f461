//! Handlers for the `/payments` resource (checkout config, orders, capture).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use studio_core::purchase_flow::CaptureContext;
use studio_core::types::Timestamp;
use studio_db::models::purchase::Purchase;
use studio_payments::{Payer, PublicConfig};

use crate::engine::purchase;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /payments/orders`.
///
/// `amount` is kept raw so numbers and numeric strings are both accepted
/// and every malformed value gets the same validation error.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub amount: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub order_id: String,
}

/// Request body for `POST /payments/orders/{order_id}/capture`.
#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub package_name: Option<String>,
    #[serde(default)]
    pub package_price: serde_json::Value,
    pub consultation_time: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub purchase: Purchase,
    pub already_recorded: bool,
    pub payer: Option<Payer>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/payments/config
///
/// Public checkout identifiers. Never includes secrets.
pub async fn config(State(state): State<AppState>) -> Json<DataResponse<PublicConfig>> {
    Json(DataResponse {
        data: state.payments.public_config(),
    })
}

/// POST /api/v1/payments/orders
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedOrder>>)> {
    let order_id = purchase::create_order(&state, &input.amount).await?;
    tracing::debug!(user_id = auth.user_id, order_id = %order_id, "Order opened for user");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedOrder { order_id },
        }),
    ))
}

/// POST /api/v1/payments/orders/{order_id}/capture
///
/// Returns 201 when the purchase is recorded by this call and 200 when the
/// order had already been recorded for the same user.
pub async fn capture_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<String>,
    Json(input): Json<CaptureRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CaptureResponse>>)> {
    let ctx = CaptureContext::from_parts(
        &order_id,
        input.package_name.as_deref(),
        &input.package_price,
        input.consultation_time,
    )?;

    let outcome = purchase::capture_order(&state, auth.user_id, ctx).await?;
    let status = if outcome.already_recorded {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(DataResponse {
            data: CaptureResponse {
                purchase: outcome.purchase,
                already_recorded: outcome.already_recorded,
                payer: outcome.payer,
            },
        }),
    ))
}
