//! Purchase flow controller: order creation and capture.
//!
//! Capture is at-most-once-record: the `external_order_id` unique key
//! guards the ledger, and a replayed capture for an already recorded order
//! never reaches the processor again. A capture is only recorded when the
//! processor's captured amount equals the package price.

use studio_core::error::CoreError;
use studio_core::money;
use studio_core::purchase_flow::CaptureContext;
use studio_core::types::DbId;
use studio_db::models::purchase::{CreatePurchase, Purchase};
use studio_db::repositories::{PurchaseRepo, UserRepo};
use studio_events::{DeliveryHandle, Notification};
use studio_payments::Payer;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Result of a capture request.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub purchase: Purchase,
    /// `true` when the order had been recorded by an earlier request.
    pub already_recorded: bool,
    /// Buyer identity reported by the processor (absent on replays).
    pub payer: Option<Payer>,
    /// In-flight confirmation email, if one was sent.
    pub confirmation: Option<DeliveryHandle>,
}

/// Validate `raw_amount` and open an order with the processor.
///
/// Invalid amounts are rejected before any external call.
pub async fn create_order(state: &AppState, raw_amount: &serde_json::Value) -> AppResult<String> {
    let amount = money::parse_amount(raw_amount)?;
    let order_id = state.payments.create_order(amount).await?;
    tracing::info!(order_id = %order_id, amount = %amount, "Payment order created");
    Ok(order_id)
}

/// Capture an approved order and record exactly one purchase for it.
pub async fn capture_order(
    state: &AppState,
    user_id: DbId,
    ctx: CaptureContext,
) -> AppResult<CaptureOutcome> {
    if let Some(existing) = PurchaseRepo::find_by_external_order_id(&state.pool, &ctx.order_id).await? {
        return replay(existing, user_id);
    }

    let capture = state.payments.capture_order(&ctx.order_id).await?;
    if !capture.status.is_completed() {
        tracing::warn!(
            order_id = %ctx.order_id,
            user_id,
            status = capture.status.as_str(),
            "Capture did not complete",
        );
        return Err(AppError::PaymentIncomplete {
            status: capture.status.as_str().to_string(),
        });
    }

    if capture.captured_amount != Some(ctx.package.price) {
        tracing::error!(
            target: "payment_alert",
            order_id = %ctx.order_id,
            user_id,
            expected = %money::format_amount(ctx.package.price),
            captured = ?capture.captured_amount,
            "Captured amount does not match package price",
        );
        return Err(AppError::CaptureAmountMismatch {
            order_id: ctx.order_id,
        });
    }

    let input = CreatePurchase {
        user_id,
        package_name: ctx.package.name.clone(),
        package_price: ctx.package.price,
        consultation_time: ctx.consultation_time,
        external_order_id: ctx.order_id.clone(),
        payer_email: capture.payer.email.clone(),
    };

    let purchase = match PurchaseRepo::create(&state.pool, &input).await {
        Ok(Some(purchase)) => purchase,
        // A concurrent request recorded the same order first.
        Ok(None) => {
            let existing = PurchaseRepo::find_by_external_order_id(&state.pool, &ctx.order_id)
                .await?
                .ok_or_else(|| AppError::CaptureNotRecorded {
                    order_id: ctx.order_id.clone(),
                })?;
            return replay(existing, user_id);
        }
        Err(e) => {
            tracing::error!(
                target: "payment_alert",
                order_id = %ctx.order_id,
                user_id,
                amount = %money::format_amount(ctx.package.price),
                error = %e,
                "Payment captured but purchase was not recorded",
            );
            return Err(AppError::CaptureNotRecorded {
                order_id: ctx.order_id,
            });
        }
    };

    tracing::info!(
        purchase_id = purchase.id,
        order_id = %purchase.external_order_id,
        user_id,
        "Purchase recorded",
    );

    let confirmation = confirmation_recipient(state, user_id, &capture.payer)
        .await
        .map(|to| {
            state.notifier.dispatch(Notification::purchase_confirmation(
                &to,
                &purchase.package_name,
                purchase.package_price,
                purchase.consultation_time,
                &purchase.external_order_id,
            ))
        });

    Ok(CaptureOutcome {
        purchase,
        already_recorded: false,
        payer: Some(capture.payer),
        confirmation,
    })
}

fn replay(existing: Purchase, user_id: DbId) -> AppResult<CaptureOutcome> {
    if existing.user_id != user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "This order has already been recorded".into(),
        )));
    }
    tracing::info!(
        purchase_id = existing.id,
        order_id = %existing.external_order_id,
        user_id,
        "Capture replayed for recorded order",
    );
    Ok(CaptureOutcome {
        purchase: existing,
        already_recorded: true,
        payer: None,
        confirmation: None,
    })
}

/// The account email, falling back to the processor's payer email.
async fn confirmation_recipient(state: &AppState, user_id: DbId, payer: &Payer) -> Option<String> {
    match UserRepo::find_by_id(&state.pool, user_id).await {
        Ok(Some(user)) => Some(user.email),
        Ok(None) => payer.email.clone(),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Could not load user for confirmation email");
            payer.email.clone()
        }
    }
}
