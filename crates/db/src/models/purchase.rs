//! Recorded purchases.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// Default status of a freshly recorded purchase.
pub const PURCHASE_STATUS_COMPLETED: &str = "completed";

/// A row from the `purchases` table. Only captures the payment processor
/// reported as completed are ever stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Purchase {
    pub id: DbId,
    pub user_id: DbId,
    pub package_name: String,
    pub package_price: Decimal,
    pub consultation_time: Timestamp,
    pub external_order_id: String,
    pub payer_email: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a completed capture.
#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub user_id: DbId,
    pub package_name: String,
    pub package_price: Decimal,
    pub consultation_time: Timestamp,
    pub external_order_id: String,
    pub payer_email: Option<String>,
}
