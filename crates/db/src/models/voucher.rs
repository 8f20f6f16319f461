//! Reward vouchers issued to users.

use serde::Serialize;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `vouchers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Voucher {
    pub id: DbId,
    pub user_id: DbId,
    pub promotion_id: DbId,
    pub milestone_count: i32,
    pub code: String,
    pub description: String,
    pub expires_at: Timestamp,
    pub is_redeemed: bool,
    pub redeemed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for issuing a voucher.
#[derive(Debug, Clone)]
pub struct CreateVoucher {
    pub user_id: DbId,
    pub promotion_id: DbId,
    pub milestone_count: i32,
    pub code: String,
    pub description: String,
    pub expires_at: Timestamp,
}
