//! Reward rules.

use serde::Serialize;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `promotions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Promotion {
    pub id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub promotion_type: String,
    pub name: String,
    pub project_milestone_count: Option<i32>,
    pub voucher_code_prefix: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
