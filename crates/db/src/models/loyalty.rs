//! Per-user loyalty counters.

use serde::Serialize;
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `loyalty` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Loyalty {
    pub id: DbId,
    pub user_id: DbId,
    pub projects_completed: i32,
    pub referrals_completed: i32,
    pub last_project_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
