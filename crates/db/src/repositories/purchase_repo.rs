//! Repository for the `purchases` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::purchase::{CreatePurchase, Purchase, PURCHASE_STATUS_COMPLETED};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, package_name, package_price, consultation_time, \
                       external_order_id, payer_email, status, created_at, updated_at";

/// Provides ledger operations for purchases.
pub struct PurchaseRepo;

impl PurchaseRepo {
    /// Record a completed capture.
    ///
    /// Returns `None` when a purchase for the same external order already
    /// exists; the existing row is left untouched.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePurchase,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let query = format!(
            "INSERT INTO purchases
                (user_id, package_name, package_price, consultation_time,
                 external_order_id, payer_email, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (external_order_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Purchase>(&query)
            .bind(input.user_id)
            .bind(&input.package_name)
            .bind(input.package_price)
            .bind(input.consultation_time)
            .bind(&input.external_order_id)
            .bind(&input.payer_email)
            .bind(PURCHASE_STATUS_COMPLETED)
            .fetch_optional(pool)
            .await
    }

    /// Find the purchase recorded for a processor order, if any.
    pub async fn find_by_external_order_id(
        pool: &PgPool,
        external_order_id: &str,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchases WHERE external_order_id = $1");
        sqlx::query_as::<_, Purchase>(&query)
            .bind(external_order_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's purchases, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Purchase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM purchases WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Purchase>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
