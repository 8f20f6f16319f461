//! Repository for the `vouchers` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::voucher::{CreateVoucher, Voucher};

const COLUMNS: &str = "id, user_id, promotion_id, milestone_count, code, description, \
                       expires_at, is_redeemed, redeemed_at, created_at, updated_at";

pub struct VoucherRepo;

impl VoucherRepo {
    /// Issue a voucher.
    ///
    /// Returns `None` if this promotion was already granted to the user at
    /// the same milestone count.
    pub async fn create(pool: &PgPool, input: &CreateVoucher) -> Result<Option<Voucher>, sqlx::Error> {
        let query = format!(
            "INSERT INTO vouchers
                (user_id, promotion_id, milestone_count, code, description, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id, promotion_id, milestone_count) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Voucher>(&query)
            .bind(input.user_id)
            .bind(input.promotion_id)
            .bind(input.milestone_count)
            .bind(&input.code)
            .bind(&input.description)
            .bind(input.expires_at)
            .fetch_optional(pool)
            .await
    }

    /// Vouchers the user can still redeem (not redeemed, not expired),
    /// newest first.
    pub async fn list_unredeemed_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Voucher>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vouchers
             WHERE user_id = $1 AND NOT is_redeemed AND expires_at > NOW()
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Voucher>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every voucher ever issued to the user, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Voucher>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vouchers WHERE user_id = $1 ORDER BY id");
        sqlx::query_as::<_, Voucher>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
