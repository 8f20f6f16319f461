//! Repository for the `promotions` table.

use sqlx::PgPool;
use studio_core::loyalty::PROMOTION_TYPE_PROJECT_MILESTONE;

use crate::models::promotion::Promotion;

const COLUMNS: &str = "id, type, name, project_milestone_count, voucher_code_prefix, \
                       description, is_active, created_at, updated_at";

pub struct PromotionRepo;

impl PromotionRepo {
    /// Active project-milestone promotions whose threshold equals `count`,
    /// in ascending id order.
    pub async fn find_active_milestones(
        pool: &PgPool,
        count: i32,
    ) -> Result<Vec<Promotion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM promotions
             WHERE type = $1 AND project_milestone_count = $2 AND is_active
             ORDER BY id"
        );
        sqlx::query_as::<_, Promotion>(&query)
            .bind(PROMOTION_TYPE_PROJECT_MILESTONE)
            .bind(count)
            .fetch_all(pool)
            .await
    }

    /// All active promotions, lowest threshold first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Promotion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM promotions
             WHERE is_active
             ORDER BY project_milestone_count NULLS LAST, id"
        );
        sqlx::query_as::<_, Promotion>(&query).fetch_all(pool).await
    }
}
