//! Repository for the `loyalty` table.

use sqlx::{PgPool, Postgres, Transaction};
use studio_core::types::DbId;

use crate::models::loyalty::Loyalty;

const COLUMNS: &str = "id, user_id, projects_completed, referrals_completed, \
                       last_project_completed_at, created_at, updated_at";

pub struct LoyaltyRepo;

impl LoyaltyRepo {
    /// Fetch the loyalty row for a user.
    pub async fn find_by_user(pool: &PgPool, user_id: DbId) -> Result<Option<Loyalty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loyalty WHERE user_id = $1");
        sqlx::query_as::<_, Loyalty>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a zeroed loyalty row if the user does not have one yet.
    pub async fn ensure_for_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO loyalty (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Add one completed project to the user's counter and return the row
    /// as it stands after the increment.
    ///
    /// This is a single upsert statement: concurrent completions for the
    /// same user serialise on the row lock, so each caller observes a
    /// distinct post-increment value. A missing row is created with a count
    /// of one.
    pub async fn record_project_completion(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
    ) -> Result<Loyalty, sqlx::Error> {
        let query = format!(
            "INSERT INTO loyalty (user_id, projects_completed, last_project_completed_at)
             VALUES ($1, 1, NOW())
             ON CONFLICT (user_id) DO UPDATE SET
                projects_completed = loyalty.projects_completed + 1,
                last_project_completed_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Loyalty>(&query)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }
}
