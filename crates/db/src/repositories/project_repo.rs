//! Repository for the `projects` table.

use sqlx::{PgPool, Postgres, Transaction};
use studio_core::project_status::ProjectStatus;
use studio_core::types::DbId;

use crate::models::project::{CreateProject, Project, StatusChange};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, title, package_name, status, delivered_at, created_at, updated_at";

/// Provides project tracking operations.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in the `intake` status.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, title, package_name, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.package_name)
            .bind(ProjectStatus::Intake.as_str())
            .fetch_one(pool)
            .await
    }

    /// List a user's projects, most recently created first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Set a project's status inside an open transaction.
    ///
    /// The row is locked before the update so the returned previous status
    /// is exactly the value this update replaced. Returns `None` if the
    /// project does not exist.
    pub async fn update_status(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<Option<StatusChange>, sqlx::Error> {
        let previous_status: Option<String> =
            sqlx::query_scalar("SELECT status FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        let Some(previous_status) = previous_status else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE projects SET
                status = $2,
                delivered_at = CASE WHEN $2 = 'delivered' THEN COALESCE(delivered_at, NOW())
                                    ELSE delivered_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await?;

        Ok(Some(StatusChange {
            project,
            previous_status,
        }))
    }
}
