//! Studio project model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_core::types::{DbId, Timestamp};

/// A row from the `projects` table. `status` holds a
/// [`studio_core::project_status::ProjectStatus`] string.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub package_name: Option<String>,
    pub status: String,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for opening a new project on behalf of a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub user_id: DbId,
    pub title: String,
    pub package_name: Option<String>,
}

/// Result of a status change: the row after the update plus the status it
/// held immediately before, read under the same row lock.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub project: Project,
    pub previous_status: String,
}
