//! Admin-only handlers for project records.
//!
//! Moving a project into `delivered` is the event that feeds the loyalty
//! engine.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use studio_core::error::CoreError;
use studio_core::project_status::ProjectStatus;
use studio_core::types::DbId;
use studio_db::models::loyalty::Loyalty;
use studio_db::models::project::{CreateProject, Project};
use studio_db::models::voucher::Voucher;
use studio_db::repositories::{ProjectRepo, UserRepo};

use crate::engine::loyalty;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest project title accepted.
const MAX_TITLE_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/projects`.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub user_id: DbId,
    pub title: String,
    pub package_name: Option<String>,
}

/// Request body for `PUT /admin/projects/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Result of a status change.
#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub project: Project,
    pub previous_status: String,
    /// Updated counter when this change completed the project.
    pub loyalty: Option<Loyalty>,
    pub vouchers_granted: Vec<Voucher>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/projects
pub async fn create_project(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let title = input.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Title must be between 1 and {MAX_TITLE_LEN} characters"
        ))));
    }

    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: input.user_id,
        }))?;

    let create = CreateProject {
        user_id: input.user_id,
        title: title.to_string(),
        package_name: input
            .package_name
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    };
    let project = ProjectRepo::create(&state.pool, &create).await?;

    tracing::info!(
        project_id = project.id,
        user_id = project.user_id,
        admin_id = admin.user_id,
        "Project created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// PUT /api/v1/admin/projects/{id}/status
///
/// The status change and the loyalty increment commit together. Milestone
/// rewards are granted after the commit and never fail this request.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(project_id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<StatusUpdate>>> {
    let status = ProjectStatus::parse(input.status.trim())?;

    let mut tx = state.pool.begin().await?;
    let change = ProjectRepo::update_status(&mut tx, project_id, status)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "project",
            id: project_id,
        }))?;

    let previous = ProjectStatus::parse(&change.previous_status)?;
    let loyalty = if status.completes_project(previous) {
        Some(loyalty::handle_project_completion(&mut tx, change.project.user_id).await?)
    } else {
        None
    };
    tx.commit().await?;

    tracing::info!(
        project_id,
        admin_id = admin.user_id,
        from = %change.previous_status,
        to = status.as_str(),
        "Project status changed",
    );

    let vouchers_granted = match &loyalty {
        Some(l) => loyalty::grant_milestone_rewards(&state.pool, &state.notifier, l).await,
        None => Vec::new(),
    };

    Ok(Json(DataResponse {
        data: StatusUpdate {
            project: change.project,
            previous_status: change.previous_status,
            loyalty,
            vouchers_granted,
        },
    }))
}
