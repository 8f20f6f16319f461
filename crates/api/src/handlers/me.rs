//! Handlers for the client dashboard under `/me`.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use studio_core::project_status::ProjectStatus;
use studio_core::types::{DbId, Timestamp};
use studio_db::models::purchase::Purchase;
use studio_db::models::voucher::Voucher;
use studio_db::repositories::{LoyaltyRepo, ProjectRepo, PromotionRepo, PurchaseRepo, VoucherRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A project as shown on the dashboard progress tracker.
#[derive(Debug, Serialize)]
pub struct ProjectProgress {
    pub id: DbId,
    pub title: String,
    pub package_name: Option<String>,
    pub status: String,
    pub progress_percent: u8,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// The next reward the client is working toward.
#[derive(Debug, Serialize)]
pub struct NextMilestone {
    pub projects_required: i32,
    pub projects_remaining: i32,
    pub reward: String,
}

/// Loyalty summary for the dashboard.
#[derive(Debug, Serialize)]
pub struct LoyaltySummary {
    pub projects_completed: i32,
    pub referrals_completed: i32,
    pub last_project_completed_at: Option<Timestamp>,
    pub next_milestone: Option<NextMilestone>,
    /// Unredeemed, unexpired vouchers.
    pub vouchers: Vec<Voucher>,
}

/// GET /api/v1/me/purchases
pub async fn purchases(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Purchase>>>> {
    let purchases = PurchaseRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: purchases }))
}

/// GET /api/v1/me/projects
pub async fn projects(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ProjectProgress>>>> {
    let projects = ProjectRepo::list_for_user(&state.pool, auth.user_id).await?;
    let data = projects
        .into_iter()
        .map(|p| {
            // Unknown statuses are excluded by a CHECK constraint.
            let progress_percent = ProjectStatus::parse(&p.status)
                .map(ProjectStatus::progress_percent)
                .unwrap_or_default();
            ProjectProgress {
                id: p.id,
                title: p.title,
                package_name: p.package_name,
                status: p.status,
                progress_percent,
                delivered_at: p.delivered_at,
                created_at: p.created_at,
            }
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/me/loyalty
pub async fn loyalty(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<LoyaltySummary>>> {
    let loyalty = LoyaltyRepo::find_by_user(&state.pool, auth.user_id).await?;
    let projects_completed = loyalty.as_ref().map_or(0, |l| l.projects_completed);

    let next_milestone = PromotionRepo::list_active(&state.pool)
        .await?
        .into_iter()
        .filter_map(|p| p.project_milestone_count.map(|m| (m, p.description)))
        .find(|(m, _)| *m > projects_completed)
        .map(|(m, reward)| NextMilestone {
            projects_required: m,
            projects_remaining: m - projects_completed,
            reward,
        });

    let vouchers = VoucherRepo::list_unredeemed_for_user(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: LoyaltySummary {
            projects_completed,
            referrals_completed: loyalty.as_ref().map_or(0, |l| l.referrals_completed),
            last_project_completed_at: loyalty.and_then(|l| l.last_project_completed_at),
            next_milestone,
            vouchers,
        },
    }))
}
