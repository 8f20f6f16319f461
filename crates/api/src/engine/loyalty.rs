//! Loyalty engine: project completions and milestone vouchers.
//!
//! The counter increment runs inside the caller's transaction so it commits
//! together with the project status change. Rewards are granted after the
//! commit and never fail the triggering request.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use studio_core::loyalty::{milestone_reached, voucher_code, voucher_expiry};
use studio_core::types::DbId;
use studio_db::models::loyalty::Loyalty;
use studio_db::models::promotion::Promotion;
use studio_db::models::voucher::{CreateVoucher, Voucher};
use studio_db::repositories::{LoyaltyRepo, PromotionRepo, UserRepo, VoucherRepo};
use studio_events::{Notification, NotificationDispatcher};

/// Atomically add one completed project to the user's counter and return
/// the updated row.
pub async fn handle_project_completion(
    tx: &mut Transaction<'_, Postgres>,
    user_id: DbId,
) -> Result<Loyalty, sqlx::Error> {
    let loyalty = LoyaltyRepo::record_project_completion(tx, user_id).await?;
    tracing::info!(
        user_id,
        projects_completed = loyalty.projects_completed,
        "Project completion recorded",
    );
    Ok(loyalty)
}

/// Grant every active promotion whose milestone equals the counter value.
///
/// Promotions are granted in ascending id order. Failures are logged as
/// reconciliation items and skipped.
pub async fn grant_milestone_rewards(
    pool: &PgPool,
    notifier: &NotificationDispatcher,
    loyalty: &Loyalty,
) -> Vec<Voucher> {
    let user_id = loyalty.user_id;
    let count = loyalty.projects_completed;

    let promotions = match PromotionRepo::find_active_milestones(pool, count).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(
                target: "reconciliation",
                user_id,
                projects_completed = count,
                error = %e,
                "Milestone lookup failed after counter increment",
            );
            return Vec::new();
        }
    };

    let mut granted = Vec::new();
    for promotion in promotions
        .iter()
        .filter(|p| p.project_milestone_count.is_some_and(|m| milestone_reached(m, count)))
    {
        if let Some(voucher) = grant(pool, user_id, count, promotion).await {
            granted.push((voucher, promotion));
        }
    }

    if granted.is_empty() {
        return Vec::new();
    }

    let user = match UserRepo::find_by_id(pool, user_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Could not load user for reward email");
            None
        }
    };
    if let Some(user) = user {
        for (voucher, promotion) in &granted {
            notifier.dispatch(Notification::milestone_reward(
                &user.email,
                user.name.as_deref(),
                count,
                &promotion.description,
                &voucher.code,
                voucher.expires_at,
            ));
        }
    }

    granted.into_iter().map(|(voucher, _)| voucher).collect()
}

async fn grant(pool: &PgPool, user_id: DbId, count: i32, promotion: &Promotion) -> Option<Voucher> {
    let now = Utc::now();
    let input = CreateVoucher {
        user_id,
        promotion_id: promotion.id,
        milestone_count: count,
        code: voucher_code(&promotion.voucher_code_prefix, user_id, promotion.id, now),
        description: promotion.description.clone(),
        expires_at: voucher_expiry(now),
    };

    match VoucherRepo::create(pool, &input).await {
        Ok(Some(voucher)) => {
            tracing::info!(
                user_id,
                promotion_id = promotion.id,
                voucher_id = voucher.id,
                milestone = count,
                "Milestone voucher granted",
            );
            Some(voucher)
        }
        Ok(None) => {
            tracing::info!(
                user_id,
                promotion_id = promotion.id,
                milestone = count,
                "Milestone voucher already granted",
            );
            None
        }
        Err(e) => {
            tracing::error!(
                target: "reconciliation",
                user_id,
                promotion_id = promotion.id,
                milestone = count,
                error = %e,
                "Voucher insert failed after counter increment",
            );
            None
        }
    }
}
