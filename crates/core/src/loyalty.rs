//! Loyalty milestone rules and voucher derivation (pure logic).
//!
//! The counter update and voucher persistence live in the repository and
//! engine layers; this module only decides *what* to grant.

use crate::types::{DbId, Timestamp};

/// `promotions.type` value for project-count milestones.
pub const PROMOTION_TYPE_PROJECT_MILESTONE: &str = "project_milestone";

/// How long a granted voucher stays redeemable.
pub const VOUCHER_VALIDITY_DAYS: i64 = 365;

/// Upper bound of the `vouchers.code` column.
pub const MAX_VOUCHER_CODE_LEN: usize = 64;

/// Milestone matching uses exact equality. Reaching 10 does not grant the
/// 9-project reward retroactively.
pub fn milestone_reached(milestone_count: i32, projects_completed: i32) -> bool {
    milestone_count == projects_completed
}

/// Derive the voucher code for a grant.
///
/// Format: `{PREFIX}-{user_id}-{promotion_id}-{unix_millis}`. The prefix is
/// upper-cased and stripped to ASCII alphanumerics so codes are easy to read
/// out over the phone.
pub fn voucher_code(prefix: &str, user_id: DbId, promotion_id: DbId, at: Timestamp) -> String {
    let clean: String = prefix
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let prefix = if clean.is_empty() { "VOUCHER".to_string() } else { clean };

    let suffix = format!("-{user_id}-{promotion_id}-{}", at.timestamp_millis());
    let room = MAX_VOUCHER_CODE_LEN.saturating_sub(suffix.len());
    let prefix: String = prefix.chars().take(room).collect();

    format!("{prefix}{suffix}")
}

/// Expiry timestamp for a voucher granted at `granted_at`.
pub fn voucher_expiry(granted_at: Timestamp) -> Timestamp {
    granted_at + chrono::Duration::days(VOUCHER_VALIDITY_DAYS)
}
