//! Production project lifecycle.
//!
//! Statuses mirror the `chk_projects_status` constraint. `Revisions` loops
//! back into review, so the dashboard progress bar shows it as `Review`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Intake,
    InProgress,
    StaticMix,
    FinalMix,
    Mastered,
    Review,
    Revisions,
    Delivered,
}

/// Ordered steps shown on the progress bar (revisions excluded).
const PROGRESS_STEPS: [ProjectStatus; 7] = [
    ProjectStatus::Intake,
    ProjectStatus::InProgress,
    ProjectStatus::StaticMix,
    ProjectStatus::FinalMix,
    ProjectStatus::Mastered,
    ProjectStatus::Review,
    ProjectStatus::Delivered,
];

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 8] = [
        ProjectStatus::Intake,
        ProjectStatus::InProgress,
        ProjectStatus::StaticMix,
        ProjectStatus::FinalMix,
        ProjectStatus::Mastered,
        ProjectStatus::Review,
        ProjectStatus::Revisions,
        ProjectStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Intake => "intake",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::StaticMix => "static_mix",
            ProjectStatus::FinalMix => "final_mix",
            ProjectStatus::Mastered => "mastered",
            ProjectStatus::Review => "review",
            ProjectStatus::Revisions => "revisions",
            ProjectStatus::Delivered => "delivered",
        }
    }

    /// Parse a stored or client-supplied status name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid project status: '{s}'")))
    }

    /// Whether moving from `previous` to `self` is the delivery event that
    /// feeds the loyalty counter. Re-delivering an already delivered project
    /// does not count twice.
    pub fn completes_project(self, previous: ProjectStatus) -> bool {
        self == ProjectStatus::Delivered && previous != ProjectStatus::Delivered
    }

    /// Progress bar fill, 0-100.
    pub fn progress_percent(self) -> u8 {
        let shown = match self {
            ProjectStatus::Revisions => ProjectStatus::Review,
            other => other,
        };
        let index = PROGRESS_STEPS
            .iter()
            .position(|s| *s == shown)
            .unwrap_or_default();
        ((index * 100) / (PROGRESS_STEPS.len() - 1)) as u8
    }
}
