//! Target-achievement state machine.
//!
//! The flag lives in [`DailyFlags`], so rolling to a new day clears it
//! without any explicit transition.

use anyhow::Result;
use chrono::NaiveDate;

use crate::db::Database;
use crate::models::DailyFlags;
use crate::notifications::{messages, Notifier};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementTransition {
    /// Count reached the target for the first time today.
    Achieved,
    /// Count fell back below the target (corrective resync).
    Cleared,
    Unchanged,
}

pub fn transition(step_count: u64, step_target: u64, achieved: bool) -> AchievementTransition {
    if step_count >= step_target && !achieved {
        AchievementTransition::Achieved
    } else if step_count < step_target && achieved {
        AchievementTransition::Cleared
    } else {
        AchievementTransition::Unchanged
    }
}

impl AchievementTransition {
    pub fn apply(self, flags: &mut DailyFlags) {
        match self {
            AchievementTransition::Achieved => flags.achieved = true,
            AchievementTransition::Cleared => flags.achieved = false,
            AchievementTransition::Unchanged => {}
        }
    }
}

/// Evaluate `step_count` against today's persisted flag and notify on the
/// rising edge. The flag update runs as one store task, so concurrent
/// callers cannot both observe the rising edge.
pub async fn evaluate_achievement(
    db: &Database,
    notifier: &dyn Notifier,
    today: NaiveDate,
    step_count: u64,
    step_target: u64,
) -> Result<AchievementTransition> {
    let (_, change) = db
        .update_daily_flags(today, move |flags| {
            let change = transition(step_count, step_target, flags.achieved);
            change.apply(flags);
            change
        })
        .await?;

    match change {
        AchievementTransition::Achieved => {
            log_info!("Step target {step_target} reached with {step_count} steps");
            if let Err(err) = notifier.notify(&messages::target_achieved()) {
                log_warn!("Failed to deliver achievement notification: {err:?}");
            }
        }
        AchievementTransition::Cleared => {
            log_info!("Step count {step_count} fell below target {step_target}; flag cleared");
        }
        AchievementTransition::Unchanged => {}
    }

    Ok(change)
}
