use anyhow::Result;
use chrono::{Duration, NaiveTime};

use crate::clock::Clock;
use crate::db::Database;
use crate::models::ReminderSlot;
use crate::tracker::achievement::{evaluate_achievement, AchievementTransition};

use super::{messages, Notification, Notifier};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// A reminder is still delivered if the check runs this long after its slot.
pub const REMINDER_GRACE_MINUTES: i64 = 60;

/// What one check delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReport {
    pub reminders: Vec<ReminderSlot>,
    pub journey: bool,
    pub achievement: AchievementTransition,
}

fn slot_is_due(slot: ReminderSlot, now: NaiveTime) -> bool {
    let start = slot.time();
    let end = start + Duration::minutes(REMINDER_GRACE_MINUTES);
    now >= start && now < end
}

/// Periodic notification pass: due reminders, the journey notice after a
/// login today, and the achievement check against the stored count.
///
/// Each reminder and the journey notice are marked in [`DailyFlags`] before
/// delivery, so a check that runs twice inside a window stays silent the
/// second time.
///
/// [`DailyFlags`]: crate::models::DailyFlags
pub async fn run_notification_check(
    db: &Database,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
) -> Result<NotificationReport> {
    let now = clock.now();
    let today = now.date();

    let step_count = db
        .read_today_record(today)
        .await?
        .map_or(0, |record| record.step_count);
    let step_target = db.step_target().await?;
    let logged_in_today = db.last_login().await? == Some(today);

    let (_, (reminders, journey)) = db
        .update_daily_flags(today, move |flags| {
            let due: Vec<ReminderSlot> = ReminderSlot::ALL
                .into_iter()
                .filter(|slot| slot_is_due(*slot, now.time()) && !flags.reminder_sent(*slot))
                .collect();
            for slot in &due {
                flags.mark_reminder(*slot);
            }

            let journey = if logged_in_today {
                let first = !flags.journey_announced;
                flags.journey_announced = true;
                first
            } else {
                flags.journey_announced = false;
                false
            };

            (due, journey)
        })
        .await?;

    for slot in &reminders {
        deliver(notifier, &messages::reminder(*slot, step_count));
    }
    if journey {
        log_info!("Announcing journey start for {today}");
        deliver(notifier, &messages::start_journey());
    }

    let achievement = evaluate_achievement(db, notifier, today, step_count, step_target).await?;

    if !reminders.is_empty() {
        log_info!("Delivered reminders {reminders:?} at {}", now.time());
    }

    Ok(NotificationReport {
        reminders,
        journey,
        achievement,
    })
}

fn deliver(notifier: &dyn Notifier, notification: &Notification) {
    if let Err(err) = notifier.notify(notification) {
        log_warn!("Failed to deliver '{}': {err:?}", notification.title);
    }
}
