use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::commands::timeparse;
use crate::error::{NudgeBotError, Result};
use crate::services::responses;
use crate::store::{LogEntry, Reminder, ReminderKind, ReminderStore, User};

/// Streak computation looks at this many most-recent completion logs, so
/// streaks longer than the window truncate there.
pub const STREAK_SCAN_LIMIT: i64 = 100;
pub const RECENT_LOG_LIMIT: i64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_completions: i64,
    pub streak_days: i64,
    pub active_reminders: i64,
    pub recent: Vec<LogEntry>,
}

pub struct ReminderService {
    store: Arc<ReminderStore>,
}

impl ReminderService {
    pub fn new(store: Arc<ReminderStore>) -> Self {
        Self { store }
    }

    pub async fn get_or_create_user(
        &self,
        platform: &str,
        platform_id: &str,
        now: OffsetDateTime,
    ) -> Result<User> {
        let platform_id = platform_id.trim();
        if platform_id.is_empty() {
            return Err(NudgeBotError::Validation(
                "I couldn't tell who sent that message.".to_string(),
            ));
        }
        self.store
            .get_or_create_user(platform, platform_id, now.unix_timestamp())
            .await
    }

    pub async fn create_recurring(
        &self,
        user: &User,
        title: &str,
        interval_minutes: i64,
        now: OffsetDateTime,
    ) -> Result<Reminder> {
        let title = valid_title(title)?;
        if interval_minutes <= 0 {
            return Err(NudgeBotError::Validation(
                "The interval must be at least one minute.".to_string(),
            ));
        }
        let now_ts = now.unix_timestamp();
        let next_send_at = next_send_after(now_ts, interval_minutes)?;
        let note = format!("Recurring every {} minutes", interval_minutes);
        self.store
            .create_reminder(
                user.id,
                title,
                ReminderKind::Recurring { interval_minutes },
                next_send_at,
                now_ts,
                &note,
            )
            .await
    }

    pub async fn create_one_time(
        &self,
        user: &User,
        title: &str,
        scheduled_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<Reminder> {
        let title = valid_title(title)?;
        let scheduled_ts = scheduled_at.unix_timestamp();
        let note = format!("Scheduled for {}", responses::format_clock(scheduled_at));
        self.store
            .create_reminder(
                user.id,
                title,
                ReminderKind::OneTime {
                    scheduled_at: scheduled_ts,
                },
                scheduled_ts,
                now.unix_timestamp(),
                &note,
            )
            .await
    }

    pub async fn cancel(
        &self,
        user: &User,
        keyword: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<usize> {
        self.store
            .cancel_reminders(user.id, keyword, now.unix_timestamp())
            .await
    }

    pub async fn list_active(&self, user: &User) -> Result<Vec<Reminder>> {
        self.store.active_reminders(user.id, None).await
    }

    /// Completes the most recently pushed active reminder. `Ok(None)` means
    /// nothing has been pushed yet and nothing was mutated.
    pub async fn mark_done(&self, user: &User, now: OffsetDateTime) -> Result<Option<Reminder>> {
        let Some(reminder) = self.store.latest_sent_active(user.id).await? else {
            return Ok(None);
        };
        let now_ts = now.unix_timestamp();
        let next_send_at = reminder
            .interval_minutes()
            .map(|m| next_send_after(now_ts, m))
            .transpose()?;
        let updated = self
            .store
            .complete_reminder(&reminder, next_send_at, now_ts)
            .await?;
        Ok(Some(updated))
    }

    pub async fn stats(&self, user: &User, now: OffsetDateTime) -> Result<UserStats> {
        let total_completions = self.store.count_completions(user.id).await?;
        let completions = self
            .store
            .completion_timestamps(user.id, STREAK_SCAN_LIMIT)
            .await?;
        let streak_days = completion_streak(&completions, now);
        let recent = self.store.recent_logs(user.id, RECENT_LOG_LIMIT).await?;
        let active_reminders = self.store.count_active(user.id).await?;
        Ok(UserStats {
            total_completions,
            streak_days,
            active_reminders,
            recent,
        })
    }

    pub async fn due_reminders(&self, now: OffsetDateTime) -> Result<Vec<(Reminder, User)>> {
        self.store.due_reminders(now.unix_timestamp()).await
    }

    pub async fn mark_sent(&self, reminder: &Reminder, now: OffsetDateTime) -> Result<()> {
        let now_ts = now.unix_timestamp();
        let next_send_at = reminder
            .interval_minutes()
            .map(|m| next_send_after(now_ts, m))
            .transpose()?;
        self.store.mark_sent(reminder, next_send_at, now_ts).await
    }
}

/// Consecutive calendar days with a completion, walking back from `now`'s
/// date. Timestamps are viewed at `now`'s offset.
pub fn completion_streak(completion_timestamps: &[i64], now: OffsetDateTime) -> i64 {
    let days: HashSet<Date> = completion_timestamps
        .iter()
        .map(|ts| timeparse::at_offset(*ts, now.offset()).date())
        .collect();
    let mut streak = 0;
    let mut day = now.date();
    while days.contains(&day) {
        streak += 1;
        let Some(previous) = day.previous_day() else {
            break;
        };
        day = previous;
    }
    streak
}

fn valid_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NudgeBotError::Validation(
            "The reminder needs a title.".to_string(),
        ));
    }
    Ok(title)
}

fn next_send_after(now_ts: i64, interval_minutes: i64) -> Result<i64> {
    interval_minutes
        .checked_mul(60)
        .and_then(|seconds| now_ts.checked_add(seconds))
        .ok_or_else(|| {
            NudgeBotError::Validation("That interval is too long to schedule.".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn streak_counts_consecutive_days_only() {
        let now = datetime!(2025-03-10 12:00 UTC);
        let day = 86_400;
        let base = now.unix_timestamp();
        // today, yesterday, two days ago, then a gap at day three
        let timestamps = vec![base - 3600, base - day, base - 2 * day, base - 5 * day];
        assert_eq!(completion_streak(&timestamps, now), 3);
    }

    #[test]
    fn streak_zero_without_completion_today() {
        let now = datetime!(2025-03-10 12:00 UTC);
        let day = 86_400;
        let timestamps = vec![now.unix_timestamp() - day];
        assert_eq!(completion_streak(&timestamps, now), 0);
        assert_eq!(completion_streak(&[], now), 0);
    }
}
