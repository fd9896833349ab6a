use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::commands::timeparse;
use crate::services::lifecycle::UserStats;
use crate::store::{Reminder, ReminderKind};

const CLOCK_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[hour repr:12]:[minute] [period]");
const LOG_TIME_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[month]/[day] [hour repr:12]:[minute][period]");

pub fn format_clock(at: OffsetDateTime) -> String {
    at.format(CLOCK_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

fn format_log_time(ts: i64, offset: UtcOffset) -> String {
    let at = timeparse::at_offset(ts, offset);
    at.format(LOG_TIME_FORMAT)
        .unwrap_or_else(|_| ts.to_string())
}

pub fn format_interval(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 && rest > 0 {
        format!("{}h {}m", hours, rest)
    } else if hours > 0 {
        format!("{} hour{}", hours, if hours > 1 { "s" } else { "" })
    } else {
        format!("{} minute{}", rest, if rest != 1 { "s" } else { "" })
    }
}

fn format_interval_short(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 && rest > 0 {
        format!("{}h {}m", hours, rest)
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", rest)
    }
}

pub fn reminder_created(reminder: &Reminder, offset: UtcOffset) -> String {
    match reminder.kind {
        ReminderKind::Recurring { interval_minutes } => format!(
            "Reminder set! I'll remind you to '{}' every {}. Reply 'done' when you complete it.",
            reminder.title,
            format_interval(interval_minutes)
        ),
        ReminderKind::OneTime { scheduled_at } => format!(
            "Reminder set! I'll remind you to '{}' at {}.",
            reminder.title,
            format_clock(timeparse::at_offset(scheduled_at, offset))
        ),
    }
}

pub fn could_not_parse_time() -> String {
    "Could not parse the time. Try formats like '6pm', '6:30pm', or '18:00'.".to_string()
}

pub fn reminder_list(reminders: &[Reminder], offset: UtcOffset) -> String {
    if reminders.is_empty() {
        return "You have no active reminders. Send a message like 'remind me to drink water \
                every 2 hours' to create one!"
            .to_string();
    }
    let mut out = String::from("Your active reminders:\n\n");
    for (i, reminder) in reminders.iter().enumerate() {
        match reminder.kind {
            ReminderKind::Recurring { interval_minutes } => {
                out.push_str(&format!(
                    "{}. {} (every {})\n",
                    i + 1,
                    reminder.title,
                    format_interval_short(interval_minutes)
                ));
            }
            ReminderKind::OneTime { scheduled_at } => {
                out.push_str(&format!(
                    "{}. {} (at {})\n",
                    i + 1,
                    reminder.title,
                    format_clock(timeparse::at_offset(scheduled_at, offset))
                ));
            }
        }
    }
    out
}

pub fn reminders_cancelled(count: usize, keyword: Option<&str>) -> String {
    if count == 0 {
        return match keyword {
            Some(keyword) => format!("No active reminders found containing '{}'.", keyword),
            None => "You have no active reminders to cancel.".to_string(),
        };
    }
    let plural = if count > 1 { "s" } else { "" };
    match keyword {
        Some(keyword) => format!(
            "Cancelled {} reminder{} containing '{}'.",
            count, plural, keyword
        ),
        None => format!("Cancelled all {} reminder{}.", count, plural),
    }
}

pub fn reminder_done(reminder: &Reminder) -> String {
    let mut response = format!("Great job! Marked '{}' as complete.", reminder.title);
    if let ReminderKind::Recurring { interval_minutes } = reminder.kind {
        response.push_str(&format!(
            " I'll remind you again in {}.",
            format_interval(interval_minutes)
        ));
    }
    response
}

pub fn nothing_to_complete() -> String {
    "No recent reminders to mark as done. Create a reminder first!".to_string()
}

pub fn stats_summary(stats: &UserStats, offset: UtcOffset) -> String {
    let mut out = String::from("Your stats:\n\n");
    out.push_str(&format!(
        "Streak: {} day{}\n",
        stats.streak_days,
        if stats.streak_days != 1 { "s" } else { "" }
    ));
    out.push_str(&format!("Total completions: {}\n", stats.total_completions));
    out.push_str(&format!("Active reminders: {}\n", stats.active_reminders));
    if !stats.recent.is_empty() {
        out.push_str("\nRecent activity:\n");
        for log in &stats.recent {
            let title = log.reminder_title.as_deref().unwrap_or("reminder");
            out.push_str(&format!(
                "  - {}: {} ({})\n",
                log.action.as_str(),
                title,
                format_log_time(log.timestamp, offset)
            ));
        }
    }
    out
}

pub fn unknown_command() -> String {
    "I didn't understand that command. Here's what you can do:\n\n\
     - 'remind me to [task] every [X] hours' - Set recurring reminder\n\
     - 'remind me to [task] at [time]' - Set one-time reminder\n\
     - 'list reminders' - See all active reminders\n\
     - 'cancel [keyword] reminders' - Cancel specific reminders\n\
     - 'cancel all reminders' - Cancel all reminders\n\
     - 'done' - Mark last reminder as complete\n\
     - 'stats' - View your stats and streak\n\n\
     Examples:\n\
     - remind me to drink water every 2 hours\n\
     - remind me to call mom at 6pm\n\
     - cancel water reminders"
        .to_string()
}

pub fn storage_apology() -> String {
    "Sorry, an error occurred. Please try again.".to_string()
}

pub fn reminder_push(title: &str) -> String {
    format!("Reminder: {}\n\nReply 'done' when complete!", title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_forms() {
        assert_eq!(format_interval(45), "45 minutes");
        assert_eq!(format_interval(1), "1 minute");
        assert_eq!(format_interval(60), "1 hour");
        assert_eq!(format_interval(120), "2 hours");
        assert_eq!(format_interval(90), "1h 30m");
        assert_eq!(format_interval_short(90), "1h 30m");
        assert_eq!(format_interval_short(120), "2h");
        assert_eq!(format_interval_short(45), "45m");
    }

    #[test]
    fn cancel_wording_distinguishes_zero() {
        assert_eq!(
            reminders_cancelled(0, Some("water")),
            "No active reminders found containing 'water'."
        );
        assert_eq!(
            reminders_cancelled(0, None),
            "You have no active reminders to cancel."
        );
        assert_eq!(
            reminders_cancelled(2, None),
            "Cancelled all 2 reminders."
        );
        assert_eq!(
            reminders_cancelled(1, Some("water")),
            "Cancelled 1 reminder containing 'water'."
        );
    }
}
