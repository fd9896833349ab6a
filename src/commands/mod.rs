pub mod timeparse;

use once_cell::sync::Lazy;
use regex::Regex;
use time::OffsetDateTime;

static CANCEL_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cancel\s+(.+?)\s+reminder").unwrap());
static RECURRING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"remind\s+me\s+to\s+(.+?)\s+every\s+(\d+)\s+(hour|minute|min|hr)").unwrap()
});
static ONCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"remind\s+me\s+to\s+(.+?)\s+at\s+(.+)").unwrap());

const STATS_SYNONYMS: &[&str] = &["stats", "show stats", "my stats"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Done,
    Stats,
    List,
    CancelAll,
    Cancel { keyword: String },
    RemindRecurring { title: String, interval_minutes: i64 },
    RemindOnce { title: String, scheduled_at: Option<OffsetDateTime> },
    Unknown,
}

// Rules run in a fixed priority order on the trimmed, lowercased message;
// the first hit wins.
pub fn parse(text: &str, now: OffsetDateTime) -> Command {
    let message = text.trim().to_lowercase();

    if message == "done" {
        return Command::Done;
    }

    if STATS_SYNONYMS.contains(&message.as_str()) {
        return Command::Stats;
    }

    if message.contains("list") && message.contains("reminder") {
        return Command::List;
    }

    if message.contains("cancel") {
        if message.contains("all") {
            return Command::CancelAll;
        }
        if let Some(caps) = CANCEL_KEYWORD_RE.captures(&message) {
            return Command::Cancel {
                keyword: caps[1].trim().to_string(),
            };
        }
        // Bare "cancel" with no keyword clears everything.
        return Command::CancelAll;
    }

    if let Some(caps) = RECURRING_RE.captures(&message) {
        if let Ok(amount) = caps[2].parse::<i64>() {
            let unit = &caps[3];
            // Hour counts that overflow i64 minutes fall through with the
            // rest of the noise.
            let interval_minutes = if unit == "hour" || unit == "hr" {
                amount.checked_mul(60)
            } else {
                Some(amount)
            };
            if let Some(interval_minutes) = interval_minutes {
                return Command::RemindRecurring {
                    title: caps[1].trim().to_string(),
                    interval_minutes,
                };
            }
        }
    }

    if let Some(caps) = ONCE_RE.captures(&message) {
        return Command::RemindOnce {
            title: caps[1].trim().to_string(),
            scheduled_at: timeparse::parse_time_of_day(&caps[2], now),
        };
    }

    Command::Unknown
}
