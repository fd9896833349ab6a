use once_cell::sync::Lazy;
use regex::Regex;
use time::{Duration, OffsetDateTime, Time, UtcOffset};

static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(?::(\d+))?\s*(am|pm)?").unwrap());

/// Next instant with the named wall time: today if still ahead of `now`,
/// otherwise tomorrow. `None` when the text has no digits or names an
/// impossible time.
pub fn parse_time_of_day(text: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let text = text.trim().to_lowercase();
    let caps = TIME_RE.captures(&text)?;

    let mut hour: i64 = caps.get(1)?.as_str().parse().ok()?;
    let minute: i64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    let clock = Time::from_hms(u8::try_from(hour).ok()?, u8::try_from(minute).ok()?, 0).ok()?;
    let mut scheduled = now.replace_time(clock);
    if scheduled < now {
        scheduled += Duration::days(1);
    }
    Some(scheduled)
}

/// Host-local wall clock, UTC when the local offset is indeterminate.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn at_offset(ts: i64, offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(ts)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .to_offset(offset)
}
