use time::macros::datetime;

use nudge_bot::commands::timeparse::parse_time_of_day;
use nudge_bot::commands::{parse, Command};

fn morning() -> time::OffsetDateTime {
    datetime!(2025-07-15 10:00 UTC)
}

fn evening() -> time::OffsetDateTime {
    datetime!(2025-07-15 20:00 UTC)
}

#[test]
fn done_matches_exactly() {
    assert_eq!(parse("done", morning()), Command::Done);
    assert_eq!(parse("  DONE  ", morning()), Command::Done);
    assert_eq!(parse("done please", morning()), Command::Unknown);
}

#[test]
fn stats_synonyms_match_exactly() {
    assert_eq!(parse("stats", morning()), Command::Stats);
    assert_eq!(parse("Show Stats", morning()), Command::Stats);
    assert_eq!(parse("my stats", morning()), Command::Stats);
    assert_eq!(parse("statistics", morning()), Command::Unknown);
}

#[test]
fn list_needs_both_words() {
    assert_eq!(parse("list reminders", morning()), Command::List);
    assert_eq!(parse("list my reminders", morning()), Command::List);
    assert_eq!(parse("please list every reminder", morning()), Command::List);
    assert_eq!(parse("list", morning()), Command::Unknown);
}

#[test]
fn cancel_all_and_keyword_forms() {
    assert_eq!(parse("cancel all reminders", morning()), Command::CancelAll);
    assert_eq!(parse("cancel", morning()), Command::CancelAll);
    // No keyword between "cancel" and "reminders", so everything goes.
    assert_eq!(parse("cancel reminders", morning()), Command::CancelAll);
    assert_eq!(
        parse("cancel water reminder", morning()),
        Command::Cancel {
            keyword: "water".to_string()
        }
    );
    assert_eq!(
        parse("cancel water reminders", morning()),
        Command::Cancel {
            keyword: "water".to_string()
        }
    );
    assert_eq!(
        parse("cancel the gym session reminder", morning()),
        Command::Cancel {
            keyword: "the gym session".to_string()
        }
    );
}

#[test]
fn recurring_units_convert_to_minutes() {
    assert_eq!(
        parse("remind me to drink water every 2 hours", morning()),
        Command::RemindRecurring {
            title: "drink water".to_string(),
            interval_minutes: 120
        }
    );
    assert_eq!(
        parse("remind me to stretch every 30 minutes", morning()),
        Command::RemindRecurring {
            title: "stretch".to_string(),
            interval_minutes: 30
        }
    );
    assert_eq!(
        parse("remind me to stand up every 45 min", morning()),
        Command::RemindRecurring {
            title: "stand up".to_string(),
            interval_minutes: 45
        }
    );
    assert_eq!(
        parse("remind me to check email every 1 hr", morning()),
        Command::RemindRecurring {
            title: "check email".to_string(),
            interval_minutes: 60
        }
    );
    // Minute counts pass through untouched whatever their size; the
    // lifecycle layer decides whether they are schedulable.
    assert_eq!(
        parse("remind me to hydrate every 200000000000000000 min", morning()),
        Command::RemindRecurring {
            title: "hydrate".to_string(),
            interval_minutes: 200_000_000_000_000_000
        }
    );
}

#[test]
fn hour_counts_too_large_for_minutes_are_unknown() {
    // 2e17 hours fits in i64 but the minute conversion does not.
    assert_eq!(
        parse("remind me to hydrate every 200000000000000000 hour", morning()),
        Command::Unknown
    );
    assert_eq!(
        parse("remind me to hydrate every 9223372036854775807 hr", morning()),
        Command::Unknown
    );
    // Twenty digits never parses as i64 in the first place.
    assert_eq!(
        parse("remind me to hydrate every 99999999999999999999 hours", morning()),
        Command::Unknown
    );
}

#[test]
fn recurring_wins_over_one_time() {
    // Both rules could match here; the interval rule runs first.
    assert_eq!(
        parse("remind me to stretch every 1 hour at my desk", morning()),
        Command::RemindRecurring {
            title: "stretch".to_string(),
            interval_minutes: 60
        }
    );
}

#[test]
fn one_time_resolves_clock_time() {
    assert_eq!(
        parse("remind me to call mom at 6pm", morning()),
        Command::RemindOnce {
            title: "call mom".to_string(),
            scheduled_at: Some(datetime!(2025-07-15 18:00 UTC)),
        }
    );
}

#[test]
fn one_time_keeps_unparseable_time() {
    assert_eq!(
        parse("remind me to call mom at noonish", morning()),
        Command::RemindOnce {
            title: "call mom".to_string(),
            scheduled_at: None,
        }
    );
}

#[test]
fn everything_else_is_unknown() {
    assert_eq!(parse("hello there", morning()), Command::Unknown);
    assert_eq!(parse("", morning()), Command::Unknown);
    assert_eq!(parse("remind me to", morning()), Command::Unknown);
}

#[test]
fn clock_times_resolve_against_now() {
    assert_eq!(
        parse_time_of_day("6pm", morning()),
        Some(datetime!(2025-07-15 18:00 UTC))
    );
    assert_eq!(
        parse_time_of_day("6:30pm", morning()),
        Some(datetime!(2025-07-15 18:30 UTC))
    );
    assert_eq!(
        parse_time_of_day("18:00", morning()),
        Some(datetime!(2025-07-15 18:00 UTC))
    );
    assert_eq!(
        parse_time_of_day("11", morning()),
        Some(datetime!(2025-07-15 11:00 UTC))
    );
}

#[test]
fn past_times_roll_to_tomorrow() {
    assert_eq!(
        parse_time_of_day("6pm", evening()),
        Some(datetime!(2025-07-16 18:00 UTC))
    );
    // 12am is midnight, always behind a 10:00 now.
    assert_eq!(
        parse_time_of_day("12am", morning()),
        Some(datetime!(2025-07-16 0:00 UTC))
    );
}

#[test]
fn noon_is_not_midnight() {
    assert_eq!(
        parse_time_of_day("12pm", morning()),
        Some(datetime!(2025-07-15 12:00 UTC))
    );
}

#[test]
fn out_of_range_times_are_rejected() {
    assert_eq!(parse_time_of_day("25", morning()), None);
    assert_eq!(parse_time_of_day("6:99pm", morning()), None);
    assert_eq!(parse_time_of_day("soon", morning()), None);
}
