mod common;

use common::{fixed_now, temp_store};
use nudge_bot::store::{LogAction, ReminderKind};

#[tokio::test]
async fn upsert_user_never_duplicates() {
    let (store, _db) = temp_store().await;
    let now = fixed_now().unix_timestamp();

    let first = store.get_or_create_user("twilio", "+15550001", now).await.unwrap();
    let again = store
        .get_or_create_user("twilio", "+15550001", now + 60)
        .await
        .unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(again.created_at, now);

    let users = store.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].platform, "twilio");
}

#[tokio::test]
async fn keyword_filter_is_case_insensitive() {
    let (store, _db) = temp_store().await;
    let now = fixed_now().unix_timestamp();
    let user = store.get_or_create_user("telegram", "1", now).await.unwrap();

    store
        .create_reminder(
            user.id,
            "Drink Water",
            ReminderKind::Recurring {
                interval_minutes: 120,
            },
            now + 7200,
            now,
            "Recurring every 120 minutes",
        )
        .await
        .unwrap();
    store
        .create_reminder(
            user.id,
            "call mom",
            ReminderKind::OneTime {
                scheduled_at: now + 3600,
            },
            now + 3600,
            now,
            "Scheduled",
        )
        .await
        .unwrap();

    let hits = store.active_reminders(user.id, Some("water")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Drink Water");

    let misses = store.active_reminders(user.id, Some("tea")).await.unwrap();
    assert!(misses.is_empty());
}

#[tokio::test]
async fn due_query_skips_future_and_inactive() {
    let (store, _db) = temp_store().await;
    let now = fixed_now().unix_timestamp();
    let user = store.get_or_create_user("telegram", "1", now).await.unwrap();

    let due_soon = store
        .create_reminder(
            user.id,
            "stretch",
            ReminderKind::Recurring {
                interval_minutes: 60,
            },
            now + 3600,
            now,
            "",
        )
        .await
        .unwrap();
    store
        .create_reminder(
            user.id,
            "far future",
            ReminderKind::OneTime {
                scheduled_at: now + 86_400,
            },
            now + 86_400,
            now,
            "",
        )
        .await
        .unwrap();

    assert!(store.due_reminders(now).await.unwrap().is_empty());

    let due = store.due_reminders(now + 3600).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].0.id, due_soon.id);

    store
        .cancel_reminders(user.id, Some("stretch"), now)
        .await
        .unwrap();
    assert!(store.due_reminders(now + 3600).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_user_removes_reminders_and_logs() {
    let (store, _db) = temp_store().await;
    let now = fixed_now().unix_timestamp();
    let user = store.get_or_create_user("telegram", "1", now).await.unwrap();
    store
        .create_reminder(
            user.id,
            "drink water",
            ReminderKind::Recurring {
                interval_minutes: 60,
            },
            now + 3600,
            now,
            "",
        )
        .await
        .unwrap();
    store
        .create_reminder(
            user.id,
            "call mom",
            ReminderKind::OneTime {
                scheduled_at: now + 3600,
            },
            now + 3600,
            now,
            "",
        )
        .await
        .unwrap();

    let before = store.totals().await.unwrap();
    assert_eq!(before.users, 1);
    assert_eq!(before.reminders, 2);
    assert_eq!(before.log_entries, 2);

    assert!(store.delete_user(user.id).await.unwrap());

    let after = store.totals().await.unwrap();
    assert_eq!(after.users, 0);
    assert_eq!(after.reminders, 0);
    assert_eq!(after.log_entries, 0);

    // Unknown ids report false instead of erroring.
    assert!(!store.delete_user(user.id).await.unwrap());
}

#[tokio::test]
async fn clean_purges_only_old_inactive_rows() {
    let (store, _db) = temp_store().await;
    let old = fixed_now().unix_timestamp() - 30 * 86_400;
    let now = fixed_now().unix_timestamp();
    let user = store.get_or_create_user("telegram", "1", old).await.unwrap();

    // An old reminder that was cancelled, and a fresh active one.
    store
        .create_reminder(
            user.id,
            "stale",
            ReminderKind::OneTime { scheduled_at: old },
            old,
            old,
            "",
        )
        .await
        .unwrap();
    store.cancel_reminders(user.id, Some("stale"), old).await.unwrap();
    store
        .create_reminder(
            user.id,
            "fresh",
            ReminderKind::Recurring {
                interval_minutes: 60,
            },
            now + 3600,
            now,
            "",
        )
        .await
        .unwrap();

    let cutoff = now - 7 * 86_400;
    assert_eq!(store.count_inactive_created_before(cutoff).await.unwrap(), 1);

    let removed = store.delete_inactive_created_before(cutoff).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.delete_inactive_created_before(cutoff).await.unwrap(), 0);

    let totals = store.totals().await.unwrap();
    assert_eq!(totals.reminders, 1);
    assert_eq!(totals.active_reminders, 1);
    // The purged reminder takes its log rows with it.
    assert_eq!(totals.log_entries, 1);

    let survivors = store.all_active_reminders().await.unwrap();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].0.title, "fresh");
}

#[tokio::test]
async fn latest_logs_come_newest_first_with_user() {
    let (store, _db) = temp_store().await;
    let now = fixed_now().unix_timestamp();
    let alice = store.get_or_create_user("telegram", "alice", now).await.unwrap();
    let bob = store.get_or_create_user("twilio", "+15550002", now).await.unwrap();

    store
        .create_reminder(
            alice.id,
            "early",
            ReminderKind::Recurring {
                interval_minutes: 60,
            },
            now + 3600,
            now,
            "",
        )
        .await
        .unwrap();
    store
        .create_reminder(
            bob.id,
            "late",
            ReminderKind::Recurring {
                interval_minutes: 60,
            },
            now + 3600,
            now + 10,
            "",
        )
        .await
        .unwrap();

    let logs = store.latest_logs(10).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].0.action, LogAction::Created);
    assert_eq!(logs[0].0.reminder_title.as_deref(), Some("late"));
    assert_eq!(logs[0].1.platform_id, "+15550002");
    assert_eq!(logs[1].0.reminder_title.as_deref(), Some("early"));

    let capped = store.latest_logs(1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].0.reminder_title.as_deref(), Some("late"));
}

#[tokio::test]
async fn corrupt_kind_is_never_produced() {
    // Both creation paths fix the shape columns, so reading back always
    // yields a well-formed kind.
    let (store, _db) = temp_store().await;
    let now = fixed_now().unix_timestamp();
    let user = store.get_or_create_user("telegram", "1", now).await.unwrap();

    let recurring = store
        .create_reminder(
            user.id,
            "a",
            ReminderKind::Recurring {
                interval_minutes: 15,
            },
            now + 900,
            now,
            "",
        )
        .await
        .unwrap();
    assert_eq!(recurring.interval_minutes(), Some(15));
    assert_eq!(recurring.scheduled_at(), None);

    let one_time = store
        .create_reminder(
            user.id,
            "b",
            ReminderKind::OneTime {
                scheduled_at: now + 60,
            },
            now + 60,
            now,
            "",
        )
        .await
        .unwrap();
    assert!(!one_time.is_recurring());
    assert_eq!(one_time.scheduled_at(), Some(now + 60));
}
