use std::path::Path;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde::Serialize;

use crate::error::{NudgeBotError, Result};

mod schema;
use schema::{reminder_logs, reminders, users};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
type SqlitePool = Pool<SqliteAsyncConn>;
type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub platform: String,
    pub platform_id: String,
    pub created_at: i64,
}

/// What makes a reminder fire. The two shapes are mutually exclusive by
/// construction; rows that satisfy neither are rejected as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReminderKind {
    Recurring { interval_minutes: i64 },
    OneTime { scheduled_at: i64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    #[serde(flatten)]
    pub kind: ReminderKind,
    pub is_active: bool,
    pub last_sent_at: Option<i64>,
    pub next_send_at: Option<i64>,
    pub created_at: i64,
}

impl Reminder {
    pub fn is_recurring(&self) -> bool {
        matches!(self.kind, ReminderKind::Recurring { .. })
    }

    pub fn interval_minutes(&self) -> Option<i64> {
        match self.kind {
            ReminderKind::Recurring { interval_minutes } => Some(interval_minutes),
            ReminderKind::OneTime { .. } => None,
        }
    }

    pub fn scheduled_at(&self) -> Option<i64> {
        match self.kind {
            ReminderKind::Recurring { .. } => None,
            ReminderKind::OneTime { scheduled_at } => Some(scheduled_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Created,
    Sent,
    Completed,
    Cancelled,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Created => "created",
            LogAction::Sent => "sent",
            LogAction::Completed => "completed",
            LogAction::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for LogAction {
    type Err = ();

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match value {
            "created" => LogAction::Created,
            "sent" => LogAction::Sent,
            "completed" => LogAction::Completed,
            "cancelled" => LogAction::Cancelled,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i32,
    pub user_id: i32,
    pub reminder_id: Option<i32>,
    pub action: LogAction,
    pub reminder_title: Option<String>,
    pub note: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreTotals {
    pub users: i64,
    pub reminders: i64,
    pub active_reminders: i64,
    pub completions: i64,
    pub log_entries: i64,
}

#[derive(Queryable)]
struct UserRow {
    id: i32,
    platform: String,
    platform_id: String,
    created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUser<'a> {
    platform: &'a str,
    platform_id: &'a str,
    created_at: i64,
}

#[derive(Queryable)]
struct ReminderRow {
    id: i32,
    user_id: i32,
    title: String,
    interval_minutes: Option<i64>,
    scheduled_at: Option<i64>,
    is_recurring: bool,
    is_active: bool,
    last_sent_at: Option<i64>,
    next_send_at: Option<i64>,
    created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = reminders)]
struct NewReminder<'a> {
    user_id: i32,
    title: &'a str,
    interval_minutes: Option<i64>,
    scheduled_at: Option<i64>,
    is_recurring: bool,
    is_active: bool,
    last_sent_at: Option<i64>,
    next_send_at: Option<i64>,
    created_at: i64,
}

#[derive(Queryable)]
struct LogRow {
    id: i32,
    user_id: i32,
    reminder_id: Option<i32>,
    action: String,
    reminder_title: Option<String>,
    note: Option<String>,
    timestamp: i64,
}

#[derive(Insertable)]
#[diesel(table_name = reminder_logs)]
struct NewLog<'a> {
    user_id: i32,
    reminder_id: Option<i32>,
    action: &'a str,
    reminder_title: Option<&'a str>,
    note: Option<&'a str>,
    timestamp: i64,
}

pub struct ReminderStore {
    pool: SqlitePool,
}

impl ReminderStore {
    pub async fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        ensure_parent_dir(sqlite_path)?;
        run_migrations(sqlite_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
        let pool: SqlitePool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn get_or_create_user(
        &self,
        platform: &str,
        platform_id: &str,
        now: i64,
    ) -> Result<User> {
        let new = NewUser {
            platform,
            platform_id,
            created_at: now,
        };
        let mut conn = self.conn().await?;
        diesel::insert_into(users::table)
            .values(&new)
            .on_conflict(users::platform_id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;

        let row: UserRow = users::table
            .filter(users::platform_id.eq(platform_id))
            .first(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(map_user(row))
    }

    pub async fn create_reminder(
        &self,
        user_id: i32,
        title: &str,
        kind: ReminderKind,
        next_send_at: i64,
        now: i64,
        note: &str,
    ) -> Result<Reminder> {
        let (interval_minutes, scheduled_at, is_recurring) = match kind {
            ReminderKind::Recurring { interval_minutes } => (Some(interval_minutes), None, true),
            ReminderKind::OneTime { scheduled_at } => (None, Some(scheduled_at), false),
        };
        let new = NewReminder {
            user_id,
            title,
            interval_minutes,
            scheduled_at,
            is_recurring,
            is_active: true,
            last_sent_at: None,
            next_send_at: Some(next_send_at),
            created_at: now,
        };

        let mut conn = self.conn().await?;
        let row = conn
            .transaction::<ReminderRow, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::insert_into(reminders::table)
                        .values(&new)
                        .execute(conn)
                        .await?;
                    let row: ReminderRow = reminders::table
                        .filter(reminders::user_id.eq(user_id))
                        .order(reminders::id.desc())
                        .first(conn)
                        .await?;
                    let log = NewLog {
                        user_id,
                        reminder_id: Some(row.id),
                        action: LogAction::Created.as_str(),
                        reminder_title: Some(title),
                        note: Some(note),
                        timestamp: now,
                    };
                    insert_log(conn, log).await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        map_reminder(row)
    }

    pub async fn active_reminders(
        &self,
        user_id: i32,
        keyword: Option<&str>,
    ) -> Result<Vec<Reminder>> {
        let mut conn = self.conn().await?;
        let mut query = reminders::table
            .filter(reminders::user_id.eq(user_id))
            .filter(reminders::is_active.eq(true))
            .into_boxed();
        if let Some(keyword) = keyword {
            query = query.filter(reminders::title.like(format!("%{}%", keyword)));
        }
        let rows: Vec<ReminderRow> = query
            .order(reminders::id.asc())
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        rows.into_iter().map(map_reminder).collect()
    }

    pub async fn cancel_reminders(
        &self,
        user_id: i32,
        keyword: Option<&str>,
        now: i64,
    ) -> Result<usize> {
        let pattern = keyword.map(|k| format!("%{}%", k));
        let mut conn = self.conn().await?;
        let cancelled = conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                async move {
                    let mut query = reminders::table
                        .filter(reminders::user_id.eq(user_id))
                        .filter(reminders::is_active.eq(true))
                        .into_boxed();
                    if let Some(pattern) = pattern {
                        query = query.filter(reminders::title.like(pattern));
                    }
                    let rows: Vec<ReminderRow> = query.load(conn).await?;
                    for row in &rows {
                        diesel::update(reminders::table.filter(reminders::id.eq(row.id)))
                            .set(reminders::is_active.eq(false))
                            .execute(conn)
                            .await?;
                        let log = NewLog {
                            user_id,
                            reminder_id: Some(row.id),
                            action: LogAction::Cancelled.as_str(),
                            reminder_title: Some(&row.title),
                            note: None,
                            timestamp: now,
                        };
                        insert_log(conn, log).await?;
                    }
                    Ok(rows.len())
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(cancelled)
    }

    pub async fn latest_sent_active(&self, user_id: i32) -> Result<Option<Reminder>> {
        let mut conn = self.conn().await?;
        let row: Option<ReminderRow> = reminders::table
            .filter(reminders::user_id.eq(user_id))
            .filter(reminders::is_active.eq(true))
            .filter(reminders::last_sent_at.is_not_null())
            .order(reminders::last_sent_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        row.map(map_reminder).transpose()
    }

    pub async fn complete_reminder(
        &self,
        reminder: &Reminder,
        next_send_at: Option<i64>,
        now: i64,
    ) -> Result<Reminder> {
        let reminder_id = reminder.id;
        let user_id = reminder.user_id;
        let title = reminder.title.as_str();
        let mut conn = self.conn().await?;
        let row = conn
            .transaction::<ReminderRow, diesel::result::Error, _>(|conn| {
                async move {
                    match next_send_at {
                        Some(next) => {
                            diesel::update(
                                reminders::table.filter(reminders::id.eq(reminder_id)),
                            )
                            .set(reminders::next_send_at.eq(Some(next)))
                            .execute(conn)
                            .await?;
                        }
                        None => {
                            diesel::update(
                                reminders::table.filter(reminders::id.eq(reminder_id)),
                            )
                            .set(reminders::is_active.eq(false))
                            .execute(conn)
                            .await?;
                        }
                    }
                    let log = NewLog {
                        user_id,
                        reminder_id: Some(reminder_id),
                        action: LogAction::Completed.as_str(),
                        reminder_title: Some(title),
                        note: None,
                        timestamp: now,
                    };
                    insert_log(conn, log).await?;
                    reminders::table
                        .filter(reminders::id.eq(reminder_id))
                        .first(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        map_reminder(row)
    }

    /// Delivery bookkeeping after a successful send: last_sent_at plus, for
    /// recurring reminders, the advanced next_send_at. Never touches
    /// is_active, so one-time reminders keep nagging until acknowledged.
    pub async fn mark_sent(
        &self,
        reminder: &Reminder,
        next_send_at: Option<i64>,
        now: i64,
    ) -> Result<()> {
        let reminder_id = reminder.id;
        let user_id = reminder.user_id;
        let title = reminder.title.as_str();
        let mut conn = self.conn().await?;
        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                match next_send_at {
                    Some(next) => {
                        diesel::update(reminders::table.filter(reminders::id.eq(reminder_id)))
                            .set((
                                reminders::last_sent_at.eq(Some(now)),
                                reminders::next_send_at.eq(Some(next)),
                            ))
                            .execute(conn)
                            .await?;
                    }
                    None => {
                        diesel::update(reminders::table.filter(reminders::id.eq(reminder_id)))
                            .set(reminders::last_sent_at.eq(Some(now)))
                            .execute(conn)
                            .await?;
                    }
                }
                let log = NewLog {
                    user_id,
                    reminder_id: Some(reminder_id),
                    action: LogAction::Sent.as_str(),
                    reminder_title: Some(title),
                    note: None,
                    timestamp: now,
                };
                insert_log(conn, log).await
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(())
    }

    pub async fn due_reminders(&self, now: i64) -> Result<Vec<(Reminder, User)>> {
        let mut conn = self.conn().await?;
        let rows: Vec<(ReminderRow, UserRow)> = reminders::table
            .inner_join(users::table)
            .filter(reminders::is_active.eq(true))
            .filter(reminders::next_send_at.le(Some(now)))
            .order(reminders::next_send_at.asc())
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|(reminder, user)| Ok((map_reminder(reminder)?, map_user(user))))
            .collect()
    }

    pub async fn count_completions(&self, user_id: i32) -> Result<i64> {
        let mut conn = self.conn().await?;
        reminder_logs::table
            .filter(reminder_logs::user_id.eq(user_id))
            .filter(reminder_logs::action.eq(LogAction::Completed.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))
    }

    pub async fn completion_timestamps(&self, user_id: i32, limit: i64) -> Result<Vec<i64>> {
        let mut conn = self.conn().await?;
        reminder_logs::table
            .filter(reminder_logs::user_id.eq(user_id))
            .filter(reminder_logs::action.eq(LogAction::Completed.as_str()))
            .order(reminder_logs::timestamp.desc())
            .limit(limit)
            .select(reminder_logs::timestamp)
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))
    }

    pub async fn recent_logs(&self, user_id: i32, limit: i64) -> Result<Vec<LogEntry>> {
        let mut conn = self.conn().await?;
        let rows: Vec<LogRow> = reminder_logs::table
            .filter(reminder_logs::user_id.eq(user_id))
            .order(reminder_logs::timestamp.desc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        rows.into_iter().map(map_log).collect()
    }

    pub async fn count_active(&self, user_id: i32) -> Result<i64> {
        let mut conn = self.conn().await?;
        reminders::table
            .filter(reminders::user_id.eq(user_id))
            .filter(reminders::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut conn = self.conn().await?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(rows.into_iter().map(map_user).collect())
    }

    pub async fn all_active_reminders(&self) -> Result<Vec<(Reminder, User)>> {
        let mut conn = self.conn().await?;
        let rows: Vec<(ReminderRow, UserRow)> = reminders::table
            .inner_join(users::table)
            .filter(reminders::is_active.eq(true))
            .order(reminders::id.asc())
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|(reminder, user)| Ok((map_reminder(reminder)?, map_user(user))))
            .collect()
    }

    pub async fn latest_logs(&self, limit: i64) -> Result<Vec<(LogEntry, User)>> {
        let mut conn = self.conn().await?;
        let rows: Vec<(LogRow, UserRow)> = reminder_logs::table
            .inner_join(users::table)
            .order(reminder_logs::timestamp.desc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|(log, user)| Ok((map_log(log)?, map_user(user))))
            .collect()
    }

    pub async fn totals(&self) -> Result<StoreTotals> {
        let mut conn = self.conn().await?;
        let users_count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        let reminders_count: i64 = reminders::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        let active_count: i64 = reminders::table
            .filter(reminders::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        let completions: i64 = reminder_logs::table
            .filter(reminder_logs::action.eq(LogAction::Completed.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        let log_entries: i64 = reminder_logs::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(StoreTotals {
            users: users_count,
            reminders: reminders_count,
            active_reminders: active_count,
            completions,
            log_entries,
        })
    }

    /// SQLite only enforces foreign keys when the connection opts in, so
    /// the cascade over reminders and logs runs explicitly, one transaction.
    pub async fn delete_user(&self, user_id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::delete(
                        reminder_logs::table.filter(reminder_logs::user_id.eq(user_id)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(reminders::table.filter(reminders::user_id.eq(user_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(users::table.filter(users::id.eq(user_id)))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(deleted > 0)
    }

    pub async fn delete_inactive_created_before(&self, cutoff: i64) -> Result<usize> {
        let mut conn = self.conn().await?;
        let deleted = conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                async move {
                    let ids: Vec<i32> = reminders::table
                        .filter(reminders::is_active.eq(false))
                        .filter(reminders::created_at.lt(cutoff))
                        .select(reminders::id)
                        .load(conn)
                        .await?;
                    if ids.is_empty() {
                        return Ok(0);
                    }
                    diesel::delete(
                        reminder_logs::table.filter(reminder_logs::reminder_id.eq_any(&ids)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(reminders::table.filter(reminders::id.eq_any(&ids)))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok(deleted)
    }

    pub async fn count_inactive_created_before(&self, cutoff: i64) -> Result<i64> {
        let mut conn = self.conn().await?;
        reminders::table
            .filter(reminders::is_active.eq(false))
            .filter(reminders::created_at.lt(cutoff))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        self.pool
            .get()
            .await
            .map_err(|e| NudgeBotError::Storage(e.to_string()))
    }
}

async fn insert_log(
    conn: &mut SqliteAsyncConn,
    log: NewLog<'_>,
) -> std::result::Result<(), diesel::result::Error> {
    diesel::insert_into(reminder_logs::table)
        .values(&log)
        .execute(conn)
        .await?;
    Ok(())
}

fn map_user(row: UserRow) -> User {
    User {
        id: row.id,
        platform: row.platform,
        platform_id: row.platform_id,
        created_at: row.created_at,
    }
}

fn map_reminder(row: ReminderRow) -> Result<Reminder> {
    let kind = match (row.is_recurring, row.interval_minutes, row.scheduled_at) {
        (true, Some(interval_minutes), _) => ReminderKind::Recurring { interval_minutes },
        (false, _, Some(scheduled_at)) => ReminderKind::OneTime { scheduled_at },
        _ => {
            return Err(NudgeBotError::Storage(format!(
                "reminder {} has neither interval nor scheduled time",
                row.id
            )))
        }
    };
    Ok(Reminder {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        kind,
        is_active: row.is_active,
        last_sent_at: row.last_sent_at,
        next_send_at: row.next_send_at,
        created_at: row.created_at,
    })
}

fn map_log(row: LogRow) -> Result<LogEntry> {
    let action: LogAction = row
        .action
        .parse()
        .map_err(|_| NudgeBotError::Storage(format!("unknown log action: {}", row.action)))?;
    Ok(LogEntry {
        id: row.id,
        user_id: row.user_id,
        reminder_id: row.reminder_id,
        action,
        reminder_title: row.reminder_title,
        note: row.note,
        timestamp: row.timestamp,
    })
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| NudgeBotError::Storage(e.to_string()))?;
    }
    Ok(())
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_url)
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| NudgeBotError::Storage(e.to_string()))?;
        Ok::<_, NudgeBotError>(())
    })
    .await
    .map_err(|e| NudgeBotError::Runtime(e.to_string()))??;
    Ok(())
}
