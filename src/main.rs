use clap::Parser;
use console::style;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

use nudge_bot::commands::timeparse;
use nudge_bot::error::Result;
use nudge_bot::services::responses;
use nudge_bot::store::{ReminderKind, ReminderStore};

#[derive(Parser, Debug)]
#[command(name = "nudge-bot")]
#[command(about = "Nudge Bot admin CLI")]
struct Cli {
    #[arg(long, default_value = "./data/nudge-bot.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    Init,
    Stats,
    Users,
    Reminders,
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    Clean {
        #[arg(long, default_value_t = 7)]
        days: i64,

        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

static TS_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn format_ts(ts: i64, offset: UtcOffset) -> String {
    timeparse::at_offset(ts, offset)
        .format(TS_FORMAT)
        .unwrap_or_else(|_| ts.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,nudge_bot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let store = ReminderStore::new(&cli.db).await?;
    let offset = timeparse::local_now().offset();

    match cli.command {
        Commands::Init => {
            println!("Database ready at {}", cli.db);
        }
        Commands::Stats => {
            let totals = store.totals().await?;
            println!("{}", style("Store totals").color256(81).bold());
            println!("  users:            {}", totals.users);
            println!("  reminders:        {}", totals.reminders);
            println!("  active reminders: {}", totals.active_reminders);
            println!("  completions:      {}", totals.completions);
            println!("  log entries:      {}", totals.log_entries);
        }
        Commands::Users => {
            let users = store.list_users().await?;
            if users.is_empty() {
                println!("{}", style("No users yet.").color256(245));
            } else {
                for user in users {
                    println!(
                        "{:>4}  {:<10} {}  joined {}",
                        user.id,
                        user.platform,
                        user.platform_id,
                        format_ts(user.created_at, offset)
                    );
                }
            }
        }
        Commands::Reminders => {
            let rows = store.all_active_reminders().await?;
            if rows.is_empty() {
                println!("{}", style("No active reminders.").color256(245));
            } else {
                for (reminder, user) in rows {
                    let schedule = match reminder.kind {
                        ReminderKind::Recurring { interval_minutes } => {
                            format!("every {}", responses::format_interval(interval_minutes))
                        }
                        ReminderKind::OneTime { scheduled_at } => {
                            format!("at {}", format_ts(scheduled_at, offset))
                        }
                    };
                    let next = reminder
                        .next_send_at
                        .map(|ts| format_ts(ts, offset))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:>4}  {:<24} {:<32} {}  next {}",
                        reminder.id,
                        format!("{}:{}", user.platform, user.platform_id),
                        reminder.title,
                        schedule,
                        next
                    );
                }
            }
        }
        Commands::Logs { limit } => {
            let rows = store.latest_logs(limit.max(1)).await?;
            if rows.is_empty() {
                println!("{}", style("No log entries.").color256(245));
            } else {
                for (entry, user) in rows {
                    println!(
                        "{}  {:<24} {:<9} {}",
                        format_ts(entry.timestamp, offset),
                        format!("{}:{}", user.platform, user.platform_id),
                        entry.action.as_str(),
                        entry.reminder_title.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Commands::Clean { days, yes } => {
            let cutoff = timeparse::local_now()
                .unix_timestamp()
                .saturating_sub(days.max(0).saturating_mul(86_400));
            if yes {
                let removed = store.delete_inactive_created_before(cutoff).await?;
                println!("Removed {removed} inactive reminder(s) older than {days} day(s).");
            } else {
                let candidates = store.count_inactive_created_before(cutoff).await?;
                println!(
                    "{candidates} inactive reminder(s) older than {days} day(s). Re-run with --yes to delete."
                );
            }
        }
    }

    Ok(())
}
