use clap::Parser;
use tracing_subscriber::EnvFilter;

use nudge_bot::config::{Config, DatabaseConfig, ServerConfig};
use nudge_bot::daemon;
use nudge_bot::error::Result;

#[derive(Parser, Debug)]
#[command(name = "nudge-botd")]
#[command(about = "Nudge Bot reminder daemon")]
struct Cli {
    #[arg(long, env = "NUDGE_BOT_CONFIG")]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,nudge_bot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config = config.resolve_env();

    if let Some(host) = cli.host {
        config.server.get_or_insert_with(ServerConfig::default).host = Some(host);
    }
    if let Some(port) = cli.port {
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(db) = cli.db {
        config
            .database
            .get_or_insert_with(DatabaseConfig::default)
            .sqlite_path = Some(db);
    }

    daemon::run(config).await
}
