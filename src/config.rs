use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{NudgeBotError, Result};

pub const DEFAULT_SQLITE_PATH: &str = "./data/nudge-bot.db";
pub const DEFAULT_POLL_SECONDS: u64 = 60;
pub const DEFAULT_SEND_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessagingConfig {
    pub telegram: Option<TelegramConfig>,
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SweepConfig {
    pub poll_seconds: Option<u64>,
    pub send_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub database: Option<DatabaseConfig>,
    pub messaging: Option<MessagingConfig>,
    pub sweep: Option<SweepConfig>,
    pub server: Option<ServerConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| NudgeBotError::Config(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| NudgeBotError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn resolve_env(mut self) -> Self {
        let messaging = self.messaging.get_or_insert_with(MessagingConfig::default);
        if let Ok(token) = std::env::var("NUDGE_BOT_TELEGRAM_TOKEN") {
            let telegram = messaging.telegram.get_or_insert_with(TelegramConfig::default);
            if telegram.bot_token.is_none() {
                telegram.bot_token = Some(token);
            }
        }
        let sid = std::env::var("NUDGE_BOT_TWILIO_SID").ok();
        let token = std::env::var("NUDGE_BOT_TWILIO_TOKEN").ok();
        let from = std::env::var("NUDGE_BOT_TWILIO_FROM").ok();
        if sid.is_some() || token.is_some() || from.is_some() {
            let twilio = messaging.twilio.get_or_insert_with(TwilioConfig::default);
            if twilio.account_sid.is_none() {
                twilio.account_sid = sid;
            }
            if twilio.auth_token.is_none() {
                twilio.auth_token = token;
            }
            if twilio.from_number.is_none() {
                twilio.from_number = from;
            }
        }
        self
    }

    pub fn sqlite_path(&self) -> String {
        self.database
            .as_ref()
            .and_then(|db| db.sqlite_path.clone())
            .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
    }

    pub fn telegram(&self) -> Option<&TelegramConfig> {
        self.messaging.as_ref().and_then(|m| m.telegram.as_ref())
    }

    pub fn twilio(&self) -> Option<&TwilioConfig> {
        self.messaging.as_ref().and_then(|m| m.twilio.as_ref())
    }

    pub fn poll_seconds(&self) -> u64 {
        self.sweep
            .as_ref()
            .and_then(|s| s.poll_seconds)
            .unwrap_or(DEFAULT_POLL_SECONDS)
            .max(1)
    }

    pub fn send_timeout_seconds(&self) -> u64 {
        self.sweep
            .as_ref()
            .and_then(|s| s.send_timeout_seconds)
            .unwrap_or(DEFAULT_SEND_TIMEOUT_SECONDS)
            .max(1)
    }

    pub fn host(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }
}
