pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod interfaces;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod transports;

pub use crate::config::Config;
pub use crate::error::{NudgeBotError, Result};
pub use crate::services::lifecycle::{ReminderService, UserStats};
pub use crate::services::messages::MessageService;
pub use crate::store::{Reminder, ReminderKind, ReminderStore, User};
