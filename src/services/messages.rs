use std::sync::Arc;

use time::OffsetDateTime;

use crate::commands::{self, timeparse, Command};
use crate::error::{NudgeBotError, Result};
use crate::services::lifecycle::ReminderService;
use crate::services::responses;

pub struct MessageService {
    service: Arc<ReminderService>,
}

impl MessageService {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self { service }
    }

    pub async fn handle_message(&self, platform: &str, platform_id: &str, text: &str) -> String {
        let now = timeparse::local_now();
        self.handle_message_at(platform, platform_id, text, now)
            .await
    }

    pub async fn handle_message_at(
        &self,
        platform: &str,
        platform_id: &str,
        text: &str,
        now: OffsetDateTime,
    ) -> String {
        match self.dispatch(platform, platform_id, text, now).await {
            Ok(reply) => reply,
            Err(NudgeBotError::Validation(message)) => message,
            Err(err) => {
                tracing::error!(platform, error = %err, "failed to process inbound message");
                responses::storage_apology()
            }
        }
    }

    async fn dispatch(
        &self,
        platform: &str,
        platform_id: &str,
        text: &str,
        now: OffsetDateTime,
    ) -> Result<String> {
        let user = self
            .service
            .get_or_create_user(platform, platform_id, now)
            .await?;

        let reply = match commands::parse(text, now) {
            Command::Done => match self.service.mark_done(&user, now).await? {
                Some(reminder) => responses::reminder_done(&reminder),
                None => responses::nothing_to_complete(),
            },
            Command::Stats => {
                let stats = self.service.stats(&user, now).await?;
                responses::stats_summary(&stats, now.offset())
            }
            Command::List => {
                let reminders = self.service.list_active(&user).await?;
                responses::reminder_list(&reminders, now.offset())
            }
            Command::CancelAll => {
                let count = self.service.cancel(&user, None, now).await?;
                responses::reminders_cancelled(count, None)
            }
            Command::Cancel { keyword } => {
                let count = self.service.cancel(&user, Some(&keyword), now).await?;
                responses::reminders_cancelled(count, Some(&keyword))
            }
            Command::RemindRecurring {
                title,
                interval_minutes,
            } => {
                let reminder = self
                    .service
                    .create_recurring(&user, &title, interval_minutes, now)
                    .await?;
                responses::reminder_created(&reminder, now.offset())
            }
            Command::RemindOnce {
                title,
                scheduled_at,
            } => match scheduled_at {
                Some(scheduled_at) => {
                    let reminder = self
                        .service
                        .create_one_time(&user, &title, scheduled_at, now)
                        .await?;
                    responses::reminder_created(&reminder, now.offset())
                }
                None => responses::could_not_parse_time(),
            },
            Command::Unknown => responses::unknown_command(),
        };
        Ok(reply)
    }
}
