use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::commands::timeparse;
use crate::error::Result;
use crate::interfaces::scheduler::ScheduledJob;
use crate::interfaces::transport::Messenger;
use crate::services::lifecycle::ReminderService;
use crate::services::responses;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct ReminderSweep {
    service: Arc<ReminderService>,
    messenger: Arc<dyn Messenger>,
    send_timeout: Duration,
}

impl ReminderSweep {
    pub fn new(
        service: Arc<ReminderService>,
        messenger: Arc<dyn Messenger>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            service,
            messenger,
            send_timeout,
        }
    }

    /// Failed or timed-out sends leave the row untouched for the next pass.
    /// A `done` landing mid-sweep is not locked out either: per-row
    /// transactions keep both writes intact, and the worst case is one extra
    /// push for a just-completed reminder, or a completion rescheduling a
    /// reminder this sweep already advanced. Both settle by the next tick.
    pub async fn run_sweep(&self, now: OffsetDateTime) -> Result<SweepOutcome> {
        let due = self.service.due_reminders(now).await?;
        let mut outcome = SweepOutcome {
            due: due.len(),
            ..SweepOutcome::default()
        };

        for (reminder, user) in due {
            let text = responses::reminder_push(&reminder.title);
            let send = self
                .messenger
                .send(&user.platform, &user.platform_id, &text);
            let delivered = match tokio::time::timeout(self.send_timeout, send).await {
                Ok(accepted) => accepted,
                Err(_) => {
                    tracing::warn!(
                        reminder = reminder.id,
                        platform = %user.platform,
                        "send timed out"
                    );
                    false
                }
            };

            if !delivered {
                tracing::warn!(
                    reminder = reminder.id,
                    recipient = %user.platform_id,
                    "delivery failed, retrying next sweep"
                );
                outcome.failed += 1;
                continue;
            }

            match self.service.mark_sent(&reminder, now).await {
                Ok(()) => outcome.sent += 1,
                Err(err) => {
                    tracing::error!(
                        reminder = reminder.id,
                        error = %err,
                        "sent but could not record delivery"
                    );
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}

pub struct SweepJob {
    sweep: Arc<ReminderSweep>,
    interval: Duration,
}

impl SweepJob {
    pub fn new(sweep: Arc<ReminderSweep>, interval: Duration) -> Self {
        Self { sweep, interval }
    }
}

#[async_trait]
impl ScheduledJob for SweepJob {
    fn name(&self) -> &str {
        "reminder_sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<()> {
        let outcome = self.sweep.run_sweep(timeparse::local_now()).await?;
        if outcome.due > 0 {
            tracing::info!(
                due = outcome.due,
                sent = outcome.sent,
                failed = outcome.failed,
                "reminder sweep finished"
            );
        }
        Ok(())
    }
}
