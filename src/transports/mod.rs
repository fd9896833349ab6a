use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::error::{NudgeBotError, Result};
use crate::interfaces::transport::Messenger;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(3))
        .timeout(timeout)
        .build()
        .map_err(|e| NudgeBotError::Transport(e.to_string()))
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

pub struct TelegramMessenger {
    client: reqwest::Client,
    bot_token: String,
    api_base: String,
}

impl TelegramMessenger {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_api_base(bot_token, TELEGRAM_API_BASE, timeout)
    }

    pub fn with_api_base(
        bot_token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            bot_token: bot_token.into(),
            api_base: trim_base(api_base.into()),
        })
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| NudgeBotError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NudgeBotError::Transport(format!(
                "telegram api returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

pub struct TwilioMessenger {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

impl TwilioMessenger {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_api_base(account_sid, auth_token, from_number, TWILIO_API_BASE, timeout)
    }

    pub fn with_api_base(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_base: trim_base(api_base.into()),
        })
    }

    pub async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| NudgeBotError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NudgeBotError::Transport(format!(
                "twilio api returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ChannelMessenger {
    telegram: Option<TelegramMessenger>,
    twilio: Option<TwilioMessenger>,
}

impl ChannelMessenger {
    pub fn with_channels(
        telegram: Option<TelegramMessenger>,
        twilio: Option<TwilioMessenger>,
    ) -> Self {
        Self { telegram, twilio }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.send_timeout_seconds());
        let mut messenger = ChannelMessenger::default();

        if let Some(telegram) = config.telegram() {
            match &telegram.bot_token {
                Some(token) => {
                    let api_base = telegram
                        .api_base
                        .clone()
                        .unwrap_or_else(|| TELEGRAM_API_BASE.to_string());
                    messenger.telegram = Some(TelegramMessenger::with_api_base(
                        token.clone(),
                        api_base,
                        timeout,
                    )?);
                }
                None => tracing::warn!("telegram config has no bot_token, channel disabled"),
            }
        }

        if let Some(twilio) = config.twilio() {
            match (
                &twilio.account_sid,
                &twilio.auth_token,
                &twilio.from_number,
            ) {
                (Some(sid), Some(token), Some(from)) => {
                    let api_base = twilio
                        .api_base
                        .clone()
                        .unwrap_or_else(|| TWILIO_API_BASE.to_string());
                    messenger.twilio = Some(TwilioMessenger::with_api_base(
                        sid.clone(),
                        token.clone(),
                        from.clone(),
                        api_base,
                        timeout,
                    )?);
                }
                _ => tracing::warn!("twilio config incomplete, channel disabled"),
            }
        }

        Ok(messenger)
    }
}

#[async_trait]
impl Messenger for ChannelMessenger {
    async fn send(&self, platform: &str, recipient: &str, text: &str) -> bool {
        let result = match platform {
            "telegram" => match &self.telegram {
                Some(telegram) => telegram.send_message(recipient, text).await,
                None => Err(NudgeBotError::Transport(
                    "telegram channel not configured".to_string(),
                )),
            },
            "twilio" => match &self.twilio {
                Some(twilio) => twilio.send_sms(recipient, text).await,
                None => Err(NudgeBotError::Transport(
                    "twilio channel not configured".to_string(),
                )),
            },
            other => Err(NudgeBotError::Transport(format!(
                "unknown platform: {}",
                other
            ))),
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(platform, recipient, error = %err, "message send failed");
                false
            }
        }
    }
}
