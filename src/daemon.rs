use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Form, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::commands::timeparse;
use crate::config::Config;
use crate::error::{NudgeBotError, Result};
use crate::interfaces::transport::Messenger;
use crate::scheduler::Scheduler;
use crate::services::lifecycle::ReminderService;
use crate::services::messages::MessageService;
use crate::services::sweep::{ReminderSweep, SweepJob};
use crate::store::ReminderStore;
use crate::transports::ChannelMessenger;

#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<MessageService>,
    pub service: Arc<ReminderService>,
    pub messenger: Arc<dyn Messenger>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct TwilioInbound {
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "Body", default)]
    body: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/twilio", post(twilio_webhook))
        .route("/webhook/telegram", post(telegram_webhook))
        .route("/api/reminders/:platform/:platform_id", get(user_reminders))
        .route("/api/stats/:platform/:platform_id", get(user_stats))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "nudge-bot".to_string(),
    })
}

async fn twilio_webhook(
    State(state): State<AppState>,
    Form(inbound): Form<TwilioInbound>,
) -> Response {
    let reply = state
        .messages
        .handle_message("twilio", &inbound.from, inbound.body.trim())
        .await;
    twiml(&reply)
}

// Telegram gets `{"ok":true}` no matter what; the reply itself goes out
// through the messenger.
async fn telegram_webhook(State(state): State<AppState>, Json(update): Json<Value>) -> Json<Value> {
    let Some(message) = update.get("message") else {
        return Json(json!({"ok": true}));
    };
    let chat_id = match message.get("chat").and_then(|chat| chat.get("id")) {
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::String(id)) => id.clone(),
        _ => return Json(json!({"ok": true})),
    };
    let text = message
        .get("text")
        .and_then(|value| value.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        return Json(json!({"ok": true}));
    }

    let reply = state.messages.handle_message("telegram", &chat_id, text).await;
    if !state.messenger.send("telegram", &chat_id, &reply).await {
        tracing::warn!(chat_id = %chat_id, "failed to deliver telegram reply");
    }
    Json(json!({"ok": true}))
}

async fn user_reminders(
    State(state): State<AppState>,
    Path((platform, platform_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let now = timeparse::local_now();
    let result = async {
        let user = state
            .service
            .get_or_create_user(&platform, &platform_id, now)
            .await?;
        let reminders = state.service.list_active(&user).await?;
        Ok::<_, NudgeBotError>(json!({"user": user, "reminders": reminders}))
    }
    .await;

    match result {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn user_stats(
    State(state): State<AppState>,
    Path((platform, platform_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let now = timeparse::local_now();
    let result = async {
        let user = state
            .service
            .get_or_create_user(&platform, &platform_id, now)
            .await?;
        let stats = state.service.stats(&user, now).await?;
        Ok::<_, NudgeBotError>(json!({"user": user, "stats": stats}))
    }
    .await;

    match result {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

fn twiml(text: &str) -> Response {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(text)
    );
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/xml")
        .body(Body::from(body))
        .unwrap()
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub async fn run(config: Config) -> Result<()> {
    run_with_shutdown(config, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = Arc::new(ReminderStore::new(config.sqlite_path()).await?);
    let service = Arc::new(ReminderService::new(store));
    let messenger: Arc<dyn Messenger> = Arc::new(ChannelMessenger::from_config(&config)?);
    let messages = Arc::new(MessageService::new(service.clone()));

    let sweep = Arc::new(ReminderSweep::new(
        service.clone(),
        messenger.clone(),
        Duration::from_secs(config.send_timeout_seconds()),
    ));
    let mut scheduler = Scheduler::new();
    scheduler.register_job(Arc::new(SweepJob::new(
        sweep,
        Duration::from_secs(config.poll_seconds()),
    )));
    scheduler.start();

    let state = AppState {
        messages,
        service,
        messenger,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NudgeBotError::Runtime(e.to_string()))?;
    tracing::info!(%addr, "nudge-bot daemon listening");

    let shutdown = async move {
        shutdown.await;
        scheduler.stop().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| NudgeBotError::Runtime(e.to_string()))?;

    Ok(())
}
