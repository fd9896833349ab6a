#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use time::macros::datetime;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use nudge_bot::interfaces::transport::Messenger;
use nudge_bot::services::lifecycle::ReminderService;
use nudge_bot::store::{ReminderStore, User};

pub fn fixed_now() -> OffsetDateTime {
    datetime!(2025-07-15 10:00 UTC)
}

pub async fn temp_store() -> (Arc<ReminderStore>, NamedTempFile) {
    let db = NamedTempFile::new().unwrap();
    let store = ReminderStore::new(db.path().to_str().unwrap())
        .await
        .unwrap();
    (Arc::new(store), db)
}

pub async fn temp_service() -> (Arc<ReminderService>, NamedTempFile) {
    let (store, db) = temp_store().await;
    (Arc::new(ReminderService::new(store)), db)
}

pub async fn telegram_user(service: &ReminderService, platform_id: &str) -> User {
    service
        .get_or_create_user("telegram", platform_id, fixed_now())
        .await
        .unwrap()
}

pub struct MockMessenger {
    pub sent: Mutex<Vec<(String, String, String)>>,
    pub fail_all: Mutex<bool>,
    pub fail_recipients: Mutex<HashSet<String>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_all: Mutex::new(false),
            fail_recipients: Mutex::new(HashSet::new()),
        }
    }

    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.lock().await = fail;
    }

    pub async fn fail_recipient(&self, recipient: &str) {
        self.fail_recipients
            .lock()
            .await
            .insert(recipient.to_string());
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, _, text)| text.clone())
            .collect()
    }

    pub async fn last_recipient(&self) -> Option<String> {
        self.sent
            .lock()
            .await
            .last()
            .map(|(_, recipient, _)| recipient.clone())
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, platform: &str, recipient: &str, text: &str) -> bool {
        if *self.fail_all.lock().await {
            return false;
        }
        if self.fail_recipients.lock().await.contains(recipient) {
            return false;
        }
        self.sent.lock().await.push((
            platform.to_string(),
            recipient.to_string(),
            text.to_string(),
        ));
        true
    }
}
