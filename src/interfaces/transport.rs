use async_trait::async_trait;

/// Outbound message delivery. Implementations report acceptance as a plain
/// bool; callers treat `false` as retry-later and never unwind.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, platform: &str, recipient: &str, text: &str) -> bool;
}
