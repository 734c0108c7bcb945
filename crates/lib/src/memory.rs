//! Conversation memory for the retrieval-augmented answer mode.
//!
//! Sessions are keyed by an opaque string (the interaction's channel id when
//! present) and hold ordered user/assistant messages. History is ephemeral:
//! a session that has not been touched within the TTL is evicted on the next
//! access, mirroring an external cache's expiry behavior.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A single remembered message (role + content).
#[derive(Debug, Clone)]
pub struct MemoryMessage {
    pub role: String,
    pub content: String,
}

impl MemoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Conversation history store. The external TTL cache is a collaborator
/// behind this seam; [`TtlMemory`] is the bundled implementation.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Ordered history for the session, empty when absent or expired.
    async fn history(&self, key: &str) -> Vec<MemoryMessage>;
    /// Append one message, creating or refreshing the session.
    async fn append(&self, key: &str, message: MemoryMessage);
}

struct Entry {
    touched: Instant,
    messages: Vec<MemoryMessage>,
}

/// In-process conversation store with per-session TTL eviction.
pub struct TtlMemory {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl TtlMemory {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn expired(&self, entry: &Entry) -> bool {
        entry.touched.elapsed() >= self.ttl
    }
}

#[async_trait]
impl ConversationMemory for TtlMemory {
    async fn history(&self, key: &str) -> Vec<MemoryMessage> {
        let mut g = self.inner.write().await;
        match g.get(key) {
            Some(entry) if !self.expired(entry) => entry.messages.clone(),
            Some(_) => {
                g.remove(key);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn append(&self, key: &str, message: MemoryMessage) {
        let mut g = self.inner.write().await;
        let entry = g.entry(key.to_string()).or_insert_with(|| Entry {
            touched: Instant::now(),
            messages: Vec::new(),
        });
        if self.expired(entry) {
            entry.messages.clear();
        }
        entry.touched = Instant::now();
        entry.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_roundtrip_within_ttl() {
        let memory = TtlMemory::new(Duration::from_secs(60));
        memory.append("chan-1", MemoryMessage::user("hello")).await;
        memory
            .append("chan-1", MemoryMessage::assistant("hi there"))
            .await;
        let history = memory.history("chan-1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].content, "hi there");
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let memory = TtlMemory::new(Duration::from_secs(60));
        memory.append("chan-1", MemoryMessage::user("one")).await;
        assert!(memory.history("chan-2").await.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_evicts_immediately() {
        let memory = TtlMemory::new(Duration::ZERO);
        memory.append("chan-1", MemoryMessage::user("hello")).await;
        assert!(memory.history("chan-1").await.is_empty());
    }
}
