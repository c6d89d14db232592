//! The conversation log.
//!
//! [`MemoryStore`] owns every [`Message`] of a project's conversation. The
//! in-memory log is the source of truth for the session; the backend is
//! told about each mutation and only consulted again on [`MemoryStore::load`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use codewright_core::error::MemoryError;
use codewright_core::{ChatMessage, Message, Role};
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::ConversationBackend;
use crate::token;

pub const DEFAULT_MAX_MESSAGES: usize = 1000;

/// Counts reported by `memory stats`.
#[derive(Debug, Clone, Serialize)]
pub struct MemorySummary {
    pub total_messages: usize,
    pub backend: String,
    pub path: Option<PathBuf>,
    pub roles: BTreeMap<Role, usize>,
    pub estimated_tokens: usize,
}

pub struct MemoryStore {
    messages: Vec<Message>,
    backend: Box<dyn ConversationBackend>,
    max_messages: usize,
}

impl MemoryStore {
    /// An empty store. Call [`load`](Self::load) to restore persisted history.
    pub fn new(backend: Box<dyn ConversationBackend>) -> Self {
        Self {
            messages: Vec::new(),
            backend,
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.max(1);
        self
    }

    /// Create and load in one step.
    pub async fn open(backend: Box<dyn ConversationBackend>, max_messages: usize) -> Self {
        let mut store = Self::new(backend).with_max_messages(max_messages);
        store.load().await;
        store
    }

    /// Restore the log from the backend, returning how many messages were
    /// loaded. An unreadable or corrupt store yields an empty log.
    pub async fn load(&mut self) -> usize {
        self.messages = match self.backend.load().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(backend = %self.backend.name(), error = %e, "Memory store unreadable, starting empty");
                Vec::new()
            }
        };

        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }

        debug!(backend = %self.backend.name(), count = self.messages.len(), "Memory loaded");
        self.messages.len()
    }

    /// Append a message, persist it, and evict from the oldest end past the
    /// capacity. Persistence failures are logged, never returned.
    pub async fn add(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Message {
        let message = Message::new(role, content).with_metadata(metadata);
        self.messages.push(message.clone());

        let evicted = self.messages.len().saturating_sub(self.max_messages);
        if evicted > 0 {
            self.messages.drain(..evicted);
        }

        if let Err(e) = self.backend.append(&message, &self.messages, evicted).await {
            warn!(backend = %self.backend.name(), error = %e, "Failed to persist message");
        }

        message
    }

    /// The longest suffix of the log whose content fits in `max_tokens`,
    /// oldest first. A message that would overflow the budget ends the walk,
    /// even if older, shorter ones would still fit.
    pub fn get_context_window(&self, max_tokens: usize) -> Vec<ChatMessage> {
        let budget = token::char_budget(max_tokens);
        let mut used = 0usize;
        let mut start = self.messages.len();

        for (i, message) in self.messages.iter().enumerate().rev() {
            let cost = message.content.chars().count();
            if used + cost > budget {
                break;
            }
            used += cost;
            start = i;
        }

        self.messages[start..].iter().map(Message::to_chat).collect()
    }

    /// Rewrite the full log to the backend.
    pub async fn save(&self) -> Result<(), MemoryError> {
        self.backend.rewrite(&self.messages).await
    }

    /// Forget everything, in memory and on disk.
    pub async fn clear(&mut self) -> Result<(), MemoryError> {
        self.messages.clear();
        self.backend.clear().await
    }

    /// Set a metadata key on the newest message. Returns false when the log
    /// is empty.
    pub async fn annotate_last(&mut self, key: &str, value: impl Into<serde_json::Value>) -> bool {
        let Some(last) = self.messages.last_mut() else {
            return false;
        };
        last.metadata.insert(key.to_string(), value.into());

        if let Err(e) = self.backend.rewrite(&self.messages).await {
            warn!(backend = %self.backend.name(), error = %e, "Failed to persist annotation");
        }
        true
    }

    pub fn get_summary(&self) -> MemorySummary {
        let mut roles = BTreeMap::new();
        for message in &self.messages {
            *roles.entry(message.role).or_insert(0) += 1;
        }

        MemorySummary {
            total_messages: self.messages.len(),
            backend: self.backend.name().to_string(),
            path: self.backend.location().map(|p| p.to_path_buf()),
            roles,
            estimated_tokens: self.messages.iter().map(|m| token::estimate_tokens(&m.content)).sum(),
        }
    }

    /// The full log, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The newest `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonBackend;
    use crate::noop::NoopBackend;
    use async_trait::async_trait;
    use std::path::Path;

    fn meta() -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    fn json_store(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::new(Box::new(JsonBackend::in_dir(dir.path())))
    }

    /// Fails every write.
    struct BrokenBackend;

    #[async_trait]
    impl ConversationBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }
        fn location(&self) -> Option<&Path> {
            None
        }
        async fn load(&self) -> Result<Vec<Message>, MemoryError> {
            Err(MemoryError::Storage("disk on fire".into()))
        }
        async fn append(&self, _: &Message, _: &[Message], _: usize) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("disk on fire".into()))
        }
        async fn rewrite(&self, _: &[Message]) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("disk on fire".into()))
        }
        async fn clear(&self) -> Result<(), MemoryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn add_appends_in_order() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        store.add(Role::User, "hello", meta()).await;
        store.add(Role::Assistant, "hi there", meta()).await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].content, "hello");
        assert_eq!(store.messages()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_first() {
        let mut store = MemoryStore::new(Box::new(NoopBackend)).with_max_messages(3);
        for i in 0..5 {
            store.add(Role::User, format!("m{i}"), meta()).await;
        }

        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn default_capacity_holds_a_thousand() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        for i in 0..1001 {
            store.add(Role::User, format!("{i}"), meta()).await;
        }
        assert_eq!(store.len(), 1000);
        assert_eq!(store.messages()[0].content, "1");
        assert_eq!(store.messages()[999].content, "1000");
    }

    #[tokio::test]
    async fn window_is_a_budgeted_suffix() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        store.add(Role::User, "a".repeat(40), meta()).await; // 10 tokens
        store.add(Role::Assistant, "b".repeat(20), meta()).await; // 5 tokens
        store.add(Role::User, "c".repeat(8), meta()).await; // 2 tokens

        let window = store.get_context_window(7);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "b".repeat(20));
        assert_eq!(window[1].content, "c".repeat(8));

        // Exact fit includes everything.
        assert_eq!(store.get_context_window(17).len(), 3);
        // Budget too small for the newest message yields nothing.
        assert!(store.get_context_window(1).is_empty());
    }

    #[tokio::test]
    async fn window_stops_at_first_overflow() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        store.add(Role::User, "x", meta()).await;
        store.add(Role::Assistant, "y".repeat(400), meta()).await;
        store.add(Role::User, "z", meta()).await;

        // "x" would fit on its own, but the walk stops at the large message.
        let window = store.get_context_window(10);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content, "z");
    }

    #[tokio::test]
    async fn window_is_idempotent() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        for i in 0..20 {
            store.add(Role::User, format!("message number {i}"), meta()).await;
        }
        assert_eq!(store.get_context_window(30), store.get_context_window(30));
    }

    #[tokio::test]
    async fn json_round_trip_through_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = json_store(&dir);
            store.add(Role::User, "persist me", meta()).await;
            store.add(Role::Assistant, "done", meta()).await;
        }

        let mut reopened = json_store(&dir);
        assert_eq!(reopened.load().await, 2);
        assert_eq!(reopened.messages()[0].content, "persist me");
        assert_eq!(reopened.messages()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn corrupt_store_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.json"), "garbage").unwrap();

        let mut store = json_store(&dir);
        assert_eq!(store.load().await, 0);
        assert!(store.is_empty());

        // The store still works afterwards.
        store.add(Role::User, "fresh start", meta()).await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn persistence_failures_are_silent() {
        let mut store = MemoryStore::new(Box::new(BrokenBackend));
        assert_eq!(store.load().await, 0);
        let msg = store.add(Role::User, "still here", meta()).await;
        assert_eq!(msg.content, "still here");
        assert_eq!(store.len(), 1);
        assert!(store.save().await.is_err());
    }

    #[tokio::test]
    async fn load_trims_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = json_store(&dir);
        for i in 0..5 {
            store.add(Role::User, format!("{i}"), meta()).await;
        }

        let mut small = MemoryStore::new(Box::new(JsonBackend::in_dir(dir.path()))).with_max_messages(2);
        assert_eq!(small.load().await, 2);
        assert_eq!(small.messages()[0].content, "3");
    }

    #[tokio::test]
    async fn annotate_last_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = json_store(&dir);
        assert!(!store.annotate_last("kind", "error").await);

        store.add(Role::User, "run it", meta()).await;
        assert!(store.annotate_last("kind", "error").await);

        let mut reopened = json_store(&dir);
        reopened.load().await;
        assert_eq!(reopened.messages()[0].metadata["kind"], "error");
    }

    #[tokio::test]
    async fn clear_forgets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = json_store(&dir);
        store.add(Role::User, "x", meta()).await;
        store.clear().await.unwrap();
        assert!(store.is_empty());

        let mut reopened = json_store(&dir);
        assert_eq!(reopened.load().await, 0);
    }

    #[tokio::test]
    async fn summary_counts_roles() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        store.add(Role::User, "abcd", meta()).await;
        store.add(Role::Assistant, "abcdefgh", meta()).await;
        store.add(Role::User, "ab", meta()).await;

        let summary = store.get_summary();
        assert_eq!(summary.total_messages, 3);
        assert_eq!(summary.backend, "none");
        assert!(summary.path.is_none());
        assert_eq!(summary.roles[&Role::User], 2);
        assert_eq!(summary.roles[&Role::Assistant], 1);
        assert_eq!(summary.estimated_tokens, 4);
    }

    #[tokio::test]
    async fn recent_returns_tail() {
        let mut store = MemoryStore::new(Box::new(NoopBackend));
        for i in 0..4 {
            store.add(Role::User, format!("{i}"), meta()).await;
        }
        let tail: Vec<&str> = store.recent(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["2", "3"]);
        assert_eq!(store.recent(10).len(), 4);
    }
}
