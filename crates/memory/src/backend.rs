//! The persistence seam behind [`MemoryStore`](crate::MemoryStore).
//!
//! The store keeps the whole log in memory and tells the backend about each
//! mutation. Backends differ only in how they write; what they load back
//! must be the log they were given, in order.

use std::path::Path;

use async_trait::async_trait;
use codewright_core::Message;
use codewright_core::error::MemoryError;

#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Short name shown in summaries ("json", "sqlite", "none").
    fn name(&self) -> &str;

    /// Where the log lives on disk, if anywhere.
    fn location(&self) -> Option<&Path>;

    /// Read the persisted log, oldest first.
    async fn load(&self) -> Result<Vec<Message>, MemoryError>;

    /// `added` was just pushed onto `log`, and `evicted` messages were
    /// dropped from its front to respect the capacity.
    async fn append(&self, added: &Message, log: &[Message], evicted: usize) -> Result<(), MemoryError>;

    /// Replace everything persisted with `log`.
    async fn rewrite(&self, log: &[Message]) -> Result<(), MemoryError>;

    /// Delete all persisted state.
    async fn clear(&self) -> Result<(), MemoryError>;
}
