//! No-op backend: keeps the conversation for this process only.

use std::path::Path;

use async_trait::async_trait;
use codewright_core::Message;
use codewright_core::error::MemoryError;

use crate::backend::ConversationBackend;

/// A backend that persists nothing.
pub struct NoopBackend;

#[async_trait]
impl ConversationBackend for NoopBackend {
    fn name(&self) -> &str {
        "none"
    }

    fn location(&self) -> Option<&Path> {
        None
    }

    async fn load(&self) -> Result<Vec<Message>, MemoryError> {
        Ok(Vec::new())
    }

    async fn append(&self, _added: &Message, _log: &[Message], _evicted: usize) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn rewrite(&self, _log: &[Message]) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        Ok(())
    }
}
