//! JSON document backend: the whole log as one pretty-printed array.
//!
//! Storage location: `<project>/.codewright/memory.json`
//!
//! Every mutation rewrites the document in full. Writes go to a sibling
//! temp file first and are renamed into place, so a crash mid-write leaves
//! the previous document intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use codewright_core::Message;
use codewright_core::error::MemoryError;
use tracing::{debug, warn};

use crate::backend::ConversationBackend;

pub struct JsonBackend {
    path: PathBuf,
}

impl JsonBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<state_dir>/memory.json`
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join("memory.json"))
    }

    fn write_all(&self, log: &[Message]) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MemoryError::Storage(format!("Failed to create memory directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(log)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize memory: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| MemoryError::Storage(format!("Failed to replace memory file: {e}")))?;

        debug!(path = %self.path.display(), count = log.len(), "Memory document written");
        Ok(())
    }
}

#[async_trait]
impl ConversationBackend for JsonBackend {
    fn name(&self) -> &str {
        "json"
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    async fn load(&self) -> Result<Vec<Message>, MemoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MemoryError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<serde_json::Value> = serde_json::from_str(&content).map_err(|e| MemoryError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        // One bad record should not cost the rest of the conversation.
        let messages = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| match serde_json::from_value::<Message>(record) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(index = i, error = %e, "Skipping corrupted memory record");
                    None
                }
            })
            .collect();

        Ok(messages)
    }

    async fn append(&self, _added: &Message, log: &[Message], _evicted: usize) -> Result<(), MemoryError> {
        self.write_all(log)
    }

    async fn rewrite(&self, log: &[Message]) -> Result<(), MemoryError> {
        self.write_all(log)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemoryError::Io(e)),
        }
    }
}
