//! Conversation memory for Codewright.
//!
//! [`MemoryStore`] is an append-only, capacity-bounded message log with a
//! token-budgeted context window. Persistence is pluggable:
//!
//! - [`JsonBackend`]: one JSON document, rewritten on every change
//! - [`SqliteBackend`]: one row per message (feature `sqlite`)
//! - [`NoopBackend`]: nothing persisted

pub mod backend;
pub mod json;
pub mod noop;
pub mod store;
pub mod token;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::Path;

use tracing::warn;

pub use backend::ConversationBackend;
pub use json::JsonBackend;
pub use noop::NoopBackend;
pub use store::{MemorySummary, MemoryStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

/// Which persistence strategy a store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Json,
    Sqlite,
    None,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(BackendKind::Json),
            "sqlite" => Ok(BackendKind::Sqlite),
            "none" => Ok(BackendKind::None),
            other => Err(format!("unknown memory backend '{other}'")),
        }
    }
}

/// Build the backend for `kind` under `state_dir`. A SQLite database that
/// cannot be opened falls back to the no-op backend.
pub async fn create_backend(kind: BackendKind, state_dir: &Path) -> Box<dyn ConversationBackend> {
    match kind {
        BackendKind::Json => Box::new(JsonBackend::in_dir(state_dir)),
        BackendKind::None => Box::new(NoopBackend),
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => match SqliteBackend::in_dir(state_dir).await {
            Ok(b) => Box::new(b),
            Err(e) => {
                warn!(error = %e, "SQLite memory unavailable, conversation will not persist");
                Box::new(NoopBackend)
            }
        },
        #[cfg(not(feature = "sqlite"))]
        BackendKind::Sqlite => {
            warn!("Built without SQLite support, conversation will not persist");
            Box::new(NoopBackend)
        }
    }
}

/// Open and load the store for a project's state directory.
pub async fn open_store(kind: BackendKind, state_dir: &Path, max_messages: usize) -> MemoryStore {
    MemoryStore::open(create_backend(kind, state_dir).await, max_messages).await
}
