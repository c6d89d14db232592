//! Subcommand implementations and the setup they share.

pub mod chat;
pub mod init;
pub mod memory;
pub mod run;
pub mod scan;
pub mod status;
pub mod tools;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use codewright_agent::AgentLoop;
use codewright_config::AppConfig;
use codewright_memory::{BackendKind, MemoryStore};
use codewright_providers::OpenAiCompatProvider;
use tracing::debug;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Canonical project directory.
pub fn resolve_root(path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let root = std::fs::canonicalize(path)
        .map_err(|e| format!("Project path {} is not accessible: {e}", path.display()))?;
    if !root.is_dir() {
        return Err(format!("{} is not a directory", root.display()).into());
    }
    Ok(root)
}

pub fn load_config(root: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load_for_project(root).map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The project's conversation store, loaded.
pub async fn open_memory(root: &Path, config: &AppConfig) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let kind: BackendKind = config.memory.backend.parse()?;
    let store = codewright_memory::open_store(kind, &AppConfig::state_dir(root), config.memory.max_messages).await;
    debug!(backend = ?kind, messages = store.len(), "Conversation loaded");
    Ok(store)
}

/// Provider, tools and loop settings for an agent working in `root`.
pub fn build_agent(root: &Path, config: &AppConfig) -> Result<AgentLoop, Box<dyn std::error::Error>> {
    let provider = OpenAiCompatProvider::from_config(config).map_err(|e| {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CODEWRIGHT_API_KEY='sk-...'");
        eprintln!("    OPENAI_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add `api_key` to one of:");
        eprintln!("    {}", AppConfig::project_config_path(root).display());
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        format!("{e}")
    })?;

    let tools = Arc::new(codewright_tools::default_registry());
    let ctx = codewright_agent::execution_context(root, config);

    Ok(AgentLoop::from_config(Arc::new(provider), tools, ctx, config))
}
