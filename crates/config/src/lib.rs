//! Configuration loading, validation, and management for Codewright.
//!
//! Loads configuration from `<project>/.codewright/config.toml`, falling back
//! to `~/.codewright/config.toml`, with environment variable overrides.
//! Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project state directory (memory store, local config).
pub const STATE_DIR: &str = ".codewright";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible chat-completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Stream replies fragment by fragment
    #[serde(default)]
    pub stream: bool,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("stream", &self.stream)
            .field("memory", &self.memory)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "json", "sqlite" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Oldest messages are evicted past this count
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Token budget of the context window sent to the model
    #[serde(default = "default_context_tokens")]
    pub context_tokens: usize,
}

fn default_memory_backend() -> String {
    "json".into()
}
fn default_max_messages() -> usize {
    1000
}
fn default_context_tokens() -> usize {
    6000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            max_messages: default_max_messages(),
            context_tokens: default_context_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Actions executed per request before the loop gives up
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Consecutive failures tolerated under the "separate" failure policy
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// "shared": failed actions spend turns like any other.
    /// "separate": failed actions draw on `max_retries` instead.
    #[serde(default = "default_failure_policy")]
    pub failure_policy: String,

    /// Tool output longer than this is truncated in observations
    #[serde(default = "default_observation_max_chars")]
    pub observation_max_chars: usize,
}

fn default_max_turns() -> usize {
    15
}
fn default_max_retries() -> u32 {
    3
}
fn default_failure_policy() -> String {
    "shared".into()
}
fn default_observation_max_chars() -> usize {
    8000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_retries: default_max_retries(),
            failure_policy: default_failure_policy(),
            observation_max_chars: default_observation_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Refuse shell commands containing a dangerous pattern
    #[serde(default = "default_true")]
    pub safe_mode: bool,

    /// Commit after each successful file edit
    #[serde(default)]
    pub auto_commit: bool,

    #[serde(default = "default_dangerous_patterns")]
    pub dangerous_patterns: Vec<String>,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Directory names skipped when listing and scanning
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

fn default_dangerous_patterns() -> Vec<String> {
    ["rm -rf /", "sudo rm", "chmod 777 /", "> /dev/sda"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_command_timeout() -> u64 {
    60
}
fn default_exclude_dirs() -> Vec<String> {
    [".git", STATE_DIR, "node_modules", "target", "__pycache__", ".venv", "venv", ".idea", ".vscode"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            auto_commit: false,
            dangerous_patterns: default_dangerous_patterns(),
            command_timeout_secs: default_command_timeout(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the global config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. `~/.codewright/config.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_dir().join("config.toml"))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration for a project. A project-local
    /// `.codewright/config.toml` replaces the global file when present.
    pub fn load_for_project(root: &Path) -> Result<Self, ConfigError> {
        let local = Self::project_config_path(root);
        let mut config = if local.exists() {
            Self::load_from(&local)?
        } else {
            Self::load_from(&Self::config_dir().join("config.toml"))?
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("CODEWRIGHT_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("CODEWRIGHT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("CODEWRIGHT_MODEL") {
            self.model = model;
        }
    }

    /// Get the global configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(STATE_DIR)
    }

    /// Per-project state directory.
    pub fn state_dir(root: &Path) -> PathBuf {
        root.join(STATE_DIR)
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        Self::state_dir(root).join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.memory.backend.as_str(), "json" | "sqlite" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be one of json, sqlite, none (got '{}')",
                self.memory.backend
            )));
        }

        if self.memory.max_messages == 0 || self.memory.context_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_messages and memory.context_tokens must be > 0".into(),
            ));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError("agent.max_turns must be > 0".into()));
        }

        if !matches!(self.agent.failure_policy.as_str(), "shared" | "separate") {
            return Err(ConfigError::ValidationError(format!(
                "agent.failure_policy must be 'shared' or 'separate' (got '{}')",
                self.agent.failure_policy
            )));
        }

        if self.tools.command_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.command_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream: false,
            memory: MemoryConfig::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.memory.backend, "json");
        assert_eq!(config.memory.max_messages, 1000);
        assert_eq!(config.agent.max_turns, 15);
        assert!(config.tools.safe_mode);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.tools.dangerous_patterns, config.tools.dangerous_patterns);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_and_policy_rejected() {
        let mut config = AppConfig::default();
        config.memory.backend = "redis".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.agent.failure_policy = "lenient".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "model = \"local-coder\"\n\n[memory]\nbackend = \"sqlite\"\n\n[agent]\nmax_turns = 4\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "local-coder");
        assert_eq!(config.memory.backend, "sqlite");
        assert_eq!(config.memory.context_tokens, 6000);
        assert_eq!(config.agent.max_turns, 4);
        assert_eq!(config.agent.failure_policy, "shared");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [unclosed").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn project_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(AppConfig::state_dir(dir.path())).unwrap();
        std::fs::write(AppConfig::project_config_path(dir.path()), "temperature = 0.1\n").unwrap();

        let config = AppConfig::load_for_project(dir.path()).unwrap();
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("CODEWRIGHT_MODEL", "coder-large"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.model, "coder-large");
        assert_eq!(config.base_url, default_base_url());
    }

    #[test]
    fn codewright_key_wins_over_openai_key() {
        let mut config = AppConfig::default();
        config.apply_env(|k| match k {
            "CODEWRIGHT_API_KEY" => Some("cw".into()),
            "OPENAI_API_KEY" => Some("oa".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("cw"));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("[memory]"));
        assert!(toml_str.contains("sudo rm"));
    }
}
