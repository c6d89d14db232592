//! Per-session execution settings shared read-only by every tool call.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Substrings that make a shell command refuse to run while safe mode is on.
pub const DEFAULT_DANGEROUS_PATTERNS: &[&str] = &["rm -rf /", "sudo rm", "chmod 777 /", "> /dev/sda"];

/// Directory names skipped by listing and scanning.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".codewright",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
];

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Every relative path a tool receives is resolved against this root,
    /// and shell commands run with it as their working directory.
    pub project_root: PathBuf,

    /// Consecutive failed actions tolerated under the separate failure budget.
    pub max_retries: u32,

    /// Enables the dangerous-command denylist.
    pub safe_mode: bool,

    /// Commit after every successful file edit.
    pub auto_commit: bool,

    pub dangerous_patterns: Vec<String>,

    /// Applies when `execute_command` is called without a `timeout` argument.
    pub command_timeout: Duration,

    pub exclude_dirs: Vec<String>,
}

impl ExecutionContext {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            max_retries: 3,
            safe_mode: true,
            auto_commit: false,
            dangerous_patterns: DEFAULT_DANGEROUS_PATTERNS.iter().map(|s| s.to_string()).collect(),
            command_timeout: Duration::from_secs(60),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.project_root
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    pub fn with_dangerous_patterns(mut self, patterns: Vec<String>) -> Self {
        self.dangerous_patterns = patterns;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_exclude_dirs(mut self, dirs: Vec<String>) -> Self {
        self.exclude_dirs = dirs;
        self
    }

    /// True when `name` is one of the excluded directory names.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let ctx = ExecutionContext::new("/tmp/project");
        assert!(ctx.safe_mode);
        assert!(!ctx.auto_commit);
        assert_eq!(ctx.max_retries, 3);
        assert_eq!(ctx.command_timeout, Duration::from_secs(60));
        assert!(ctx.dangerous_patterns.iter().any(|p| p == "sudo rm"));
    }

    #[test]
    fn excluded_directories() {
        let ctx = ExecutionContext::new(".").with_exclude_dirs(vec!["build".into()]);
        assert!(ctx.is_excluded("build"));
        assert!(!ctx.is_excluded(".git"));
    }
}
