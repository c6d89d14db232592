//! The core agent loop: the heart of Codewright.
//!
//! The agent follows a **Think → Act → Observe** cycle:
//!
//! 1. **Receive** a user message and store it
//! 2. **Build the prompt** (system instruction + token-budgeted history)
//! 3. **Call the model** via the configured provider
//! 4. **If the reply holds an `[ACTION]`**: run the tool, store the
//!    `[OBSERVATION]`, loop back to step 2
//! 5. **Otherwise**: the reply is the final answer
//!
//! The loop is bounded by a turn budget and, optionally, by a separate
//! budget for consecutive failed actions.

pub mod action;
pub mod event;
pub mod loop_runner;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

use std::path::PathBuf;
use std::time::Duration;

use codewright_config::AppConfig;
use codewright_core::ExecutionContext;

pub use action::{ParsedAction, extract_thought, parse_action};
pub use event::{AgentEvent, NullSink, OutputSink};
pub use loop_runner::{AgentLoop, FailurePolicy, RunOutcome, Termination};

/// Tool settings for a session rooted at `project_root`.
pub fn execution_context(project_root: impl Into<PathBuf>, config: &AppConfig) -> ExecutionContext {
    ExecutionContext::new(project_root)
        .with_max_retries(config.agent.max_retries)
        .with_safe_mode(config.tools.safe_mode)
        .with_auto_commit(config.tools.auto_commit)
        .with_dangerous_patterns(config.tools.dangerous_patterns.clone())
        .with_command_timeout(Duration::from_secs(config.tools.command_timeout_secs))
        .with_exclude_dirs(config.tools.exclude_dirs.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_context_follows_config() {
        let mut config = AppConfig::default();
        config.tools.safe_mode = false;
        config.tools.command_timeout_secs = 5;
        config.agent.max_retries = 9;

        let ctx = execution_context("/work", &config);
        assert_eq!(ctx.root(), std::path::Path::new("/work"));
        assert!(!ctx.safe_mode);
        assert_eq!(ctx.command_timeout, Duration::from_secs(5));
        assert_eq!(ctx.max_retries, 9);
    }
}
