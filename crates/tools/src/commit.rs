//! commit_changes: stage, commit, and optionally push with git.

use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use codewright_core::error::ToolError;
use codewright_core::tool::{Tool, ToolArgs, ToolResult};
use codewright_core::ExecutionContext;
use tokio::process::Command;
use tracing::{info, warn};

pub struct CommitChangesTool;

async fn git(ctx: &ExecutionContext, args: &[&str]) -> Result<Output, ToolError> {
    let mut command = Command::new("git");
    command.args(args).current_dir(ctx.root());
    run_bounded(command, ctx.command_timeout).await
}

/// Run `command` to completion, killing it once `limit` has passed.
async fn run_bounded(mut command: Command, limit: Duration) -> Result<Output, ToolError> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ToolError::ExecutionFailed("Git not found".into()),
            _ => ToolError::ExecutionFailed(format!("Failed to run git: {e}")),
        })?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            warn!(timeout_secs = limit.as_secs(), "git timed out");
            Err(ToolError::Timeout(limit.as_secs()))
        }
    }
}

/// stderr, or stdout when git printed nothing to stderr.
fn git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}

#[async_trait]
impl Tool for CommitChangesTool {
    fn name(&self) -> &str {
        "commit_changes"
    }

    fn description(&self) -> &str {
        "Stage all changes and create a git commit, optionally pushing it"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Commit message" },
                "add_all": { "type": "boolean", "description": "Run `git add -A` first (default true)" },
                "push": { "type": "boolean", "description": "Push after committing (default false)" }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> Result<ToolResult, ToolError> {
        let message = args.required("message")?;
        let add_all = args.flag_or("add_all", true)?;
        let push = args.flag_or("push", false)?;

        if add_all {
            let added = git(ctx, &["add", "-A"]).await?;
            if !added.status.success() {
                return Ok(ToolResult::failure(git_error(&added)));
            }
        }

        let committed = git(ctx, &["commit", "-m", message]).await?;
        if !committed.status.success() {
            let stdout = String::from_utf8_lossy(&committed.stdout);
            if stdout.contains("nothing to commit") {
                return Ok(ToolResult::ok("Nothing to commit")
                    .with_data("commit_message", message)
                    .with_data("pushed", false));
            }
            return Ok(ToolResult::failure(git_error(&committed)));
        }

        info!(message = %message, "Committed changes");

        let mut output = String::from("Committed successfully");
        let mut pushed = false;
        if push {
            let result = git(ctx, &["push"]).await?;
            if result.status.success() {
                pushed = true;
                output = "Committed and pushed successfully".into();
            } else {
                let reason = git_error(&result);
                warn!(error = %reason, "Push failed, commit kept locally");
                output = format!("Committed successfully (push failed: {reason})");
            }
        }

        Ok(ToolResult::ok(output)
            .with_data("commit_message", message)
            .with_data("pushed", pushed))
    }
}
