//! execute_command: run a shell command in the project root.
//!
//! Commands go through `sh -c` (`cmd /C` on Windows) with the project root as
//! working directory. With safe mode on, a command containing any denylisted
//! substring is refused before anything is spawned. The child is killed when
//! the timeout fires.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use codewright_core::error::ToolError;
use codewright_core::tool::{Tool, ToolArgs, ToolResult};
use codewright_core::ExecutionContext;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct ExecuteCommandTool;

fn shell(command: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the project root and return its stdout (stderr on failure)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "The shell command to execute" },
                "timeout": { "type": "integer", "description": "Timeout in seconds (default 60)" }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> Result<ToolResult, ToolError> {
        let command = args.required("command")?;
        let timeout_secs: u64 = args.parse_or("timeout", ctx.command_timeout.as_secs())?;

        if ctx.safe_mode
            && let Some(pattern) = codewright_security::find_blocked(command, &ctx.dangerous_patterns)
        {
            return Err(ToolError::Blocked(pattern.to_string()));
        }

        debug!(command = %command, timeout_secs, "Executing shell command");

        let child = shell(command)
            .current_dir(ctx.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to spawn command: {e}")))?;

        let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(command = %command, timeout_secs, "Command timed out");
                return Err(ToolError::Timeout(timeout_secs));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        let result = if output.status.success() {
            ToolResult::ok(stdout)
        } else {
            warn!(command = %command, exit_code, "Command failed");
            let error = if stderr.trim().is_empty() {
                format!("Command exited with status {exit_code}")
            } else {
                stderr.clone()
            };
            ToolResult::failure(error).with_output(stdout)
        };

        Ok(result
            .with_data("exit_code", exit_code)
            .with_data("stderr", stderr)
            .with_data("command", command))
    }
}
