//! What the model sees: the system instruction, the outbound message list,
//! and observations fed back after each tool call.

use chrono::{DateTime, Utc};
use codewright_core::{ChatMessage, Role, ToolArgs, ToolResult};

const SYSTEM_TEMPLATE: &str = r#"You are Codewright, an autonomous coding agent working inside the user's project. You act only through tools.

## Rules
1. Never claim to have done something unless an [OBSERVATION] confirms it.
2. Never invent file contents, command output, or results.
3. If a tool fails, report the exact error from the [OBSERVATION].
4. Verify your work: read files back and check command output.
5. Current date/time: {datetime}

## Response format
[THOUGHT]
What you need to do and which tool you will use.
[/THOUGHT]

[ACTION]
tool_name(param="value", other="value")
[/ACTION]

Use exactly one [ACTION] per reply, then stop and wait for the [OBSERVATION].
Quote values with double quotes; inside them write \" for a quote, \\ for a
backslash, \n for a newline and \t for a tab. When the task is complete,
reply without an [ACTION] block; that reply is shown to the user.

## Available tools
{tools}

## Tool usage
- edit_file: mode="overwrite" for new files, mode="search_replace" with search/replace for changes.
- execute_command: read the output before claiming success.
- Change one file per action and confirm each before moving on."#;

const SUCCESS_NUDGE: &str =
    "IMPORTANT: Verify this action succeeded (for example with read_file or list_files) before telling the user it is done.";
const FAILURE_NUDGE: &str = "The action FAILED. Report the exact error above. Do NOT claim success.";

/// Longest argument value echoed back in an observation.
const PARAMETER_MAX_CHARS: usize = 500;

/// The system instruction with tool documentation and the current time.
pub fn system_prompt(tool_docs: &str, now: DateTime<Utc>) -> String {
    SYSTEM_TEMPLATE
        .replace("{datetime}", &now.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .replace("{tools}", tool_docs)
}

/// The outbound conversation: `system` first, then the history window with
/// its system entries dropped and runs of the same role collapsed to their
/// newest entry, so roles strictly alternate.
pub fn build_messages(system: &str, window: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(window.len() + 1);
    messages.push(ChatMessage::new(Role::System, system));

    let mut history: Vec<ChatMessage> = Vec::with_capacity(window.len());
    for message in window.into_iter().filter(|m| m.role != Role::System) {
        match history.last_mut() {
            Some(last) if last.role == message.role => *last = message,
            _ => history.push(message),
        }
    }

    messages.extend(history);
    messages
}

/// Cut `text` to at most `max_chars` characters, saying how much was dropped.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}\n... [truncated {} characters]", total - max_chars)
}

/// The `[OBSERVATION]` block for a tool result, followed by a nudge that
/// depends on whether it succeeded.
pub fn format_observation(tool: &str, args: &ToolArgs, result: &ToolResult, max_chars: usize) -> String {
    let mut observation = String::from("[OBSERVATION]\n");
    observation.push_str(&format!("Tool: {tool}\n"));
    let limit = max_chars.min(PARAMETER_MAX_CHARS);
    let shown: ToolArgs = args.iter().map(|(k, v)| (k, truncate(v, limit))).collect();
    observation.push_str(&format!("Parameters: {}\n", shown.to_json()));
    observation.push_str(&format!("Success: {}\n", result.success));
    if !result.output.is_empty() {
        observation.push_str(&format!(
            "--- OUTPUT START ---\n{}\n--- OUTPUT END ---\n",
            truncate(&result.output, max_chars)
        ));
    }
    if !result.error.is_empty() {
        observation.push_str(&format!(
            "--- ERROR START ---\n{}\n--- ERROR END ---\n",
            truncate(&result.error, max_chars)
        ));
    }
    observation.push_str("[/OBSERVATION]\n\n");
    observation.push_str(if result.success { SUCCESS_NUDGE } else { FAILURE_NUDGE });
    observation
}
