//! Agent-level events and the sink they are written to.
//!
//! The loop never prints. Everything a frontend might show goes through an
//! [`OutputSink`] handed to [`AgentLoop::run`](crate::AgentLoop::run):
//! - `chunk`: partial text from a streamed reply
//! - `thought`: the `[THOUGHT]` part of a reply
//! - `tool_call`: the agent is invoking a tool
//! - `tool_result`: tool execution completed
//! - `done`: the run is over
//! - `error`: the model call failed

use serde::{Deserialize, Serialize};

/// Events emitted while the agent works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Partial text from the model.
    Chunk { content: String },

    /// Reasoning the model wrote before acting.
    Thought { content: String },

    /// The agent is calling a tool.
    ToolCall { name: String, arguments: serde_json::Value },

    /// Tool execution completed.
    ToolResult {
        name: String,
        success: bool,
        output: String,
        error: String,
    },

    /// The run is complete.
    Done { reply: String, turns: usize },

    /// The model call failed and the run stopped.
    Error { message: String },
}

impl AgentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Thought { .. } => "thought",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Receives events from a running agent.
pub trait OutputSink: Send {
    fn emit(&mut self, event: AgentEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _event: AgentEvent) {}
}

/// Collects events, mostly for tests.
impl OutputSink for Vec<AgentEvent> {
    fn emit(&mut self, event: AgentEvent) {
        self.push(event);
    }
}
