//! # Codewright Core
//!
//! Domain types, traits, and error definitions for the Codewright coding agent.
//! Every other crate in the workspace depends inward on this one.
//!
//! - [`Message`] / [`Role`]: the persisted conversation record
//! - [`Provider`]: the seam to the language model
//! - [`Tool`] / [`ToolRegistry`]: the capabilities the agent can invoke
//! - [`ExecutionContext`]: per-session settings shared by every tool call

pub mod context;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

pub use context::ExecutionContext;
pub use error::{Error, Result};
pub use message::{ChatMessage, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use tool::{Tool, ToolArgs, ToolRegistry, ToolResult};
