//! LLM Provider implementations for Codewright.
//!
//! All providers implement the `codewright_core::Provider` trait. The agent
//! speaks plain chat completions, so one OpenAI-compatible client covers
//! hosted and local endpoints alike.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
