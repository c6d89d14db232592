//! Security guards for Codewright tools.
//!
//! Provides:
//! - **Path confinement**: file tools only touch paths under the project root
//! - **Command denylist**: literal-substring screening of shell commands

pub mod denylist;
pub mod path;

pub use denylist::find_blocked;
pub use path::{display_relative, resolve_within, PathValidationError};
