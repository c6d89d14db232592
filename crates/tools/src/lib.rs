//! Built-in tool implementations for Codewright.
//!
//! Tools give the agent its hands on a project: scan the tree, read and
//! list files, edit them, run shell commands, and commit. Every path
//! argument is resolved against the project root of the
//! [`ExecutionContext`] and refused if it escapes it.

pub mod commit;
pub mod edit_file;
pub mod execute_command;
pub mod list_files;
pub mod read_file;
pub mod scan;

use std::path::PathBuf;

use codewright_core::error::ToolError;
use codewright_core::tool::ToolRegistry;
use codewright_core::ExecutionContext;

pub use scan::ProjectScanner;

/// Create a registry with all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(scan::ScanCodebaseTool));
    registry.register(Box::new(read_file::ReadFileTool));
    registry.register(Box::new(list_files::ListFilesTool));
    registry.register(Box::new(edit_file::EditFileTool));
    registry.register(Box::new(execute_command::ExecuteCommandTool));
    registry.register(Box::new(commit::CommitChangesTool));
    registry
}

/// Resolve a tool's path argument under the project root.
pub(crate) fn resolve_path(ctx: &ExecutionContext, path: &str) -> Result<PathBuf, ToolError> {
    codewright_security::resolve_within(ctx.root(), path).map_err(|e| ToolError::PathDenied(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_all_builtins() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec![
                "commit_changes",
                "edit_file",
                "execute_command",
                "list_files",
                "read_file",
                "scan_codebase",
            ]
        );
    }

    #[test]
    fn docs_mention_every_tool() {
        let docs = default_registry().describe();
        assert!(docs.contains("- read_file(file_path: string"));
        assert!(docs.contains("- execute_command(command: string, timeout?: integer)"));
        assert_eq!(docs.lines().count(), 6);
    }

    #[test]
    fn escaping_paths_are_denied() {
        let ctx = ExecutionContext::new("/work/project");
        let err = resolve_path(&ctx, "../secrets").unwrap_err();
        assert!(matches!(err, ToolError::PathDenied(_)));
    }
}
