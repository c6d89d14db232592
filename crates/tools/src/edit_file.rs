//! edit_file: overwrite, append to, or search-and-replace inside a file.

use async_trait::async_trait;
use codewright_core::error::ToolError;
use codewright_core::tool::{Tool, ToolArgs, ToolResult};
use codewright_core::ExecutionContext;
use tracing::debug;

use crate::resolve_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditMode {
    Overwrite,
    Append,
    SearchReplace,
}

impl EditMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "overwrite" | "write" => Some(EditMode::Overwrite),
            "append" => Some(EditMode::Append),
            "search_replace" | "replace" => Some(EditMode::SearchReplace),
            _ => None,
        }
    }
}

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Create, overwrite, append to, or search-replace text in a file (mode: overwrite | append | search_replace)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path relative to the project root" },
                "content": { "type": "string", "description": "Content to write or append" },
                "mode": { "type": "string", "description": "overwrite (default), append, or search_replace" },
                "search": { "type": "string", "description": "Exact text to find (search_replace)" },
                "replace": { "type": "string", "description": "Replacement text (search_replace, defaults to content)" },
                "replace_all": { "type": "boolean", "description": "Replace every occurrence (default true)" }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> Result<ToolResult, ToolError> {
        let file_path = args.required("file_path")?;
        let raw_mode = args.optional("mode").unwrap_or("overwrite");
        let Some(mode) = EditMode::parse(raw_mode) else {
            return Ok(ToolResult::failure(format!("Unknown mode: {raw_mode}")));
        };
        let full_path = resolve_path(ctx, file_path)?;

        debug!(file = %file_path, ?mode, "Editing file");

        match mode {
            EditMode::Overwrite => {
                let content = args.required("content")?;
                if let Some(parent) = full_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&full_path, content).await?;

                Ok(ToolResult::ok(format!("File written: {file_path}"))
                    .with_data("file_path", file_path)
                    .with_data("lines", content.matches('\n').count() + 1))
            }

            EditMode::Append => {
                let content = args.required("content")?;
                if !full_path.is_file() {
                    return Ok(ToolResult::failure(format!("File does not exist: {file_path}")));
                }

                let mut existing = tokio::fs::read_to_string(&full_path).await?;
                existing.push('\n');
                existing.push_str(content);
                tokio::fs::write(&full_path, existing).await?;

                Ok(ToolResult::ok(format!("Content appended to: {file_path}")).with_data("file_path", file_path))
            }

            EditMode::SearchReplace => {
                if !full_path.is_file() {
                    return Ok(ToolResult::failure(format!("File does not exist: {file_path}")));
                }

                let Some(search) = args.get("search").filter(|s| !s.is_empty()) else {
                    return Ok(ToolResult::failure("search_replace mode requires 'search' parameter"));
                };
                // An explicitly empty `replace` deletes the match.
                let replacement = match args.get("replace").or_else(|| args.get("content")) {
                    Some(r) => r,
                    None => return Err(ToolError::MissingArgument("replace".into())),
                };
                let replace_all = args.flag_or("replace_all", true)?;

                let original = tokio::fs::read_to_string(&full_path).await?;
                let occurrences = original.matches(search).count();
                if occurrences == 0 {
                    return Ok(ToolResult::failure(format!("Search text not found in: {file_path}")));
                }

                let (updated, replaced) = if replace_all {
                    (original.replace(search, replacement), occurrences)
                } else {
                    (original.replacen(search, replacement, 1), 1)
                };
                tokio::fs::write(&full_path, updated).await?;

                Ok(ToolResult::ok(format!("Text replaced in: {file_path}"))
                    .with_data("file_path", file_path)
                    .with_data("replacements", replaced))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, ExecutionContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ExecutionContext::new(dir.path());
        (dir, ctx)
    }

    fn args(pairs: &[(&str, &str)]) -> ToolArgs {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn overwrite_creates_parent_dirs() {
        let (dir, ctx) = setup();
        let a = args(&[("file_path", "src/deep/new.rs"), ("content", "fn main() {}\n")]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "File written: src/deep/new.rs");
        let written = std::fs::read_to_string(dir.path().join("src/deep/new.rs")).unwrap();
        assert_eq!(written, "fn main() {}\n");
    }

    #[tokio::test]
    async fn overwrite_replaces_existing_content() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("a.txt"), "old content").unwrap();
        EditFileTool
            .execute(&ctx, &args(&[("file_path", "a.txt"), ("content", "new")]))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn append_adds_newline_separator() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("log.txt"), "first").unwrap();
        let a = args(&[("file_path", "log.txt"), ("content", "second"), ("mode", "append")]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();

        assert!(result.success);
        assert_eq!(std::fs::read_to_string(dir.path().join("log.txt")).unwrap(), "first\nsecond");
    }

    #[tokio::test]
    async fn append_requires_existing_file() {
        let (_dir, ctx) = setup();
        let a = args(&[("file_path", "ghost.txt"), ("content", "x"), ("mode", "append")]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error, "File does not exist: ghost.txt");
    }

    #[tokio::test]
    async fn search_replace_replaces_all_occurrences() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("f.txt"), "foo bar foo").unwrap();
        let a = args(&[
            ("file_path", "f.txt"),
            ("mode", "search_replace"),
            ("search", "foo"),
            ("replace", "baz"),
            ("content", ""),
        ]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();

        assert!(result.success);
        assert_eq!(result.data["replacements"], 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "baz bar baz");
    }

    #[tokio::test]
    async fn search_replace_first_only() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("f.txt"), "foo bar foo").unwrap();
        let a = args(&[
            ("file_path", "f.txt"),
            ("mode", "search_replace"),
            ("search", "foo"),
            ("replace", "baz"),
            ("replace_all", "false"),
        ]);
        EditFileTool.execute(&ctx, &a).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "baz bar foo");
    }

    #[tokio::test]
    async fn search_replace_falls_back_to_content() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("f.txt"), "version = 1").unwrap();
        let a = args(&[
            ("file_path", "f.txt"),
            ("mode", "search_replace"),
            ("search", "1"),
            ("content", "2"),
        ]);
        EditFileTool.execute(&ctx, &a).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "version = 2");
    }

    #[tokio::test]
    async fn search_replace_missing_text_leaves_file_untouched() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("f.txt"), "foo bar foo").unwrap();
        let a = args(&[
            ("file_path", "f.txt"),
            ("mode", "search_replace"),
            ("search", "qux"),
            ("replace", "baz"),
        ]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();

        assert!(!result.success);
        assert!(result.error.contains("not found"));
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "foo bar foo");
    }

    #[tokio::test]
    async fn search_replace_requires_search() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("f.txt"), "x").unwrap();
        let a = args(&[("file_path", "f.txt"), ("mode", "search_replace"), ("replace", "y")]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();
        assert!(!result.success);
        assert!(result.error.contains("requires 'search'"));
    }

    #[tokio::test]
    async fn unknown_mode_fails() {
        let (_dir, ctx) = setup();
        let a = args(&[("file_path", "f.txt"), ("content", "x"), ("mode", "prepend")]);
        let result = EditFileTool.execute(&ctx, &a).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error, "Unknown mode: prepend");
    }

    #[tokio::test]
    async fn overwrite_outside_root_is_denied() {
        let (_dir, ctx) = setup();
        let a = args(&[("file_path", "../escape.txt"), ("content", "x")]);
        let err = EditFileTool.execute(&ctx, &a).await.unwrap_err();
        assert!(matches!(err, ToolError::PathDenied(_)));
    }
}
