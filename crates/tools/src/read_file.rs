//! read_file: whole file or a line slice.

use async_trait::async_trait;
use codewright_core::error::ToolError;
use codewright_core::tool::{Tool, ToolArgs, ToolResult};
use codewright_core::ExecutionContext;

use crate::resolve_path;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file's contents, optionally only lines start_line..end_line (0-indexed, end exclusive)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path relative to the project root" },
                "start_line": { "type": "integer", "description": "First line to return (0-indexed)" },
                "end_line": { "type": "integer", "description": "Line to stop before" }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> Result<ToolResult, ToolError> {
        let file_path = args.required("file_path")?;
        let start: Option<usize> = args.parse_opt("start_line")?;
        let end: Option<usize> = args.parse_opt("end_line")?;
        let full_path = resolve_path(ctx, file_path)?;

        if !full_path.exists() {
            return Ok(ToolResult::failure(format!("File not found: {file_path}")));
        }
        if full_path.is_dir() {
            return Ok(ToolResult::failure(format!("Not a file: {file_path}")));
        }

        let bytes = tokio::fs::read(&full_path).await?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.split('\n').collect();
        let total = lines.len();

        let mut result = if start.is_some() || end.is_some() {
            let end = end.unwrap_or(total).min(total);
            let start = start.unwrap_or(0).min(end);
            ToolResult::ok(lines[start..end].join("\n"))
                .with_data("start_line", start)
                .with_data("end_line", end)
        } else {
            ToolResult::ok(content.to_string())
        };

        result = result.with_data("lines", total).with_data("file_path", file_path);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, ExecutionContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "zero\none\ntwo\nthree").unwrap();
        let ctx = ExecutionContext::new(dir.path());
        (dir, ctx)
    }

    fn args(pairs: &[(&str, &str)]) -> ToolArgs {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn reads_whole_file() {
        let (_dir, ctx) = setup();
        let result = ReadFileTool.execute(&ctx, &args(&[("file_path", "notes.txt")])).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "zero\none\ntwo\nthree");
        assert_eq!(result.data["lines"], 4);
        assert_eq!(result.data["file_path"], "notes.txt");
    }

    #[tokio::test]
    async fn reads_line_slice() {
        let (_dir, ctx) = setup();
        let a = args(&[("file_path", "notes.txt"), ("start_line", "1"), ("end_line", "3")]);
        let result = ReadFileTool.execute(&ctx, &a).await.unwrap();
        assert_eq!(result.output, "one\ntwo");
    }

    #[tokio::test]
    async fn slice_bounds_are_clamped() {
        let (_dir, ctx) = setup();
        let a = args(&[("file_path", "notes.txt"), ("start_line", "2"), ("end_line", "99")]);
        let result = ReadFileTool.execute(&ctx, &a).await.unwrap();
        assert_eq!(result.output, "two\nthree");

        let a = args(&[("file_path", "notes.txt"), ("start_line", "10")]);
        let result = ReadFileTool.execute(&ctx, &a).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "");
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let (_dir, ctx) = setup();
        let result = ReadFileTool.execute(&ctx, &args(&[("file_path", "nope.rs")])).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error, "File not found: nope.rs");
    }

    #[tokio::test]
    async fn non_numeric_line_is_an_error() {
        let (_dir, ctx) = setup();
        let a = args(&[("file_path", "notes.txt"), ("start_line", "first")]);
        let err = ReadFileTool.execute(&ctx, &a).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn path_outside_root_is_denied() {
        let (_dir, ctx) = setup();
        let err = ReadFileTool
            .execute(&ctx, &args(&[("file_path", "../../etc/passwd")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathDenied(_)));
    }
}
