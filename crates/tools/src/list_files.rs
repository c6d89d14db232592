//! list_files: glob over the project tree.

use async_trait::async_trait;
use codewright_core::error::ToolError;
use codewright_core::tool::{Tool, ToolArgs, ToolResult};
use codewright_core::ExecutionContext;
use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

/// Paths shown in the output; `data.files` always has all of them.
const DISPLAY_LIMIT: usize = 50;

pub struct ListFilesTool;

/// Files under the project root whose relative path matches `pattern`,
/// sorted, skipping excluded directories.
pub fn matching_files(ctx: &ExecutionContext, pattern: &Pattern) -> Vec<String> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files: Vec<String> = WalkDir::new(ctx.root())
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && ctx.is_excluded(&e.file_name().to_string_lossy())))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = codewright_security::display_relative(ctx.root(), e.path());
            pattern.matches_with(&rel, options).then_some(rel)
        })
        .collect();

    files.sort();
    files
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List project files matching a glob pattern (default **/*)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Glob relative to the project root, e.g. src/**/*.rs" }
            }
        })
    }

    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> Result<ToolResult, ToolError> {
        let raw = args.optional("pattern").unwrap_or("**/*");
        let pattern = Pattern::new(raw.trim_start_matches("./")).map_err(|e| ToolError::InvalidArgument {
            name: "pattern".into(),
            reason: e.to_string(),
        })?;

        let files = matching_files(ctx, &pattern);

        let mut output = format!("Found {} files:\n", files.len());
        output.push_str(&files.iter().take(DISPLAY_LIMIT).cloned().collect::<Vec<_>>().join("\n"));
        if files.len() > DISPLAY_LIMIT {
            output.push_str(&format!("\n... and {} more", files.len() - DISPLAY_LIMIT));
        }

        Ok(ToolResult::ok(output)
            .with_data("count", files.len())
            .with_data("files", files))
    }
}
