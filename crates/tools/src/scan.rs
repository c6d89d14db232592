//! scan_codebase: a markdown tree of the project, optionally with contents.
//!
//! [`ProjectScanner`] walks the root sorted directories-first, skipping the
//! configured directory names, a fixed set of build/cache artifacts, and
//! simple `.gitignore` entries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use codewright_core::error::ToolError;
use codewright_core::tool::{Tool, ToolArgs, ToolResult};
use codewright_core::ExecutionContext;
use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

/// File-name globs never shown in a scan.
const IGNORED_FILES: &[&str] = &["*.pyc", "*.pyo", "*.log", ".env", "*.env", "*.egg-info", ".DS_Store"];

/// Extra directory names skipped on top of the configured exclusions.
const IGNORED_DIRS: &[&str] = &["dist", "build", ".tox", ".pytest_cache", ".mypy_cache", ".ruff_cache", ".npm"];

const DEFAULT_CONTENT_PATTERNS: &[&str] = &["*.rs", "*.toml", "*.md", "*.py", "*.json", "*.yaml", "*.yml"];

/// Files larger than this are listed but their contents are skipped.
const MAX_CONTENT_BYTES: u64 = 100 * 1024;

pub struct ProjectScanner {
    root: PathBuf,
    exclude_dirs: Vec<String>,
    ignore: Vec<Pattern>,
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>, exclude_dirs: &[String]) -> Self {
        let root = root.into();
        let mut exclude_dirs: Vec<String> = exclude_dirs.to_vec();
        exclude_dirs.extend(IGNORED_DIRS.iter().map(|s| s.to_string()));

        let mut ignore: Vec<Pattern> = IGNORED_FILES.iter().filter_map(|p| Pattern::new(p).ok()).collect();
        ignore.extend(Self::gitignore_patterns(&root));

        Self {
            root,
            exclude_dirs,
            ignore,
        }
    }

    pub fn from_context(ctx: &ExecutionContext) -> Self {
        Self::new(ctx.root(), &ctx.exclude_dirs)
    }

    /// Plain name/glob lines of `.gitignore`. Negations and anchored paths
    /// are not understood and are skipped.
    fn gitignore_patterns(root: &Path) -> Vec<Pattern> {
        let Ok(content) = fs::read_to_string(root.join(".gitignore")) else {
            return Vec::new();
        };
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
            .map(|l| l.trim_end_matches('/'))
            .filter(|l| !l.contains('/'))
            .filter_map(|l| Pattern::new(l).ok())
            .collect()
    }

    fn is_ignored(&self, name: &str, is_dir: bool) -> bool {
        if is_dir && self.exclude_dirs.iter().any(|d| d == name) {
            return true;
        }
        self.ignore.iter().any(|p| p.matches(name))
    }

    pub fn project_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Box-drawing tree below the root, `max_depth` levels deep.
    pub fn tree(&self, max_depth: usize) -> String {
        let mut lines = Vec::new();
        self.walk(&self.root, "", 0, max_depth, &mut lines);
        lines.join("\n")
    }

    fn walk(&self, dir: &Path, prefix: &str, depth: usize, max_depth: usize, lines: &mut Vec<String>) {
        if depth >= max_depth {
            return;
        }
        let Ok(read) = fs::read_dir(dir) else {
            return;
        };

        let mut entries: Vec<(String, PathBuf, bool)> = read
            .filter_map(|e| e.ok())
            .map(|e| {
                let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
                (e.file_name().to_string_lossy().to_string(), e.path(), is_dir)
            })
            .filter(|(name, _, is_dir)| !self.is_ignored(name, *is_dir))
            .collect();
        entries.sort_by_key(|(name, _, is_dir)| (!*is_dir, name.to_lowercase()));

        let count = entries.len();
        for (i, (name, path, is_dir)) in entries.into_iter().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "└── " } else { "├── " };
            let suffix = if is_dir { "/" } else { "" };
            lines.push(format!("{prefix}{connector}{name}{suffix}"));

            if is_dir {
                let extension = if last { "    " } else { "│   " };
                self.walk(&path, &format!("{prefix}{extension}"), depth + 1, max_depth, lines);
            }
        }
    }

    pub fn to_markdown(&self, max_depth: usize) -> String {
        let name = self.project_name();
        format!(
            "# Project Structure: {name}\n\n```\n{name}/\n{}\n```\n",
            self.tree(max_depth)
        )
    }

    /// Relative path → UTF-8 contents for files whose name matches any of
    /// `patterns`. Binary and oversized files are skipped.
    pub fn file_contents(&self, patterns: &[Pattern]) -> BTreeMap<String, String> {
        let mut contents = BTreeMap::new();

        let walker = WalkDir::new(&self.root).into_iter().filter_entry(|e| {
            e.depth() == 0 || !self.is_ignored(&e.file_name().to_string_lossy(), e.file_type().is_dir())
        });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !patterns.iter().any(|p| p.matches(&name)) {
                continue;
            }
            if entry.metadata().map(|m| m.len() > MAX_CONTENT_BYTES).unwrap_or(true) {
                debug!(path = %entry.path().display(), "Skipping large file");
                continue;
            }
            if let Ok(text) = fs::read_to_string(entry.path()) {
                let rel = codewright_security::display_relative(&self.root, entry.path());
                contents.insert(rel, text);
            }
        }

        contents
    }
}

pub struct ScanCodebaseTool;

#[async_trait]
impl Tool for ScanCodebaseTool {
    fn name(&self) -> &str {
        "scan_codebase"
    }

    fn description(&self) -> &str {
        "Show the project's directory tree, optionally with the contents of matching files"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "max_depth": { "type": "integer", "description": "Maximum depth to scan (default 10)" },
                "include_contents": { "type": "boolean", "description": "Include file contents (default false)" },
                "patterns": { "type": "string", "description": "Comma-separated file globs for contents, e.g. *.rs,*.toml" }
            }
        })
    }

    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> Result<ToolResult, ToolError> {
        let max_depth: usize = args.parse_or("max_depth", 10)?;
        let include_contents = args.flag_or("include_contents", false)?;

        let patterns: Vec<Pattern> = match args.optional("patterns") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    Pattern::new(p).map_err(|e| ToolError::InvalidArgument {
                        name: "patterns".into(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?,
            None => DEFAULT_CONTENT_PATTERNS.iter().filter_map(|p| Pattern::new(p).ok()).collect(),
        };

        let root = ctx.root().to_path_buf();
        let exclude = ctx.exclude_dirs.clone();
        let (markdown, files, name) = tokio::task::spawn_blocking(move || {
            let scanner = ProjectScanner::new(root, &exclude);
            let files = if include_contents {
                scanner.file_contents(&patterns)
            } else {
                BTreeMap::new()
            };
            (scanner.to_markdown(max_depth), files, scanner.project_name())
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("Scan task failed: {e}")))?;

        let mut output = format!("Scanned project: {name}\n{markdown}");
        for (path, text) in &files {
            output.push_str(&format!("\n## {path}\n```\n{text}\n```\n"));
        }

        Ok(ToolResult::ok(output)
            .with_data("tree", markdown)
            .with_data("file_count", files.len())
            .with_data("files", serde_json::to_value(&files).unwrap_or_default()))
    }
}
