//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what let the agent act on the project: scan it, read and edit
//! files, run shell commands and commit. Every invocation ends in a fully
//! populated [`ToolResult`]; errors raised inside a tool are folded into a
//! failed result by [`ToolRegistry::dispatch`].

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::ToolError;

/// The result of a tool execution.
///
/// `success == false` always carries a non-empty `error`, and
/// `success == true` always carries an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    pub output: String,

    #[serde(default)]
    pub error: String,

    /// Structured side data (line counts, exit codes, file lists, ...)
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: String::new(),
            data: serde_json::Map::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: error.into(),
            data: serde_json::Map::new(),
        }
        .normalized()
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Restores the success/error pairing.
    pub fn normalized(mut self) -> Self {
        if self.success {
            self.error.clear();
        } else if self.error.trim().is_empty() {
            self.error = "Tool failed without an error message".into();
        }
        self
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::failure(err.to_string())
    }
}

/// Flat string-keyed arguments recovered from an action.
///
/// All values are strings; coercion happens here, in the receiving tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArgs(BTreeMap<String, String>);

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any earlier one under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn required(&self, key: &str) -> Result<&str, ToolError> {
        self.get(key).ok_or_else(|| ToolError::MissingArgument(key.to_string()))
    }

    pub fn optional(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ToolError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ToolError::InvalidArgument {
                name: key.to_string(),
                reason: format!("cannot interpret '{raw}'"),
            }),
        }
    }

    pub fn parse_opt<T: FromStr>(&self, key: &str) -> Result<Option<T>, ToolError> {
        match self.optional(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| ToolError::InvalidArgument {
                name: key.to_string(),
                reason: format!("cannot interpret '{raw}'"),
            }),
        }
    }

    pub fn flag_or(&self, key: &str, default: bool) -> Result<bool, ToolError> {
        match self.optional(key).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ToolError::InvalidArgument {
                    name: key.to_string(),
                    reason: format!("expected a boolean, got '{v}'"),
                }),
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ToolArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = ToolArgs::new();
        for (k, v) in iter {
            args.insert(k, v);
        }
        args
    }
}

/// The core Tool trait.
///
/// Each built-in (scan_codebase, read_file, edit_file, ...) implements this
/// trait and is registered in the [`ToolRegistry`] at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (shown to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    ///
    /// Only used to render documentation text; arguments are not validated
    /// against it.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, ctx: &ExecutionContext, args: &ToolArgs) -> std::result::Result<ToolResult, ToolError>;

    /// One documentation line: `- name(param: type, opt?: type): description`.
    fn signature(&self) -> String {
        let schema = self.parameters_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let mut params = Vec::new();
        if let Some(props) = schema["properties"].as_object() {
            let (req, opt): (Vec<_>, Vec<_>) = props.iter().partition(|(k, _)| required.contains(&k.as_str()));
            for (name, prop) in req {
                let ty = prop["type"].as_str().unwrap_or("string");
                params.push(format!("{name}: {ty}"));
            }
            for (name, prop) in opt {
                let ty = prop["type"].as_str().unwrap_or("string");
                params.push(format!("{name}?: {ty}"));
            }
        }

        format!("- {}({}): {}", self.name(), params.join(", "), self.description())
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Render tool documentation for the system prompt
/// 2. Dispatch parsed actions by name
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Documentation block for every registered tool, one line each.
    pub fn describe(&self) -> String {
        self.names()
            .into_iter()
            .filter_map(|n| self.get(n))
            .map(|t| t.signature())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Execute a tool by name. Never fails: unknown names and tool errors
    /// come back as failed results.
    pub async fn dispatch(&self, name: &str, ctx: &ExecutionContext, args: &ToolArgs) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            debug!(tool = %name, "Dispatch to unregistered tool");
            return ToolError::NotFound(name.to_string()).into();
        };

        match tool.execute(ctx, args).await {
            Ok(result) => result.normalized(),
            Err(e) => {
                debug!(tool = %name, error = %e, "Tool raised an error");
                e.into()
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
