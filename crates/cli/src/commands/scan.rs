//! `codewright scan`: Print the project structure.

use std::path::Path;

use codewright_core::ToolArgs;

use super::CliResult;

pub async fn run(root: &Path, depth: usize, contents: bool) -> CliResult {
    let config = super::load_config(root)?;
    let ctx = codewright_agent::execution_context(root, &config);
    let tools = codewright_tools::default_registry();

    let args: ToolArgs = [
        ("max_depth", depth.to_string()),
        ("include_contents", contents.to_string()),
    ]
    .into_iter()
    .collect();

    let result = tools.dispatch("scan_codebase", &ctx, &args).await;
    if !result.success {
        return Err(result.error.into());
    }
    println!("{}", result.output);
    Ok(())
}
