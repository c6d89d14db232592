//! `codewright tools`: What the agent can do.

use super::CliResult;

pub async fn run() -> CliResult {
    let registry = codewright_tools::default_registry();

    println!("🔧 Available Tools ({})", registry.len());
    println!("====================");
    println!("{}", registry.describe());

    Ok(())
}
