//! `codewright status`: Show configuration and project state.

use std::path::Path;

use codewright_config::AppConfig;

use super::CliResult;

pub async fn run(root: &Path) -> CliResult {
    let config = super::load_config(root)?;

    println!("🛠  Codewright Status");
    println!("===================");
    println!("  Project:      {}", root.display());
    println!("  Model:        {}", config.model);
    println!("  Endpoint:     {}", config.base_url);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Temperature:  {}", config.temperature);
    println!("  Streaming:    {}", if config.stream { "on" } else { "off" });
    println!("  Memory:       {} (max {} messages, {} token window)",
        config.memory.backend, config.memory.max_messages, config.memory.context_tokens);
    println!("  Turn budget:  {} ({} failure budget, {} retries)",
        config.agent.max_turns, config.agent.failure_policy, config.agent.max_retries);
    println!("  Safe mode:    {}", if config.tools.safe_mode { "on" } else { "off" });
    println!("  Auto-commit:  {}", if config.tools.auto_commit { "on" } else { "off" });

    let local = AppConfig::project_config_path(root);
    let global = AppConfig::config_dir().join("config.toml");
    if local.exists() {
        println!("\n  ✅ Project config: {}", local.display());
    } else if global.exists() {
        println!("\n  ✅ Global config: {}", global.display());
    } else {
        println!("\n  ⚠️  No config file — run `codewright init` first");
    }

    Ok(())
}
