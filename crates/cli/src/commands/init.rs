//! `codewright init`: Set up a project for the agent.

use std::path::Path;

use codewright_config::{AppConfig, STATE_DIR};

use super::CliResult;

pub async fn run(root: &Path, force: bool) -> CliResult {
    let state_dir = AppConfig::state_dir(root);
    let config_path = AppConfig::project_config_path(root);

    println!("🛠  Codewright — Project Setup");
    println!("=============================\n");

    if !state_dir.exists() {
        std::fs::create_dir_all(&state_dir)?;
        println!("✅ Created {}", state_dir.display());
    } else {
        println!("  State directory exists: {}", state_dir.display());
    }

    if config_path.exists() && !force {
        println!("  Config exists: {} (use --force to overwrite)", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote {}", config_path.display());
    }

    // Keep conversation state out of version control.
    let gitignore = root.join(".gitignore");
    if gitignore.exists() {
        let content = std::fs::read_to_string(&gitignore)?;
        let entry = format!("{STATE_DIR}/");
        if !content.lines().any(|l| l.trim() == entry || l.trim() == STATE_DIR) {
            let mut updated = content;
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&entry);
            updated.push('\n');
            std::fs::write(&gitignore, updated)?;
            println!("✅ Added {entry} to .gitignore");
        }
    }

    println!();
    println!("Next steps:");
    println!("  1. Set CODEWRIGHT_API_KEY (or api_key in {})", config_path.display());
    println!("  2. codewright run \"describe this project\"");
    println!("  3. codewright chat");

    Ok(())
}
