//! `codewright memory`: Conversation store management.

use std::path::Path;

use super::CliResult;

pub async fn stats(root: &Path) -> CliResult {
    let config = super::load_config(root)?;
    let memory = super::open_memory(root, &config).await?;
    let summary = memory.get_summary();

    println!("🧠 Memory Statistics");
    println!("====================");
    println!("  Backend:    {}", summary.backend);
    match &summary.path {
        Some(path) if path.exists() => {
            let size_kb = std::fs::metadata(path)?.len() as f64 / 1024.0;
            println!("  File:       {} ({size_kb:.1} KB)", path.display());
        }
        Some(path) => println!("  File:       {} (not created yet)", path.display()),
        None => println!("  File:       (not persisted)"),
    }
    println!("  Messages:   {} / {}", summary.total_messages, memory.max_messages());
    for (role, count) in &summary.roles {
        println!("    {role:<10} {count}");
    }
    println!("  Tokens:     ~{}", summary.estimated_tokens);
    println!("  Window:     {} tokens", config.memory.context_tokens);

    Ok(())
}

pub async fn history(root: &Path, limit: usize) -> CliResult {
    let config = super::load_config(root)?;
    let memory = super::open_memory(root, &config).await?;

    if memory.is_empty() {
        println!("  (no messages)");
        return Ok(());
    }

    for message in memory.recent(limit) {
        let kind = message
            .metadata
            .get("kind")
            .and_then(|k| k.as_str())
            .map(|k| format!(" ({k})"))
            .unwrap_or_default();
        println!(
            "── {} {}{kind}",
            message.timestamp.format("%Y-%m-%d %H:%M:%S"),
            message.role
        );
        println!("{}", message.content.trim_end());
        println!();
    }

    Ok(())
}

pub async fn clear(root: &Path, confirm: bool) -> CliResult {
    if !confirm {
        return Err("Refusing to clear memory without --confirm".into());
    }

    let config = super::load_config(root)?;
    let mut memory = super::open_memory(root, &config).await?;
    let count = memory.len();
    memory.clear().await?;

    println!("✅ Cleared {count} messages");
    Ok(())
}
