//! `codewright chat`: Interactive session over stdin.

use std::io::Write;
use std::path::Path;

use codewright_agent::Termination;
use codewright_core::ToolArgs;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliResult;
use crate::console::ConsoleSink;

const HELP: &str = "\
  /help       Show this help
  /scan       Print the project tree
  /history    Show the last 10 messages
  /clear      Forget the conversation
  /exit       Quit (also /quit or Ctrl+D)";

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

pub async fn run(root: &Path) -> CliResult {
    let config = super::load_config(root)?;
    let agent = super::build_agent(root, &config)?;
    let mut memory = super::open_memory(root, &config).await?;
    let mut sink = ConsoleSink::new();

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Codewright — Interactive Session        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Project:   {}", root.display());
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!("  Memory:    {} ({} messages)", config.memory.backend, memory.len());
    println!();
    println!("  Type your request and press Enter. /help lists commands.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            prompt()?;
            continue;
        }

        match input {
            "/exit" | "/quit" => break,
            "/help" => println!("{HELP}"),
            "/scan" => {
                let result = agent
                    .tools()
                    .dispatch("scan_codebase", agent.context(), &ToolArgs::new())
                    .await;
                println!("{}", if result.success { &result.output } else { &result.error });
            }
            "/history" => {
                for message in memory.recent(10) {
                    println!("  [{}] {}", message.role, message.content.lines().next().unwrap_or(""));
                }
            }
            "/clear" => match memory.clear().await {
                Ok(()) => println!("  Conversation cleared."),
                Err(e) => eprintln!("  [Error] {e}"),
            },
            _ if input.starts_with('/') => println!("  Unknown command {input}. Try /help."),
            _ => {
                let outcome = tokio::select! {
                    outcome = agent.run(&mut memory, input, &mut sink) => Some(outcome),
                    _ = tokio::signal::ctrl_c() => None,
                };
                match outcome {
                    Some(outcome) => {
                        if !(config.stream && outcome.termination == Termination::FinalAnswer) {
                            println!();
                            for line in outcome.reply.lines() {
                                println!("  Codewright > {line}");
                            }
                        }
                        println!();
                    }
                    None => eprintln!("\n  Interrupted."),
                }
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
