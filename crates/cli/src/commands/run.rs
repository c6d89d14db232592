//! `codewright run`: One task, start to finish.

use std::path::Path;

use codewright_agent::Termination;

use super::CliResult;
use crate::console::ConsoleSink;

pub async fn run(root: &Path, message: &str, max_turns: Option<usize>) -> CliResult {
    if max_turns == Some(0) {
        return Err("--max-turns must be at least 1".into());
    }
    let config = super::load_config(root)?;
    let mut agent = super::build_agent(root, &config)?;
    if let Some(max) = max_turns {
        agent = agent.with_max_turns(max);
    }
    let mut memory = super::open_memory(root, &config).await?;
    let mut sink = ConsoleSink::new();

    let outcome = tokio::select! {
        outcome = agent.run(&mut memory, message, &mut sink) => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n  Interrupted.");
            return Ok(());
        }
    };

    // A streamed final answer is already on screen.
    if !(config.stream && outcome.termination == Termination::FinalAnswer) {
        println!("{}", outcome.reply);
    }

    match outcome.termination {
        Termination::ModelFailure(msg) => Err(msg.into()),
        _ => Ok(()),
    }
}
