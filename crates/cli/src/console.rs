//! Terminal rendering of agent events.

use std::io::Write;

use codewright_agent::{AgentEvent, OutputSink};

/// Writes streamed text to stdout and tool activity to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    /// Something was streamed since the last newline.
    mid_line: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

fn one_line(text: &str, max: usize) -> String {
    let flat = text.trim().replace('\n', " ⏎ ");
    if flat.chars().count() > max {
        format!("{}…", flat.chars().take(max).collect::<String>())
    } else {
        flat
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Chunk { content } => {
                print!("{content}");
                let _ = std::io::stdout().flush();
                self.mid_line = !content.ends_with('\n');
            }
            AgentEvent::Thought { content } => {
                self.end_line();
                eprintln!("  💭 {}", one_line(&content, 160));
            }
            AgentEvent::ToolCall { name, arguments } => {
                self.end_line();
                eprintln!("  🔧 {name} {}", one_line(&arguments.to_string(), 120));
            }
            AgentEvent::ToolResult {
                name,
                success,
                output,
                error,
            } => {
                if success {
                    eprintln!("  ✅ {name}: {}", one_line(&output, 120));
                } else {
                    eprintln!("  ❌ {name}: {}", one_line(&error, 200));
                }
            }
            AgentEvent::Done { .. } => self.end_line(),
            AgentEvent::Error { message } => {
                self.end_line();
                eprintln!("  [Error] {message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_flattens_and_cuts() {
        assert_eq!(one_line("  a\nb  ", 10), "a ⏎ b");
        assert_eq!(one_line("abcdef", 3), "abc…");
    }
}
