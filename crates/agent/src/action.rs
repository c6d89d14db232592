//! Recovering a tool call from free-form model output.
//!
//! The model is asked to answer with tagged blocks:
//!
//! ```text
//! [THOUGHT] I should look at the manifest first. [/THOUGHT]
//! [ACTION] read_file(file_path="Cargo.toml") [/ACTION]
//! ```
//!
//! Only the first `[ACTION]` block counts. Argument values may be
//! double-quoted (`\"`, `\\`, `\n` and `\t` escapes), single-quoted (taken
//! verbatim) or bare (up to the next comma or newline, trimmed). Nothing in
//! here fails: whatever cannot be understood is skipped, and a reply without
//! an action is the model's final answer.

use codewright_core::ToolArgs;

const ACTION_OPEN: &str = "[ACTION]";
const ACTION_CLOSE: &str = "[/ACTION]";
const THOUGHT_OPEN: &str = "[THOUGHT]";
const THOUGHT_CLOSE: &str = "[/THOUGHT]";

/// A single tool invocation extracted from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAction {
    pub tool_name: String,
    pub arguments: ToolArgs,
}

/// Find and parse the first action block in `text`.
pub fn parse_action(text: &str) -> Option<ParsedAction> {
    let start = text.find(ACTION_OPEN)? + ACTION_OPEN.len();
    let rest = &text[start..];
    // A reply cut off before the closing tag still carries its call.
    let block = match rest.find(ACTION_CLOSE) {
        Some(end) => &rest[..end],
        None => rest,
    };

    let block = block.trim_start();
    let name_len = block
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(block.len());
    if name_len == 0 {
        return None;
    }
    let tool_name = &block[..name_len];

    let after_name = block[name_len..].trim_start();
    let args_src = after_name.strip_prefix('(')?;
    // The list ends at the last `)`, so quoted values may hold parentheses.
    let args_src = match args_src.rfind(')') {
        Some(close) => &args_src[..close],
        None => args_src,
    };

    Some(ParsedAction {
        tool_name: tool_name.to_string(),
        arguments: parse_arguments(args_src),
    })
}

/// Content of the first `[THOUGHT]` block, trimmed. Empty blocks count as none.
pub fn extract_thought(text: &str) -> Option<String> {
    let start = text.find(THOUGHT_OPEN)? + THOUGHT_OPEN.len();
    let rest = &text[start..];
    let end = rest
        .find(THOUGHT_CLOSE)
        .or_else(|| rest.find(ACTION_OPEN))
        .unwrap_or(rest.len());
    let thought = rest[..end].trim();
    (!thought.is_empty()).then(|| thought.to_string())
}

/// Parse `key=value, key2="value"` into a flat string map. Later duplicates
/// overwrite earlier ones.
pub fn parse_arguments(src: &str) -> ToolArgs {
    let mut cursor = Cursor::new(src);
    let mut args = ToolArgs::new();

    loop {
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }

        let key = cursor.take_while(|c| c != '=' && c != ',' && !c.is_whitespace());
        if key.is_empty() {
            // Stray `,` or `=`.
            cursor.bump();
            continue;
        }

        cursor.skip_whitespace();
        if cursor.peek() != Some('=') {
            // A positional or otherwise malformed fragment.
            cursor.bump();
            continue;
        }
        cursor.bump();
        cursor.skip_whitespace();

        let value = match cursor.peek() {
            None => break,
            Some('"') => {
                cursor.bump();
                cursor.double_quoted()
            }
            Some('\'') => {
                cursor.bump();
                let value = cursor.take_while(|c| c != '\'');
                cursor.bump();
                value
            }
            Some(_) => cursor.take_while(|c| c != ',' && c != '\n').trim().to_string(),
        };
        args.insert(key, value);

        cursor.skip_whitespace();
        if cursor.peek() == Some(',') {
            cursor.bump();
        }
    }

    args
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Body of a double-quoted value; the opening quote is already consumed.
    /// An unclosed quote runs to the end of input.
    fn double_quoted(&mut self) -> String {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '"' => break,
                '\\' => match self.peek() {
                    Some(escaped) => {
                        self.pos += 1;
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                    None => value.push('\\'),
                },
                other => value.push(other),
            }
        }
        value
    }
}
