//! Command-line parser - Turns `/name key=value ...` text into interaction options

use crate::domain::entities::{InteractionOption, OptionValue};

/// A slash command typed as plain text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub name: String,
    pub options: Vec<InteractionOption>,
}

/// Parses text-mode slash commands
pub struct CommandLineParser {
    prefix: String,
}

impl CommandLineParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Parse a line; returns `None` if it is not a command
    pub fn parse(&self, line: &str) -> Option<ParsedCommand> {
        let text = line.trim().strip_prefix(self.prefix.as_str())?;
        let mut tokens = split_tokens(text).into_iter();

        let name = tokens.next().filter(|n| !n.is_empty() && !n.contains('='))?;
        let options = tokens
            .filter_map(|token| {
                let (key, value) = token.split_once('=')?;
                if key.is_empty() {
                    return None;
                }
                Some(InteractionOption {
                    name: key.to_string(),
                    value: infer_value(value),
                })
            })
            .collect();

        Some(ParsedCommand { name, options })
    }
}

impl Default for CommandLineParser {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Whitespace split that keeps double-quoted runs together
fn split_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in text.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn infer_value(raw: &str) -> OptionValue {
    if let Ok(i) = raw.parse::<i64>() {
        return OptionValue::Integer(i);
    }
    if let Ok(n) = raw.parse::<f64>() {
        if n.is_finite() {
            return OptionValue::Number(n);
        }
    }
    match raw {
        "true" => OptionValue::Boolean(true),
        "false" => OptionValue::Boolean(false),
        _ => OptionValue::String(raw.to_string()),
    }
}
