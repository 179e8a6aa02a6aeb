use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::traits::CommandExecutor;

/// Application command type for slash commands
const CHAT_INPUT: u8 = 1;

/// Declarative schema of a slash command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
}

/// Typed parameter kinds, named as they appear in module files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Number,
}

impl OptionKind {
    /// Numeric option type used by the remote registration endpoint
    pub fn code(&self) -> u8 {
        match self {
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Number => 10,
        }
    }
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, description: impl Into<String>, kind: OptionKind, required: bool) -> Self {
        self.options.push(CommandOption {
            name: name.into(),
            description: description.into(),
            kind,
            required,
        });
        self
    }

    /// Serialize into the remote command-registration format
    pub fn to_json(&self) -> serde_json::Value {
        let options: Vec<serde_json::Value> = self
            .options
            .iter()
            .map(|o| {
                json!({
                    "name": o.name,
                    "description": o.description,
                    "type": o.kind.code(),
                    "required": o.required,
                })
            })
            .collect();

        json!({
            "name": self.name,
            "description": self.description,
            "type": CHAT_INPUT,
            "options": options,
        })
    }
}

/// A validated, registered command
#[derive(Clone)]
pub struct CommandDescriptor {
    pub definition: CommandDefinition,
    pub execute: Arc<dyn CommandExecutor>,
    /// Module file the command was loaded from
    pub source: PathBuf,
}

impl CommandDescriptor {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("definition", &self.definition)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
