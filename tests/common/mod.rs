//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use dispatch_bot::application::errors::HandlerError;
use dispatch_bot::domain::entities::{Event, Interaction, MessagePayload};
use dispatch_bot::domain::traits::{CommandExecutor, EventExecutor};
use dispatch_bot::infrastructure::client::Client;

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn command_module(name: &str, execute: &str) -> String {
    format!(
        "definition:\n  name: {}\n  description: test command\nexecute: {}\n",
        name, execute
    )
}

/// Shared call log
pub type Calls = Arc<Mutex<Vec<String>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn taken(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// Records its label on every invocation
pub struct Recorder {
    pub label: &'static str,
    pub calls: Calls,
}

#[async_trait]
impl CommandExecutor for Recorder {
    async fn execute(&self, _client: &Client, _interaction: &Interaction) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push(self.label.to_string());
        Ok(())
    }
}

#[async_trait]
impl EventExecutor for Recorder {
    async fn execute(&self, _client: &Client, event: &Event) -> Result<(), HandlerError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.label, event.kind()));
        Ok(())
    }
}

/// Fails without responding
pub struct FailsImmediately;

#[async_trait]
impl CommandExecutor for FailsImmediately {
    async fn execute(&self, _client: &Client, _interaction: &Interaction) -> Result<(), HandlerError> {
        Err(HandlerError::ExecutionFailed("boom".to_string()))
    }
}

/// Replies, then fails
pub struct FailsAfterReply;

#[async_trait]
impl CommandExecutor for FailsAfterReply {
    async fn execute(&self, _client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        interaction.reply(MessagePayload::text("working on it")).await?;
        Err(HandlerError::ExecutionFailed("boom".to_string()))
    }
}

/// Defers, then fails
pub struct FailsAfterDefer;

#[async_trait]
impl CommandExecutor for FailsAfterDefer {
    async fn execute(&self, _client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        interaction.defer_reply(false).await?;
        Err(HandlerError::ExecutionFailed("boom".to_string()))
    }
}

/// Panics mid-command, after replying when `after_reply` is set
pub struct Panics {
    pub after_reply: bool,
}

#[async_trait]
impl CommandExecutor for Panics {
    async fn execute(&self, _client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        if self.after_reply {
            interaction.reply(MessagePayload::text("working on it")).await?;
        }
        panic!("command bug");
    }
}
