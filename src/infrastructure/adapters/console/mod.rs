//! Console adapter for development/testing
//!
//! Each stdin line of the form `/name key=value ...` becomes an
//! `interactionCreate` notification; responses are printed to stdout.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, Weak};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::errors::PlatformError;
use crate::application::messaging::CommandLineParser;
use crate::domain::entities::{
    Event, Guild, Interaction, InteractionTarget, MessagePayload, ReadyEvent, ResponseAction, User,
};
use crate::domain::traits::{DeployScope, Platform};

const CONSOLE_GUILD_ID: &str = "console";

/// Console platform adapter for local development
pub struct ConsoleAdapter {
    me: Weak<ConsoleAdapter>,
    bot: User,
    operator: User,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            bot: User::new("console", "dispatch-bot").as_bot(),
            operator: User::new("operator", whoami()),
            reader: Mutex::new(None),
        })
    }

    fn print(&self, label: &str, payload: &MessagePayload) {
        let visibility = if payload.ephemeral { " (only you)" } else { "" };
        println!("[{}{}] {}", label, visibility, payload.render_text());
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "operator".to_string())
}

#[async_trait]
impl Platform for ConsoleAdapter {
    fn name(&self) -> &str {
        "console"
    }

    async fn connect(&self, _token: &str) -> Result<mpsc::Receiver<Event>, PlatformError> {
        tracing::info!("Starting console bot (dev mode)");
        let platform: Arc<dyn Platform> = self
            .me
            .upgrade()
            .ok_or(PlatformError::Unsupported("console adapter dropped"))?;
        let (tx, rx) = mpsc::channel(16);

        tx.send(Event::Ready(ReadyEvent {
            user: self.bot.clone(),
            session_id: None,
        }))
        .await
        .map_err(|e| PlatformError::Network(e.to_string()))?;
        tx.send(Event::GuildCreate(Guild::new(CONSOLE_GUILD_ID, "Console", 1)))
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let operator = self.operator.clone();
        let handle = tokio::spawn(async move {
            let parser = CommandLineParser::default();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let Some(parsed) = parser.parse(&line) else {
                    println!("Type a slash command, e.g. /add first=2 second=3");
                    continue;
                };

                let mut interaction = Interaction::command(parsed.name, operator.clone(), Arc::clone(&platform))
                    .with_guild(CONSOLE_GUILD_ID);
                interaction.options = parsed.options;

                if tx.send(Event::InteractionCreate(interaction)).await.is_err() {
                    break;
                }
            }
        });

        if let Ok(mut reader) = self.reader.lock() {
            *reader = Some(handle);
        }
        Ok(rx)
    }

    async fn put_commands(
        &self,
        _application_id: &str,
        scope: &DeployScope,
        commands: Vec<serde_json::Value>,
    ) -> Result<usize, PlatformError> {
        tracing::info!("Console adapter accepts {} commands ({}) without deploying", commands.len(), scope);
        Ok(commands.len())
    }

    async fn respond(&self, _target: &InteractionTarget, action: ResponseAction) -> Result<(), PlatformError> {
        match action {
            ResponseAction::Reply(payload) => self.print("BOT", &payload),
            ResponseAction::Defer { .. } => println!("[BOT] is thinking..."),
            ResponseAction::FollowUp(payload) => self.print("BOT follow-up", &payload),
            ResponseAction::EditReply(payload) => self.print("BOT edited", &payload),
        }
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, payload: MessagePayload) -> Result<(), PlatformError> {
        self.print(&format!("DM to {}", user_id), &payload);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PlatformError> {
        if let Some(handle) = self.reader.lock().ok().and_then(|mut r| r.take()) {
            handle.abort();
        }
        Ok(())
    }
}
