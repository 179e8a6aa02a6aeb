//! Interaction dispatcher - Routes slash-command interactions to registered commands

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::application::errors::HandlerError;
use crate::application::services::CommandRegistry;
use crate::domain::entities::{Event, MessagePayload};
use crate::domain::traits::EventExecutor;
use crate::infrastructure::client::Client;

/// Shown to the requester when a command fails
pub const GENERIC_FAILURE: &str = "There was an error while executing this command!";

/// Handler for `interactionCreate`: looks up and runs the invoked command
pub struct InteractionDispatcher {
    commands: Arc<CommandRegistry>,
}

impl InteractionDispatcher {
    pub fn new(commands: Arc<CommandRegistry>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl EventExecutor for InteractionDispatcher {
    async fn execute(&self, client: &Client, event: &Event) -> Result<(), HandlerError> {
        let Event::InteractionCreate(interaction) = event else {
            return Ok(());
        };
        if !interaction.is_chat_input_command() {
            return Ok(());
        }

        let name = interaction.command_name.as_str();
        let Some(command) = self.commands.get(name) else {
            tracing::warn!("No command matching {} was found.", name);
            return Ok(());
        };

        let outcome = AssertUnwindSafe(command.execute.execute(client, interaction))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::ExecutionFailed(panic_message(panic.as_ref()))));

        match outcome {
            Ok(()) => {
                tracing::info!(outcome = "success", "{} executed /{}", interaction.user.tag(), name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error executing command {}: {}", name, e);

                let payload = MessagePayload::text(GENERIC_FAILURE).ephemeral();
                if interaction.replied() || interaction.deferred() {
                    interaction.follow_up(payload).await?;
                } else {
                    interaction.reply(payload).await?;
                }
                Ok(())
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("handler panicked: {}", detail)
}
