use async_trait::async_trait;

use crate::application::errors::HandlerError;
use crate::domain::entities::{Event, Interaction};
use crate::infrastructure::client::Client;

/// Runs a slash command
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, client: &Client, interaction: &Interaction) -> Result<(), HandlerError>;
}

/// Runs in response to a platform notification
#[async_trait]
pub trait EventExecutor: Send + Sync {
    async fn execute(&self, client: &Client, event: &Event) -> Result<(), HandlerError>;
}
