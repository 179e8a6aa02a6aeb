use async_trait::async_trait;

use crate::application::errors::HandlerError;
use crate::domain::entities::Event;
use crate::domain::traits::EventExecutor;
use crate::infrastructure::client::Client;

/// Logs the session identity once the platform is connected
pub struct ReadyHandler;

#[async_trait]
impl EventExecutor for ReadyHandler {
    async fn execute(&self, client: &Client, event: &Event) -> Result<(), HandlerError> {
        let Event::Ready(ready) = event else {
            return Ok(());
        };
        tracing::info!(outcome = "success", "Bot is ready! Logged in as {}", ready.user.tag());
        tracing::info!(
            "Serving {} servers with {} members",
            client.guild_count(),
            client.member_count()
        );
        Ok(())
    }
}

pub struct GuildCreateHandler;

#[async_trait]
impl EventExecutor for GuildCreateHandler {
    async fn execute(&self, _client: &Client, event: &Event) -> Result<(), HandlerError> {
        if let Event::GuildCreate(guild) = event {
            tracing::info!(
                "Joined new guild: {} ({}) with {} members",
                guild.name,
                guild.id,
                guild.member_count
            );
        }
        Ok(())
    }
}
