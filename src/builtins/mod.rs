//! Executors compiled into the bot
//!
//! Module files select one of these through their `execute` key.

pub mod commands;
pub mod events;

use std::sync::Arc;

use crate::application::messaging::InteractionDispatcher;
use crate::application::services::{CommandCatalog, CommandRegistry, EventCatalog};

/// Command executors keyed as module files refer to them
pub fn command_catalog() -> CommandCatalog {
    CommandCatalog::new()
        .with("add", Arc::new(commands::AddCommand))
        .with("info", Arc::new(commands::InfoCommand))
        .with("ping", Arc::new(commands::PingCommand))
        .with("whisper", Arc::new(commands::WhisperCommand))
}

/// Event executors; `interactionCreate` dispatches into `commands`
pub fn event_catalog(commands: Arc<CommandRegistry>) -> EventCatalog {
    EventCatalog::new()
        .with("ready", Arc::new(events::ReadyHandler))
        .with("guildCreate", Arc::new(events::GuildCreateHandler))
        .with("interactionCreate", Arc::new(InteractionDispatcher::new(commands)))
}
