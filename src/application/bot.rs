//! Bot orchestrator - wires the loader, both registries and the client together

use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::services::{CommandCatalog, CommandRegistry, EventCatalog, EventRegistry};
use crate::builtins;
use crate::domain::traits::{DeployScope, Platform};
use crate::infrastructure::client::Client;
use crate::infrastructure::config::{Config, Credentials};
use crate::infrastructure::modules::ModuleLoader;

pub struct Bot {
    config: Config,
    credentials: Credentials,
    client: Arc<Client>,
    commands: Arc<CommandRegistry>,
    events: EventRegistry,
}

impl Bot {
    /// Bot running the built-in executors
    pub fn new(config: Config, credentials: Credentials, platform: Arc<dyn Platform>) -> Result<Self, BotError> {
        Self::with_catalogs(
            config,
            credentials,
            platform,
            builtins::command_catalog(),
            builtins::event_catalog,
        )
    }

    /// `events` receives the command registry so a dispatcher can be wired into it
    pub fn with_catalogs<F>(
        config: Config,
        credentials: Credentials,
        platform: Arc<dyn Platform>,
        commands: CommandCatalog,
        events: F,
    ) -> Result<Self, BotError>
    where
        F: FnOnce(Arc<CommandRegistry>) -> EventCatalog,
    {
        let options = config.modules.load_options()?;
        let client = Client::new(platform);

        let command_loader = ModuleLoader::new(&config.modules.commands_dir).with_options(options.clone());
        let commands = Arc::new(CommandRegistry::new(command_loader, commands));

        let event_loader = ModuleLoader::new(&config.modules.events_dir).with_options(options);
        let events = EventRegistry::new(event_loader, events(Arc::clone(&commands)), Arc::clone(&client));

        Ok(Self {
            config,
            credentials,
            client,
            commands,
            events,
        })
    }

    /// Load every command and event module
    pub async fn load(&self) -> Result<(usize, usize), BotError> {
        let commands = self.commands.load_commands().await?;
        let events = self.events.load_events().await?;
        Ok((commands, events))
    }

    /// Load modules, register commands remotely, then connect
    pub async fn start(&self) -> Result<(), BotError> {
        let token = self.credentials.require_token()?.to_string();
        tracing::info!("Starting {} on {}", self.config.bot.name, self.client.platform().name());

        self.load().await?;
        self.deploy_commands().await;

        self.client
            .login(&token)
            .await
            .map_err(|e| BotError::Startup(format!("login failed: {}", e)))?;
        Ok(())
    }

    /// Push the loaded definitions; failures are logged, never fatal
    ///
    /// Returns the number of commands the platform accepted, or None when
    /// deployment was skipped or failed.
    pub async fn deploy_commands(&self) -> Option<usize> {
        let Some(client_id) = self.credentials.client_id.as_deref() else {
            tracing::warn!("CLIENT_ID not found - skipping command deployment");
            return None;
        };

        let scope = match self.credentials.guild_id.as_deref() {
            Some(guild_id) => DeployScope::Guild(guild_id.to_string()),
            None => {
                tracing::warn!("GUILD_ID not set - deploying globally, changes may take up to an hour");
                DeployScope::Global
            }
        };

        let definitions = self.commands.definitions();
        tracing::info!("Started refreshing {} application (/) commands ({})", definitions.len(), scope);

        match self.client.deploy_commands(client_id, &scope, definitions).await {
            Ok(count) => {
                tracing::info!(outcome = "success", "Successfully reloaded {} application (/) commands", count);
                Some(count)
            }
            Err(e) => {
                tracing::error!("Failed to deploy commands: {}", e);
                None
            }
        }
    }

    /// Reload every command and event module, then redeploy
    pub async fn reload(&self) -> Result<(usize, usize), BotError> {
        let commands = self.commands.reload_all().await?;
        let events = self.events.reload_events().await?;
        self.deploy_commands().await;
        Ok((commands, events))
    }

    pub async fn shutdown(&self) -> Result<(), BotError> {
        tracing::info!("Shutting down {}...", self.config.bot.name);
        self.client.destroy().await?;
        Ok(())
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
