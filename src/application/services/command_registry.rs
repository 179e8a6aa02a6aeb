//! Command registry - owns the command name → descriptor mapping

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use super::catalog::CommandCatalog;
use crate::application::errors::{RegistryError, ValidationError};
use crate::domain::entities::{CommandDefinition, CommandDescriptor};
use crate::infrastructure::modules::{LoadedModule, ModuleLoader};

/// Check a loaded module against the command shape, without side effects
///
/// Valid iff it is a mapping with `definition` and `execute`, `execute` names
/// a catalog entry and `definition.name` is a non-empty string.
pub fn validate_command(module: &LoadedModule, catalog: &CommandCatalog) -> Result<CommandDescriptor, ValidationError> {
    let value = &module.value;
    if !value.is_mapping() {
        return Err(ValidationError::NotAMapping);
    }

    let definition = value.get("definition").ok_or(ValidationError::MissingField("definition"))?;
    let execute = value.get("execute").ok_or(ValidationError::MissingField("execute"))?;

    match definition.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {}
        _ => return Err(ValidationError::EmptyName("definition.name")),
    }

    let executor = execute
        .as_str()
        .and_then(|key| catalog.resolve(key))
        .ok_or_else(|| ValidationError::NotCallable(describe(execute)))?;

    let definition: CommandDefinition =
        serde_yaml::from_value(definition.clone()).map_err(|e| ValidationError::Definition(e.to_string()))?;

    Ok(CommandDescriptor {
        definition,
        execute: executor,
        source: module.path.clone(),
    })
}

pub fn is_valid_command(module: &LoadedModule, catalog: &CommandCatalog) -> bool {
    validate_command(module, catalog).is_ok()
}

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

fn definition_name(module: &LoadedModule) -> Option<&str> {
    module.get("definition")?.get("name")?.as_str()
}

/// Registry for slash commands loaded from module files
pub struct CommandRegistry {
    loader: ModuleLoader,
    catalog: CommandCatalog,
    commands: RwLock<BTreeMap<String, Arc<CommandDescriptor>>>,
    reload_guard: Mutex<()>,
}

impl CommandRegistry {
    pub fn new(loader: ModuleLoader, catalog: CommandCatalog) -> Self {
        Self {
            loader,
            catalog,
            commands: RwLock::new(BTreeMap::new()),
            reload_guard: Mutex::new(()),
        }
    }

    /// Load every command module; safe to call repeatedly, entries are replaced by name
    pub async fn load_commands(&self) -> Result<usize, RegistryError> {
        let _guard = self.reload_guard.try_lock().map_err(|_| {
            tracing::warn!("Command load skipped: another reload is in progress");
            RegistryError::ReloadInProgress
        })?;
        Ok(self.load_unguarded().await)
    }

    async fn load_unguarded(&self) -> usize {
        let modules = self.loader.load_all().await;

        let mut registered = 0;
        for module in modules.iter() {
            match validate_command(module, &self.catalog) {
                Ok(descriptor) => {
                    self.register(descriptor);
                    registered += 1;
                }
                Err(e) => {
                    tracing::warn!("Invalid command structure in file: {} ({})", module.path.display(), e);
                }
            }
        }

        tracing::info!(
            outcome = "success",
            "Successfully loaded {} commands from {}",
            self.len(),
            self.loader.directory().display()
        );
        registered
    }

    /// Re-read the file backing `name` and replace its entry
    ///
    /// Returns false, keeping the previous entry, if the file cannot be found
    /// or no longer validates.
    pub async fn reload_command(&self, name: &str) -> bool {
        let Ok(_guard) = self.reload_guard.try_lock() else {
            tracing::warn!("Reload of {} skipped: another reload is in progress", name);
            return false;
        };

        let Some(path) = self.find_command_file(name).await else {
            tracing::error!("Command file for {} not found", name);
            return false;
        };

        let Some(module) = ModuleLoader::reload_one(&path).await else {
            tracing::error!("Failed to reload command: {}", name);
            return false;
        };

        let descriptor = match validate_command(&module, &self.catalog) {
            Ok(descriptor) if descriptor.name() == name => descriptor,
            Ok(descriptor) => {
                tracing::error!(
                    "Failed to reload command: {} (file now defines {})",
                    name,
                    descriptor.name()
                );
                return false;
            }
            Err(e) => {
                tracing::error!("Failed to reload command: {} ({})", name, e);
                return false;
            }
        };

        self.register(descriptor);
        tracing::info!(outcome = "success", "Successfully reloaded command: {}", name);
        true
    }

    /// Clear the mapping and load everything again
    ///
    /// Lookups during the reload may briefly see an empty registry.
    pub async fn reload_all(&self) -> Result<usize, RegistryError> {
        let _guard = self.reload_guard.try_lock().map_err(|_| {
            tracing::warn!("Command reload skipped: another reload is in progress");
            RegistryError::ReloadInProgress
        })?;

        tracing::info!("Reloading all commands...");
        if let Ok(mut commands) = self.commands.write() {
            commands.clear();
        }
        Ok(self.load_unguarded().await)
    }

    /// The active descriptor's source, else the last file in scan order defining `name`
    async fn find_command_file(&self, name: &str) -> Option<std::path::PathBuf> {
        if let Some(command) = self.get(name) {
            let on_disk = tokio::fs::metadata(&command.source)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if on_disk {
                return Some(command.source.clone());
            }
        }
        self.loader
            .load_all()
            .await
            .into_iter()
            .filter(|module| definition_name(module) == Some(name))
            .last()
            .map(|module| module.path)
    }

    fn register(&self, descriptor: CommandDescriptor) {
        let name = descriptor.name().to_string();
        let source = descriptor.source.clone();
        let Ok(mut commands) = self.commands.write() else {
            tracing::error!("Command registry lock poisoned; dropping {}", name);
            return;
        };

        if let Some(previous) = commands.insert(name.clone(), Arc::new(descriptor)) {
            if previous.source != source {
                tracing::warn!(
                    "Command {} from {} replaces the one from {}",
                    name,
                    source.display(),
                    previous.source.display()
                );
            }
        }
        tracing::info!("Registered command: {}", name);
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands.read().ok()?.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands
            .read()
            .map(|c| c.contains_key(name))
            .unwrap_or(false)
    }

    /// All commands, ordered by name
    pub fn list(&self) -> Vec<Arc<CommandDescriptor>> {
        self.commands
            .read()
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.commands
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Definitions in the remote registration format, ordered by name
    pub fn definitions(&self) -> Vec<serde_json::Value> {
        self.list().iter().map(|c| c.definition.to_json()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerError;
    use crate::domain::entities::Interaction;
    use crate::domain::traits::CommandExecutor;
    use crate::infrastructure::client::Client;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandExecutor for Noop {
        async fn execute(&self, _client: &Client, _interaction: &Interaction) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn catalog() -> CommandCatalog {
        CommandCatalog::new().with("noop", Arc::new(Noop))
    }

    fn module(source: &str) -> LoadedModule {
        LoadedModule::parse("commands/test.yaml", source).unwrap()
    }

    #[test]
    fn test_valid_command() {
        let m = module("definition:\n  name: hello\n  description: Hi\nexecute: noop\n");
        let descriptor = validate_command(&m, &catalog()).unwrap();
        assert_eq!(descriptor.name(), "hello");
        assert_eq!(descriptor.source, std::path::PathBuf::from("commands/test.yaml"));
    }

    #[test]
    fn test_invalid_shapes() {
        let catalog = catalog();
        let cases = [
            ("- just\n- a list\n", ValidationError::NotAMapping),
            ("execute: noop\n", ValidationError::MissingField("definition")),
            ("definition:\n  name: x\n", ValidationError::MissingField("execute")),
            ("definition:\n  description: x\nexecute: noop\n", ValidationError::EmptyName("definition.name")),
            ("definition:\n  name: \"\"\nexecute: noop\n", ValidationError::EmptyName("definition.name")),
            ("definition:\n  name: 7\nexecute: noop\n", ValidationError::EmptyName("definition.name")),
            ("definition:\n  name: x\nexecute: missing\n", ValidationError::NotCallable("missing".to_string())),
            ("definition:\n  name: x\nexecute: 42\n", ValidationError::NotCallable("42".to_string())),
        ];
        for (source, expected) in cases {
            assert_eq!(validate_command(&module(source), &catalog).unwrap_err(), expected, "{}", source);
        }
    }

    #[test]
    fn test_bad_option_type_is_rejected() {
        let m = module("definition:\n  name: x\n  options:\n    - name: a\n      type: colour\nexecute: noop\n");
        assert!(matches!(validate_command(&m, &catalog()), Err(ValidationError::Definition(_))));
    }

    #[tokio::test]
    async fn test_reload_refused_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let registry = CommandRegistry::new(ModuleLoader::new(dir.path()), catalog());

        let _held = registry.reload_guard.lock().await;
        assert!(matches!(registry.reload_all().await, Err(RegistryError::ReloadInProgress)));
        assert!(!registry.reload_command("anything").await);
    }

    #[test]
    fn test_accessors_on_empty_registry() {
        let registry = CommandRegistry::new(ModuleLoader::new("/nonexistent"), catalog());
        assert!(registry.get("x").is_none());
        assert!(!registry.has("x"));
        assert!(registry.list().is_empty());
        assert!(registry.names().is_empty());
        assert!(registry.is_empty());
    }
}
