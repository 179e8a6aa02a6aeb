//! Event registry - bridges event handler modules to the platform client

use async_trait::async_trait;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::Mutex;

use super::catalog::EventCatalog;
use super::command_registry::describe;
use crate::application::errors::{RegistryError, ValidationError};
use crate::domain::entities::{Event, EventDescriptor, EventKind};
use crate::infrastructure::client::{Client, Listener, ListenerId};
use crate::infrastructure::modules::{LoadedModule, ModuleLoader};

/// Check a loaded module against the event shape, without side effects
pub fn validate_event(module: &LoadedModule, catalog: &EventCatalog) -> Result<EventDescriptor, ValidationError> {
    let value = &module.value;
    if !value.is_mapping() {
        return Err(ValidationError::NotAMapping);
    }

    let name = value.get("name").ok_or(ValidationError::MissingField("name"))?;
    let execute = value.get("execute").ok_or(ValidationError::MissingField("execute"))?;

    let name = match name.as_str() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ValidationError::EmptyName("name")),
    };
    let kind: EventKind = name
        .parse()
        .map_err(ValidationError::UnknownEvent)?;

    let executor = execute
        .as_str()
        .and_then(|key| catalog.resolve(key))
        .ok_or_else(|| ValidationError::NotCallable(describe(execute)))?;

    Ok(EventDescriptor {
        name: kind,
        once: value.get("once").and_then(Value::as_bool).unwrap_or(false),
        execute: executor,
        source: module.path.clone(),
    })
}

pub fn is_valid_event(module: &LoadedModule, catalog: &EventCatalog) -> bool {
    validate_event(module, catalog).is_ok()
}

type EventTable = RwLock<BTreeMap<EventKind, RegisteredEvent>>;

/// Wraps a handler so its failures are logged instead of reaching the client
struct GuardedListener {
    descriptor: Arc<EventDescriptor>,
    /// Set for once-handlers, whose record is dropped when they fire
    table: Option<Weak<EventTable>>,
}

impl GuardedListener {
    /// Forget this handler's record, unless a reload already replaced it
    fn retire(&self) {
        let Some(table) = self.table.as_ref().and_then(Weak::upgrade) else {
            return;
        };
        let Ok(mut events) = table.write() else {
            return;
        };
        let kind = self.descriptor.name;
        if events
            .get(&kind)
            .is_some_and(|entry| Arc::ptr_eq(&entry.descriptor, &self.descriptor))
        {
            events.remove(&kind);
            tracing::debug!("Once event {} fired and was unregistered", kind);
        }
    }
}

#[async_trait]
impl Listener for GuardedListener {
    async fn handle(&self, client: Arc<Client>, event: Arc<Event>) {
        self.retire();
        let execute = Arc::clone(&self.descriptor.execute);
        let outcome = tokio::spawn(async move { execute.execute(&client, &event).await }).await;

        let name = self.descriptor.name;
        let source = self.descriptor.source.display();
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Error executing event {} from {}: {}", name, source, e),
            Err(e) if e.is_panic() => tracing::error!("Event handler {} from {} panicked", name, source),
            Err(e) => tracing::error!("Event handler {} from {} was cancelled: {}", name, source, e),
        }
    }
}

struct RegisteredEvent {
    descriptor: Arc<EventDescriptor>,
    listener: ListenerId,
}

/// Registry for event handlers loaded from module files
pub struct EventRegistry {
    loader: ModuleLoader,
    catalog: EventCatalog,
    client: Arc<Client>,
    events: Arc<EventTable>,
    reload_guard: Mutex<()>,
}

impl EventRegistry {
    pub fn new(loader: ModuleLoader, catalog: EventCatalog, client: Arc<Client>) -> Self {
        Self {
            loader,
            catalog,
            client,
            events: Arc::new(RwLock::new(BTreeMap::new())),
            reload_guard: Mutex::new(()),
        }
    }

    /// Load every event module and attach it to the client
    pub async fn load_events(&self) -> Result<usize, RegistryError> {
        let _guard = self.reload_guard.try_lock().map_err(|_| {
            tracing::warn!("Event load skipped: another reload is in progress");
            RegistryError::ReloadInProgress
        })?;
        Ok(self.load_unguarded().await)
    }

    async fn load_unguarded(&self) -> usize {
        let modules = self.loader.load_all().await;

        let mut registered = 0;
        for module in modules.iter() {
            match validate_event(module, &self.catalog) {
                Ok(descriptor) => {
                    self.register(descriptor);
                    registered += 1;
                }
                Err(e) => {
                    tracing::warn!("Invalid event structure in file: {} ({})", module.path.display(), e);
                }
            }
        }

        tracing::info!(outcome = "success", "Successfully loaded {} events", self.len());
        registered
    }

    /// Detach every client listener, forget all handlers, then load again
    pub async fn reload_events(&self) -> Result<usize, RegistryError> {
        let _guard = self.reload_guard.try_lock().map_err(|_| {
            tracing::warn!("Event reload skipped: another reload is in progress");
            RegistryError::ReloadInProgress
        })?;

        tracing::info!("Reloading all events...");
        self.client.remove_all_listeners();
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
        Ok(self.load_unguarded().await)
    }

    fn register(&self, descriptor: EventDescriptor) {
        let descriptor = Arc::new(descriptor);
        let kind = descriptor.name;
        let Ok(mut events) = self.events.write() else {
            tracing::error!("Event registry lock poisoned; dropping {}", kind);
            return;
        };

        if let Some(previous) = events.remove(&kind) {
            self.client.remove_listener(previous.listener);
            tracing::warn!(
                "Event {} from {} replaces the one from {}",
                kind,
                descriptor.source.display(),
                previous.descriptor.source.display()
            );
        }

        let listener = Arc::new(GuardedListener {
            descriptor: Arc::clone(&descriptor),
            table: descriptor.once.then(|| Arc::downgrade(&self.events)),
        });
        let id = if descriptor.once {
            self.client.once(kind, listener)
        } else {
            self.client.on(kind, listener)
        };

        tracing::info!(
            "Registered event: {} ({}) from {}",
            kind,
            if descriptor.once { "once" } else { "on" },
            descriptor.source.display()
        );
        events.insert(kind, RegisteredEvent { descriptor, listener: id });
    }

    pub fn get(&self, kind: EventKind) -> Option<Arc<EventDescriptor>> {
        self.events.read().ok()?.get(&kind).map(|e| Arc::clone(&e.descriptor))
    }

    pub fn has(&self, kind: EventKind) -> bool {
        self.events
            .read()
            .map(|e| e.contains_key(&kind))
            .unwrap_or(false)
    }

    pub fn list(&self) -> Vec<Arc<EventDescriptor>> {
        self.events
            .read()
            .map(|e| e.values().map(|r| Arc::clone(&r.descriptor)).collect())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .read()
            .map(|e| e.keys().map(|k| k.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerError;
    use crate::domain::traits::EventExecutor;

    struct Noop;

    #[async_trait]
    impl EventExecutor for Noop {
        async fn execute(&self, _client: &Client, _event: &Event) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn module(source: &str) -> LoadedModule {
        LoadedModule::parse("events/test.yaml", source).unwrap()
    }

    #[test]
    fn test_valid_event_defaults_to_persistent() {
        let catalog = EventCatalog::new().with("noop", Arc::new(Noop));
        let descriptor = validate_event(&module("name: guildCreate\nexecute: noop\n"), &catalog).unwrap();
        assert_eq!(descriptor.name, EventKind::GuildCreate);
        assert!(!descriptor.once);

        let descriptor = validate_event(&module("name: ready\nonce: true\nexecute: noop\n"), &catalog).unwrap();
        assert!(descriptor.once);
    }

    #[test]
    fn test_invalid_events() {
        let catalog = EventCatalog::new().with("noop", Arc::new(Noop));
        let cases = [
            ("execute: noop\n", ValidationError::MissingField("name")),
            ("name: ready\n", ValidationError::MissingField("execute")),
            ("name: 3\nexecute: noop\n", ValidationError::EmptyName("name")),
            ("name: messageCreate\nexecute: noop\n", ValidationError::UnknownEvent("messageCreate".to_string())),
            ("name: ready\nexecute: nothing\n", ValidationError::NotCallable("nothing".to_string())),
            ("just a string", ValidationError::NotAMapping),
        ];
        for (source, expected) in cases {
            assert_eq!(validate_event(&module(source), &catalog).unwrap_err(), expected, "{}", source);
        }
    }
}
