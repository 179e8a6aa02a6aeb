//! Platform client - listener table and event pump shared by both registries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::application::errors::PlatformError;
use crate::domain::entities::{Event, EventKind, Guild, User};
use crate::domain::traits::{DeployScope, Platform};

/// Handle returned when a listener is attached
pub type ListenerId = u64;

/// Receives every notification of the kind it was attached for
#[async_trait]
pub trait Listener: Send + Sync {
    async fn handle(&self, client: Arc<Client>, event: Arc<Event>);
}

struct ListenerEntry {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    listener: Arc<dyn Listener>,
}

/// Client for one platform connection
pub struct Client {
    platform: Arc<dyn Platform>,
    listeners: Mutex<Vec<ListenerEntry>>,
    next_id: AtomicU64,
    user: RwLock<Option<User>>,
    guilds: RwLock<BTreeMap<String, Guild>>,
    ready_at: RwLock<Option<DateTime<Utc>>>,
    started: Instant,
    shutdown: Notify,
    closed: watch::Sender<bool>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    pub fn new(platform: Arc<dyn Platform>) -> Arc<Self> {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            platform,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            user: RwLock::new(None),
            guilds: RwLock::new(BTreeMap::new()),
            ready_at: RwLock::new(None),
            started: Instant::now(),
            shutdown: Notify::new(),
            closed,
            pump: Mutex::new(None),
        })
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Attach a listener invoked on every notification of `kind`
    pub fn on(&self, kind: EventKind, listener: Arc<dyn Listener>) -> ListenerId {
        self.attach(kind, false, listener)
    }

    /// Attach a listener invoked at most once, then detached
    pub fn once(&self, kind: EventKind, listener: Arc<dyn Listener>) -> ListenerId {
        self.attach(kind, true, listener)
    }

    fn attach(&self, kind: EventKind, once: bool, listener: Arc<dyn Listener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.push(ListenerEntry { id, kind, once, listener });
        id
    }

    /// Detach one listener; returns false if it was not attached
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    pub fn remove_all_listeners(&self) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let count = listeners.len();
        listeners.clear();
        tracing::debug!("Removed {} listeners", count);
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.iter().filter(|l| l.kind == kind).count()
    }

    /// Deliver a notification to every listener attached for its kind, in attach order
    pub async fn emit(self: &Arc<Self>, event: Event) {
        self.update_cache(&event);

        let kind = event.kind();
        let targets: Vec<Arc<dyn Listener>> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            let targets = listeners
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| Arc::clone(&l.listener))
                .collect();
            // once-listeners leave the table before they run
            listeners.retain(|l| !(l.once && l.kind == kind));
            targets
        };

        if targets.is_empty() {
            tracing::debug!("No listeners for {}", kind);
            return;
        }

        let event = Arc::new(event);
        for listener in targets {
            listener.handle(Arc::clone(self), Arc::clone(&event)).await;
        }
    }

    fn update_cache(&self, event: &Event) {
        match event {
            Event::Ready(ready) => {
                if let Ok(mut user) = self.user.write() {
                    *user = Some(ready.user.clone());
                }
                if let Ok(mut ready_at) = self.ready_at.write() {
                    *ready_at = Some(Utc::now());
                }
            }
            Event::GuildCreate(guild) => {
                if let Ok(mut guilds) = self.guilds.write() {
                    guilds.insert(guild.id.clone(), guild.clone());
                }
            }
            Event::InteractionCreate(_) => {}
        }
    }

    /// Connect with a bearer token and pump delivered notifications into `emit`
    pub async fn login(self: &Arc<Self>, token: &str) -> Result<(), PlatformError> {
        let mut events = self.platform.connect(token).await?;
        tracing::info!("Connected to {}", self.platform.name());

        let client = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Some(event) => client.emit(event).await,
                        None => {
                            tracing::info!("Event stream from {} ended", client.platform.name());
                            break;
                        }
                    },
                    _ = client.shutdown.notified() => break,
                }
            }
            client.closed.send_replace(true);
        });

        if let Ok(mut pump) = self.pump.lock() {
            *pump = Some(handle);
        }
        Ok(())
    }

    /// Resolves once the event stream has ended or the client was destroyed
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Stop the event pump and disconnect from the platform
    pub async fn destroy(&self) -> Result<(), PlatformError> {
        self.shutdown.notify_one();
        let handle = self.pump.lock().ok().and_then(|mut p| p.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.closed.send_replace(true);
        self.platform.disconnect().await
    }

    /// Push command definitions to the remote registration endpoint (full replace)
    pub async fn deploy_commands(
        &self,
        application_id: &str,
        scope: &DeployScope,
        commands: Vec<serde_json::Value>,
    ) -> Result<usize, PlatformError> {
        self.platform.put_commands(application_id, scope, commands).await
    }

    pub fn user(&self) -> Option<User> {
        self.user.read().ok().and_then(|u| u.clone())
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn member_count(&self) -> u64 {
        self.guilds
            .read()
            .map(|g| g.values().map(|guild| guild.member_count).sum())
            .unwrap_or(0)
    }

    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.ready_at.read().ok().and_then(|r| *r)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
