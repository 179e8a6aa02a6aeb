use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use super::{Guild, Interaction, User};
use crate::domain::traits::EventExecutor;

/// Platform notification kinds the bot can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Ready,
    GuildCreate,
    InteractionCreate,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Ready, EventKind::GuildCreate, EventKind::InteractionCreate];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "ready",
            EventKind::GuildCreate => "guildCreate",
            EventKind::InteractionCreate => "interactionCreate",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Session information delivered once the platform connection is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyEvent {
    pub user: User,
    pub session_id: Option<String>,
}

/// A notification delivered by the platform client, one variant per kind
#[derive(Debug)]
pub enum Event {
    Ready(ReadyEvent),
    GuildCreate(Guild),
    InteractionCreate(Interaction),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready(_) => EventKind::Ready,
            Event::GuildCreate(_) => EventKind::GuildCreate,
            Event::InteractionCreate(_) => EventKind::InteractionCreate,
        }
    }
}

/// A validated event handler
#[derive(Clone)]
pub struct EventDescriptor {
    pub name: EventKind,
    pub once: bool,
    pub execute: Arc<dyn EventExecutor>,
    /// Module file the handler was loaded from
    pub source: PathBuf,
}

impl fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("name", &self.name)
            .field("once", &self.once)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
