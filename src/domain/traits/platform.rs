use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::errors::PlatformError;
use crate::domain::entities::{Event, InteractionTarget, MessagePayload, ResponseAction};

/// Platform trait - abstraction over the chat platform's client library
#[async_trait]
pub trait Platform: Send + Sync {
    /// Short adapter name used in logs
    fn name(&self) -> &str;

    /// Authenticate and start delivering notifications
    async fn connect(&self, token: &str) -> Result<mpsc::Receiver<Event>, PlatformError>;

    /// Replace the registered command list for `scope`, returning how many were accepted
    async fn put_commands(
        &self,
        application_id: &str,
        scope: &DeployScope,
        commands: Vec<serde_json::Value>,
    ) -> Result<usize, PlatformError>;

    /// Answer an interaction
    async fn respond(&self, target: &InteractionTarget, action: ResponseAction) -> Result<(), PlatformError>;

    /// Open a direct-message channel with a user and post into it
    async fn send_direct_message(&self, user_id: &str, payload: MessagePayload) -> Result<(), PlatformError>;

    /// Last measured round trip to the platform, if the adapter tracks one
    fn latency(&self) -> Option<Duration> {
        None
    }

    /// Close the connection; no further events are delivered afterwards
    async fn disconnect(&self) -> Result<(), PlatformError>;
}

/// Where command definitions are registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployScope {
    /// Every guild; propagation is slow
    Global,
    /// One guild; visible immediately
    Guild(String),
}

impl fmt::Display for DeployScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployScope::Global => write!(f, "global"),
            DeployScope::Guild(id) => write!(f, "guild {}", id),
        }
    }
}
