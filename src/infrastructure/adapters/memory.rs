//! In-memory platform adapter
//!
//! Records every outbound call instead of talking to a network. Used by the
//! `check` command and by tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::application::errors::PlatformError;
use crate::domain::entities::{Event, InteractionTarget, MessagePayload, ReadyEvent, ResponseAction, User};
use crate::domain::traits::{DeployScope, Platform};

/// A recorded command deployment
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub application_id: String,
    pub scope: DeployScope,
    pub commands: Vec<serde_json::Value>,
}

pub struct MemoryPlatform {
    user: User,
    responses: Mutex<Vec<(InteractionTarget, ResponseAction)>>,
    deployments: Mutex<Vec<Deployment>>,
    direct_messages: Mutex<Vec<(String, MessagePayload)>>,
    fail_direct_messages: AtomicBool,
    fail_put_commands: AtomicBool,
    sender: Mutex<Option<mpsc::Sender<Event>>>,
}

impl MemoryPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            user: User::new("0", "memory-bot").as_bot(),
            responses: Mutex::new(Vec::new()),
            deployments: Mutex::new(Vec::new()),
            direct_messages: Mutex::new(Vec::new()),
            fail_direct_messages: AtomicBool::new(false),
            fail_put_commands: AtomicBool::new(false),
            sender: Mutex::new(None),
        })
    }

    /// Make subsequent direct messages fail, as if the user blocked them
    pub fn set_fail_direct_messages(&self, fail: bool) {
        self.fail_direct_messages.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent command deployments fail with a server error
    pub fn set_fail_put_commands(&self, fail: bool) {
        self.fail_put_commands.store(fail, Ordering::SeqCst);
    }

    /// Deliver an event through the connected stream
    pub async fn push(&self, event: Event) -> bool {
        let sender = self.sender.lock().ok().and_then(|s| s.clone());
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    pub fn responses(&self) -> Vec<(InteractionTarget, ResponseAction)> {
        self.responses.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Responses sent for one interaction, in order
    pub fn responses_for(&self, interaction_id: &str) -> Vec<ResponseAction> {
        self.responses()
            .into_iter()
            .filter(|(target, _)| target.id == interaction_id)
            .map(|(_, action)| action)
            .collect()
    }

    pub fn deployments(&self) -> Vec<Deployment> {
        self.deployments.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn direct_messages(&self) -> Vec<(String, MessagePayload)> {
        self.direct_messages.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&self, token: &str) -> Result<mpsc::Receiver<Event>, PlatformError> {
        if token.trim().is_empty() {
            return Err(PlatformError::Auth("empty token".to_string()));
        }

        let (tx, rx) = mpsc::channel(64);
        tx.send(Event::Ready(ReadyEvent {
            user: self.user.clone(),
            session_id: None,
        }))
        .await
        .map_err(|e| PlatformError::Network(e.to_string()))?;

        if let Ok(mut sender) = self.sender.lock() {
            *sender = Some(tx);
        }
        Ok(rx)
    }

    async fn put_commands(
        &self,
        application_id: &str,
        scope: &DeployScope,
        commands: Vec<serde_json::Value>,
    ) -> Result<usize, PlatformError> {
        if self.fail_put_commands.load(Ordering::SeqCst) {
            return Err(PlatformError::Http {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        let count = commands.len();
        if let Ok(mut deployments) = self.deployments.lock() {
            deployments.push(Deployment {
                application_id: application_id.to_string(),
                scope: scope.clone(),
                commands,
            });
        }
        Ok(count)
    }

    async fn respond(&self, target: &InteractionTarget, action: ResponseAction) -> Result<(), PlatformError> {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((target.clone(), action));
        }
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, payload: MessagePayload) -> Result<(), PlatformError> {
        if self.fail_direct_messages.load(Ordering::SeqCst) {
            return Err(PlatformError::Http {
                status: 403,
                body: "Cannot send messages to this user".to_string(),
            });
        }
        if let Ok(mut dms) = self.direct_messages.lock() {
            dms.push((user_id.to_string(), payload));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PlatformError> {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        Ok(())
    }
}
