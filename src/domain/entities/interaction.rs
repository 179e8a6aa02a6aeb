//! Incoming interactions and their response state machine

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex};

use super::{MessagePayload, User};
use crate::application::errors::InteractionError;
use crate::domain::traits::Platform;

/// Interaction types delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    ChatInputCommand,
    Component,
    Autocomplete,
    ModalSubmit,
}

/// Value supplied for a command option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(String),
}

impl OptionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) | OptionValue::User(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) | OptionValue::User(s) => write!(f, "{}", s),
            OptionValue::Integer(i) => write!(f, "{}", i),
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOption {
    pub name: String,
    pub value: OptionValue,
}

/// Whether the requester has been answered yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    NotYetResponded,
    Deferred,
    Replied,
}

/// Addressing data needed to answer an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionTarget {
    pub id: String,
    pub token: String,
    pub application_id: String,
    pub channel_id: Option<String>,
}

/// A response sent through the platform
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseAction {
    Reply(MessagePayload),
    Defer { ephemeral: bool },
    FollowUp(MessagePayload),
    EditReply(MessagePayload),
}

/// An interaction delivered by the platform
pub struct Interaction {
    pub target: InteractionTarget,
    pub kind: InteractionKind,
    pub command_name: String,
    pub options: Vec<InteractionOption>,
    pub user: User,
    pub guild_id: Option<String>,
    pub created_at: DateTime<Utc>,
    state: Mutex<ResponseState>,
    platform: Arc<dyn Platform>,
}

impl Interaction {
    pub fn new(target: InteractionTarget, kind: InteractionKind, user: User, platform: Arc<dyn Platform>) -> Self {
        Self {
            target,
            kind,
            command_name: String::new(),
            options: Vec::new(),
            user,
            guild_id: None,
            created_at: Utc::now(),
            state: Mutex::new(ResponseState::NotYetResponded),
            platform,
        }
    }

    /// Build a slash-command interaction with a fresh id and token
    pub fn command(name: impl Into<String>, user: User, platform: Arc<dyn Platform>) -> Self {
        let target = InteractionTarget {
            id: uuid::Uuid::new_v4().to_string(),
            token: uuid::Uuid::new_v4().simple().to_string(),
            application_id: String::new(),
            channel_id: None,
        };
        let mut interaction = Self::new(target, InteractionKind::ChatInputCommand, user, platform);
        interaction.command_name = name.into();
        interaction
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.push(InteractionOption {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_chat_input_command(&self) -> bool {
        self.kind == InteractionKind::ChatInputCommand
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.iter().find(|o| o.name == name).map(|o| &o.value)
    }

    pub fn state(&self) -> ResponseState {
        self.state.lock().map(|s| *s).unwrap_or(ResponseState::Replied)
    }

    pub fn replied(&self) -> bool {
        self.state() == ResponseState::Replied
    }

    pub fn deferred(&self) -> bool {
        self.state() == ResponseState::Deferred
    }

    /// Send the initial response
    pub async fn reply(&self, payload: MessagePayload) -> Result<(), InteractionError> {
        let previous = self.transition(&[ResponseState::NotYetResponded], ResponseState::Replied)
            .ok_or(InteractionError::AlreadyAcknowledged)?;
        self.send(ResponseAction::Reply(payload), previous).await
    }

    /// Acknowledge now and answer later via `edit_reply` or `follow_up`
    pub async fn defer_reply(&self, ephemeral: bool) -> Result<(), InteractionError> {
        let previous = self.transition(&[ResponseState::NotYetResponded], ResponseState::Deferred)
            .ok_or(InteractionError::AlreadyAcknowledged)?;
        self.send(ResponseAction::Defer { ephemeral }, previous).await
    }

    /// Send an additional message after the interaction was acknowledged
    pub async fn follow_up(&self, payload: MessagePayload) -> Result<(), InteractionError> {
        let current = self.state();
        if current == ResponseState::NotYetResponded {
            return Err(InteractionError::NotAcknowledged);
        }
        self.send(ResponseAction::FollowUp(payload), current).await
    }

    /// Replace the original response, completing a deferred one
    pub async fn edit_reply(&self, payload: MessagePayload) -> Result<(), InteractionError> {
        let previous = self.transition(&[ResponseState::Deferred, ResponseState::Replied], ResponseState::Replied)
            .ok_or(InteractionError::NotAcknowledged)?;
        self.send(ResponseAction::EditReply(payload), previous).await
    }

    /// Moves to `next` if the current state is one of `from`, returning the old state
    fn transition(&self, from: &[ResponseState], next: ResponseState) -> Option<ResponseState> {
        let mut state = self.state.lock().ok()?;
        if !from.contains(&*state) {
            return None;
        }
        let previous = *state;
        *state = next;
        Some(previous)
    }

    async fn send(&self, action: ResponseAction, previous: ResponseState) -> Result<(), InteractionError> {
        if let Err(e) = self.platform.respond(&self.target, action).await {
            // nothing reached the requester, so the old state still holds
            if let Ok(mut state) = self.state.lock() {
                *state = previous;
            }
            return Err(InteractionError::Platform(e));
        }
        Ok(())
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.target.id)
            .field("kind", &self.kind)
            .field("command_name", &self.command_name)
            .field("options", &self.options)
            .field("user", &self.user)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
