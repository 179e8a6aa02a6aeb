//! Discord adapter
//!
//! Talks to the Discord REST API for identity, guild discovery, command
//! registration, interaction responses and direct messages. Gateway delivery
//! of interactions is handled by the platform's own client library.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::application::errors::PlatformError;
use crate::domain::entities::{
    Event, Guild, InteractionTarget, MessagePayload, ReadyEvent, ResponseAction, User, message::EPHEMERAL_FLAG,
};
use crate::domain::traits::{DeployScope, Platform};

/// Discord API base URL
const API_BASE: &str = "https://discord.com/api/v10";

/// Interaction callback types
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
const DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE: u8 = 5;

/// Discord REST adapter
pub struct DiscordAdapter {
    token: RwLock<String>,
    client: Client,
    api_base: String,
    latency: Mutex<Option<Duration>>,
    sender: Mutex<Option<mpsc::Sender<Event>>>,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(token.into()),
            client: Client::new(),
            api_base: API_BASE.to_string(),
            latency: Mutex::new(None),
            sender: Mutex::new(None),
        }
    }

    /// Point the adapter at a different API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn token(&self) -> String {
        self.token.read().map(|t| t.clone()).unwrap_or_default()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send a request and fail on any non-success status
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, PlatformError> {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bot {}", self.token()));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PlatformError::Auth("token rejected".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn fetch_current_user(&self) -> Result<User, PlatformError> {
        let started = Instant::now();
        let response = self.request(Method::GET, "/users/@me", None).await?;
        if let Ok(mut latency) = self.latency.lock() {
            *latency = Some(started.elapsed());
        }
        response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))
    }

    async fn fetch_guilds(&self) -> Result<Vec<Guild>, PlatformError> {
        self.request(Method::GET, "/users/@me/guilds?with_counts=true", None)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))
    }
}

/// REST route for a command deployment
pub fn commands_route(application_id: &str, scope: &DeployScope) -> String {
    match scope {
        DeployScope::Global => format!("/applications/{}/commands", application_id),
        DeployScope::Guild(guild_id) => format!("/applications/{}/guilds/{}/commands", application_id, guild_id),
    }
}

/// REST method, route and body for an interaction response
pub fn response_request(target: &InteractionTarget, action: &ResponseAction) -> (Method, String, serde_json::Value) {
    match action {
        ResponseAction::Reply(payload) => (
            Method::POST,
            format!("/interactions/{}/{}/callback", target.id, target.token),
            json!({ "type": CHANNEL_MESSAGE_WITH_SOURCE, "data": payload.to_json() }),
        ),
        ResponseAction::Defer { ephemeral } => {
            let flags = if *ephemeral { EPHEMERAL_FLAG } else { 0 };
            (
                Method::POST,
                format!("/interactions/{}/{}/callback", target.id, target.token),
                json!({ "type": DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE, "data": { "flags": flags } }),
            )
        }
        ResponseAction::FollowUp(payload) => (
            Method::POST,
            format!("/webhooks/{}/{}", target.application_id, target.token),
            payload.to_json(),
        ),
        ResponseAction::EditReply(payload) => (
            Method::PATCH,
            format!("/webhooks/{}/{}/messages/@original", target.application_id, target.token),
            payload.to_json(),
        ),
    }
}

#[async_trait]
impl Platform for DiscordAdapter {
    fn name(&self) -> &str {
        "discord"
    }

    async fn connect(&self, token: &str) -> Result<mpsc::Receiver<Event>, PlatformError> {
        if let Ok(mut current) = self.token.write() {
            *current = token.to_string();
        }

        let user = self.fetch_current_user().await?;
        let guilds = self.fetch_guilds().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch guilds: {}", e);
            Vec::new()
        });

        let (tx, rx) = mpsc::channel(64);
        tx.send(Event::Ready(ReadyEvent { user, session_id: None }))
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        for guild in guilds {
            tx.send(Event::GuildCreate(guild))
                .await
                .map_err(|e| PlatformError::Network(e.to_string()))?;
        }

        // the stream stays open until disconnect
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
        let route = commands_route(application_id, scope);
        let registered: Vec<serde_json::Value> = self
            .request(Method::PUT, &route, Some(serde_json::Value::Array(commands)))
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;
        Ok(registered.len())
    }

    async fn respond(&self, target: &InteractionTarget, action: ResponseAction) -> Result<(), PlatformError> {
        let (method, route, body) = response_request(target, &action);
        self.request(method, &route, Some(body)).await?;
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, payload: MessagePayload) -> Result<(), PlatformError> {
        #[derive(Deserialize)]
        struct Channel {
            id: String,
        }

        let channel: Channel = self
            .request(Method::POST, "/users/@me/channels", Some(json!({ "recipient_id": user_id })))
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;

        self.request(
            Method::POST,
            &format!("/channels/{}/messages", channel.id),
            Some(payload.to_json()),
        )
        .await?;
        Ok(())
    }

    fn latency(&self) -> Option<Duration> {
        self.latency.lock().ok().and_then(|l| *l)
    }

    async fn disconnect(&self) -> Result<(), PlatformError> {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        tracing::info!("Disconnected from Discord");
        Ok(())
    }
}
