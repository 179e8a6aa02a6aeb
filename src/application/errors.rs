//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Module discovery and loading errors
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
}

/// A loaded module that does not have the shape its registry requires
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("module is not a mapping")]
    NotAMapping,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a non-empty string")]
    EmptyName(&'static str),

    #[error("`execute` does not name a registered handler: {0}")]
    NotCallable(String),

    #[error("unsupported event `{0}`")]
    UnknownEvent(String),

    #[error("invalid definition: {0}")]
    Definition(String),
}

/// Registry operation errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Another reload is already in progress")]
    ReloadInProgress,
}

/// Raised by a command or event executor at runtime
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Illegal response transitions on an interaction
#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("Interaction has already been acknowledged")]
    AlreadyAcknowledged,

    #[error("Interaction has not been replied to or deferred")]
    NotAcknowledged,

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors surfaced by a platform adapter
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not supported by this platform: {0}")]
    Unsupported(&'static str),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required value: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
