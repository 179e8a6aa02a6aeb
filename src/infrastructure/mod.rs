//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration and credential loading
//! - Logging: Subscriber setup
//! - Modules: Handler module discovery and loading
//! - Client: Listener table over a platform connection
//! - Adapters: Platform integrations (Discord, console, in-memory)

pub mod config;
pub mod logging;
pub mod modules;
pub mod client;
pub mod adapters;
