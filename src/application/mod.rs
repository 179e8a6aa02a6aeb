//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Error types shared by every layer
//! - Services: Executor catalogs and the command/event registries
//! - Messaging: Interaction dispatch and console command parsing
//! - Bot: Startup, deployment and reload orchestration

pub mod errors;
pub mod format;
pub mod services;
pub mod messaging;
pub mod bot;

pub use bot::Bot;
