//! Domain traits - Abstractions for infrastructure implementations

pub mod handler;
pub mod platform;

pub use handler::{CommandExecutor, EventExecutor};
pub use platform::{DeployScope, Platform};
