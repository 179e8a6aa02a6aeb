//! Application services - Registries and the executors they resolve

pub mod catalog;
pub mod command_registry;
pub mod event_registry;

pub use catalog::{CommandCatalog, EventCatalog, ExecutorCatalog};
pub use command_registry::{is_valid_command, validate_command, CommandRegistry};
pub use event_registry::{is_valid_event, validate_event, EventRegistry};
