//! Handler modules for dispatch-bot
//!
//! A module is a YAML or JSON file describing one command or event handler.
//! Its `execute` field names an executor compiled into the bot; the loader
//! only discovers and parses files, validation belongs to the registries.

pub mod loader;
pub mod module;

pub use loader::{LoadOptions, ModuleLoader};
pub use module::{LoadedModule, ModuleSet};
