//! dispatch-bot - slash-command bot with hot-reloadable handler modules

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod builtins;
