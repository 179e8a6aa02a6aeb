//! Message handling - Interaction dispatch and text-mode command parsing

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{InteractionDispatcher, GENERIC_FAILURE};
pub use parser::{CommandLineParser, ParsedCommand};
