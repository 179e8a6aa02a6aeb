//! Platform adapters - Discord REST, console and in-memory

pub mod console;
pub mod discord;
pub mod memory;

pub use console::ConsoleAdapter;
pub use discord::DiscordAdapter;
pub use memory::MemoryPlatform;
