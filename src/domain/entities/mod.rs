//! Domain entities - Commands, events, interactions and the values they carry

pub mod user;
pub mod message;
pub mod command;
pub mod event;
pub mod interaction;

pub use user::{Guild, User};
pub use message::{Embed, MessagePayload};
pub use command::{CommandDefinition, CommandDescriptor, CommandOption, OptionKind};
pub use event::{Event, EventDescriptor, EventKind, ReadyEvent};
pub use interaction::{
    Interaction, InteractionKind, InteractionOption, InteractionTarget, OptionValue, ResponseAction, ResponseState,
};
