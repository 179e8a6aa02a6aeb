//! Domain layer - Handler descriptors and the abstractions they run against
//! 
//! This layer contains:
//! - Entities: Commands, events, interactions, messages, users
//! - Traits: Abstractions for the platform and for handler executors

pub mod entities;
pub mod traits;
