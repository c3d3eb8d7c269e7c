//! # kbchat Core
//!
//! Domain types, traits, and error definitions for the kbchat
//! knowledge-base chat service. This crate has **zero framework
//! dependencies**: it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (the LLM provider, the chat store) is a trait
//! here. Implementations live in their respective crates, so backends can be
//! swapped via configuration and tests can use scripted stand-ins.

pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StoreError};
pub use message::{ChatTarget, ConversationId, ConversationMap, Message, Role, NEW_CONVERSATION};
pub use provider::{ConversationTurn, Provider, ProviderRequest, ProviderResponse, Usage};
pub use store::ChatStore;
