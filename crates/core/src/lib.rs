//! # Sous-Chef Core
//!
//! Domain types, traits, and error definitions for the Sous-Chef kitchen
//! assistant. This crate has **no I/O of its own**: it defines the domain
//! model that the store, oracle, tool and dispatch crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is a trait here ([`Provider`], [`StateStore`], [`Tool`]).
//! Implementations live in their respective crates, so tests can swap in
//! scripted oracles and in-memory stores.

pub mod error;
pub mod event;
pub mod interpreter;
pub mod meal;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, StoreError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use interpreter::{Interpretation, ToolRequest, extract_json_value, interpret};
pub use meal::{MealPlan, PlannedMeal, Recipe};
pub use memory::{MemoryBank, Pantry, Sentiment, StateDelta, StateStore};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{
    SideEffect, Tool, ToolCall, ToolContext, ToolDefinition, ToolKind, ToolOutput, ToolParams,
    ToolRegistry,
};
