//! The dispatch loop, the heart of Sous-Chef.
//!
//! Each user turn follows a **Query → Interpret → Act → Summarize** cycle:
//!
//! 1. **Receive** a user utterance
//! 2. **Build context** (persona + tool catalog + memory summary + history)
//! 3. **Query the oracle** via the configured provider
//! 4. **If a tool request**: validate it, execute it, persist any change,
//!    fold the result back in and query again
//! 5. **If text**: that is the turn's answer
//!
//! At most one tool executes per turn. Rejected requests are folded back so
//! the model can correct them, up to a configured number of retries.

pub mod context;
pub mod loop_runner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::ContextBuilder;
pub use loop_runner::{DispatchLoop, ToolReport, TurnReply, TurnStatus};
