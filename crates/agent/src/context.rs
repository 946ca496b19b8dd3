//! Conversation context assembly.
//!
//! Every oracle query is built fresh from three layers:
//!
//! 1. **System**: persona, the tool catalog, and the tool-call protocol
//! 2. **Memory**: a summary of the current memory bank
//! 3. **History**: the trailing window of the conversation, always
//!    including every message of the turn in progress
//!
//! The system layer is never stored in the conversation, so the memory
//! summary the model sees is always current.

use chrono::Local;
use souschef_core::memory::MemoryBank;
use souschef_core::message::{Conversation, Message};
use souschef_core::tool::ToolDefinition;

const PERSONA: &str = "You are the AI Sous-Chef, a friendly and expert kitchen assistant. \
Your primary goal is to help users with meal planning, recipe generation, and pantry management. \
You are an expert in cooking, nutrition, and meal planning.";

const PROTOCOL: &str = r#"When you need to use a tool, respond with a JSON object containing two fields:
- "tool_code": the name of the tool to use (e.g. "add_to_pantry")
- "tool_params": a JSON object containing the parameters for the tool

Use at most one tool per reply. Do not add conversational text or markdown outside the JSON when using a tool.
After a tool result arrives, answer the user conversationally and summarize what happened.
If a tool result reports an error, either correct the call once or explain the problem to the user.
If you are not using a tool, respond conversationally."#;

/// Builds the message list for each oracle query.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    history_limit: usize,
}

impl ContextBuilder {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit: history_limit.max(1),
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// The system prompt for the current state.
    pub fn system_prompt(&self, bank: &MemoryBank, tools: &[ToolDefinition]) -> String {
        let catalog = serde_json::to_string_pretty(tools).unwrap_or_else(|_| "[]".into());
        format!(
            "{PERSONA}\n\nYou have access to the following tools:\n{catalog}\n\n{PROTOCOL}\n\n\
## What you remember about the user\n{}\n\nToday's date is {}.",
            bank.summary(),
            Local::now().format("%Y-%m-%d"),
        )
    }

    /// Assemble the messages for one query.
    ///
    /// `turn_start` is the index of the current turn's user message; the
    /// window never cuts into the turn in progress.
    pub fn build(
        &self,
        conversation: &Conversation,
        turn_start: usize,
        bank: &MemoryBank,
        tools: &[ToolDefinition],
    ) -> Vec<Message> {
        let len = conversation.messages.len();
        let start = len.saturating_sub(self.history_limit).min(turn_start.min(len));

        let mut messages = Vec::with_capacity(len - start + 1);
        messages.push(Message::system(self.system_prompt(bank, tools)));
        messages.extend(conversation.messages[start..].iter().cloned());
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(24)
    }
}
