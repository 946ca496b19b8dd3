//! Structured generation through the model oracle.
//!
//! The recipe and meal-plan tools ask the oracle for a single JSON value in
//! a one-shot request, separate from the user's conversation.

use souschef_core::error::ToolError;
use souschef_core::interpreter::extract_json_value;
use souschef_core::message::Message;
use souschef_core::provider::{Provider, ProviderRequest};
use souschef_core::tool::ToolKind;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const GENERATOR_INSTRUCTION: &str = "You are the AI Sous-Chef, an expert in cooking, nutrition and meal planning. \
You must respond with only a single JSON value. Do not include any conversational text \
or markdown formatting before or after the JSON.";

/// A handle on the oracle for one-shot JSON generation.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Send `prompt` and return the JSON value found in the reply.
    ///
    /// Oracle failures and replies without JSON become execution failures
    /// of `tool`.
    pub async fn generate_json(&self, tool: ToolKind, prompt: String) -> Result<serde_json::Value, ToolError> {
        let failed = |reason: String| ToolError::ExecutionFailed {
            tool: tool.name().to_string(),
            reason,
        };

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(GENERATOR_INSTRUCTION), Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let start = Instant::now();
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| failed(format!("the model is unavailable: {e}")))?;
        debug!(
            tool = %tool,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generator reply received"
        );

        extract_json_value(&response.message.content)
            .ok_or_else(|| failed("the model did not return JSON".into()))
    }
}
