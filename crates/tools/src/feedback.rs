//! Feedback tool: remember which recipes the user liked or disliked.

use async_trait::async_trait;
use souschef_core::error::ToolError;
use souschef_core::memory::{Sentiment, StateDelta, normalize_name};
use souschef_core::tool::{Tool, ToolContext, ToolKind, ToolOutput, ToolParams};

pub struct AddFeedbackTool;

impl AddFeedbackTool {
    fn invalid(field: &str, reason: &str) -> ToolError {
        ToolError::InvalidParameters {
            tool: ToolKind::AddFeedback.name().to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Tool for AddFeedbackTool {
    fn kind(&self) -> ToolKind {
        ToolKind::AddFeedback
    }

    async fn execute(&self, params: &ToolParams, ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let recipe = params
            .str("recipe_name")
            .and_then(normalize_name)
            .ok_or_else(|| Self::invalid("recipe_name", "is required"))?;
        let sentiment = params
            .str("sentiment")
            .and_then(Sentiment::parse)
            .ok_or_else(|| Self::invalid("sentiment", "must be 'like' or 'dislike'"))?;
        let note = params.str("note").map(String::from);

        let previous = ctx.bank.feedback.get(&recipe).map(|e| e.sentiment);
        let message = match previous {
            Some(prev) if prev != sentiment => format!(
                "Feedback for '{recipe}' changed from {} to {}.",
                prev.as_str(),
                sentiment.as_str()
            ),
            _ => format!("Feedback for '{recipe}' recorded as {}.", sentiment.as_str()),
        };

        let data = serde_json::json!({
            "status": "success",
            "recipe_name": recipe,
            "sentiment": sentiment,
            "message": message,
        });

        Ok(ToolOutput::text(data.to_string())
            .with_data(data)
            .with_delta(StateDelta::UpsertFeedback {
                recipe,
                sentiment,
                note,
            }))
    }
}
