//! Built-in tool implementations for Sous-Chef.
//!
//! Tools give the assistant its kitchen skills: keep the pantry, remember
//! recipe feedback, write recipes and meal plans through the oracle, and
//! export plans to a calendar file.

pub mod calendar;
pub mod feedback;
pub mod generator;
pub mod pantry;
pub mod recipe;

#[cfg(test)]
pub(crate) mod test_helpers;

use souschef_core::provider::Provider;
use souschef_core::tool::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;

pub use calendar::{CalendarExporter, ExportCalendarTool, IcsExporter};
pub use generator::Generator;

/// Settings the built-in tools need from the outside world.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Model used by the generator tools
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Directory for exported calendar files
    pub calendar_dir: PathBuf,
    /// Used in exported file names
    pub user_id: String,
}

/// Create a registry with all seven built-in tools.
pub fn default_registry(oracle: Arc<dyn Provider>, settings: &ToolSettings) -> ToolRegistry {
    let mut generator =
        Generator::new(oracle, settings.model.clone()).with_temperature(settings.temperature);
    if let Some(max_tokens) = settings.max_tokens {
        generator = generator.with_max_tokens(max_tokens);
    }

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(pantry::AddToPantryTool));
    registry.register(Box::new(pantry::RemoveFromPantryTool));
    registry.register(Box::new(pantry::ViewPantryTool));
    registry.register(Box::new(recipe::GenerateRecipeTool::new(generator.clone())));
    registry.register(Box::new(recipe::GenerateMealPlanTool::new(generator)));
    registry.register(Box::new(feedback::AddFeedbackTool));
    registry.register(Box::new(calendar::ExportCalendarTool::new(
        Arc::new(IcsExporter),
        settings.calendar_dir.clone(),
        settings.user_id.clone(),
    )));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FailingProvider;
    use souschef_core::tool::ToolKind;

    #[test]
    fn default_registry_covers_every_kind() {
        let settings = ToolSettings {
            model: "mock-model".into(),
            temperature: 0.7,
            max_tokens: Some(1024),
            calendar_dir: std::env::temp_dir(),
            user_id: "cli_user".into(),
        };
        let registry = default_registry(Arc::new(FailingProvider), &settings);

        for kind in ToolKind::ALL {
            assert!(registry.get(kind).is_some(), "missing {kind}");
        }
        assert_eq!(registry.definitions().len(), ToolKind::ALL.len());
        assert_eq!(registry.names()[0], "add_to_pantry");
    }
}
