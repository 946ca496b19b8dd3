//! Generator tools: recipes and meal plans written by the oracle.

use async_trait::async_trait;
use souschef_core::error::ToolError;
use souschef_core::meal::{MealPlan, Recipe};
use souschef_core::memory::{Sentiment, normalize_name};
use souschef_core::tool::{Tool, ToolContext, ToolKind, ToolOutput, ToolParams};
use crate::generator::Generator;

const RECIPE_EXAMPLE: &str = r#"{
  "title": "Zesty Chicken & Broccoli Power Bowl",
  "description": "A quick and easy stir-fry with a spicy kick.",
  "servings": "2",
  "prep_time": "10 minutes",
  "cook_time": "15 minutes",
  "ingredients": ["1 lb chicken breast, cut into bite-sized pieces", "1 tbsp soy sauce", "1 cup broccoli florets"],
  "instructions": ["Heat oil in a large skillet or wok.", "Add chicken and cook until browned.", "Add broccoli and stir-fry for 3-5 minutes."]
}"#;

const PLAN_EXAMPLE: &str = r#"{
  "plan": [
    { "day": 1, "meal_type": "Breakfast", "meal_name": "Oatmeal with Berries" },
    { "day": 1, "meal_type": "Lunch", "meal_name": "Quinoa Salad" }
  ]
}"#;

fn failed(kind: ToolKind, reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool: kind.name().to_string(),
        reason: reason.into(),
    }
}

pub struct GenerateRecipeTool {
    generator: Generator,
}

impl GenerateRecipeTool {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }

    fn prompt(params: &ToolParams, ctx: &ToolContext<'_>) -> Result<String, ToolError> {
        let pantry = ctx.bank.pantry.to_vec();
        let requested: Vec<String> = params
            .string_list("ingredients")
            .unwrap_or_default()
            .iter()
            .filter_map(|n| normalize_name(n))
            .collect();

        if requested.is_empty() && pantry.is_empty() {
            return Err(failed(
                ToolKind::GenerateRecipe,
                "the pantry is empty and no ingredients were given",
            ));
        }

        let mut context = Vec::new();
        if requested.is_empty() {
            context.push(format!("- My pantry contains: {}", pantry.join(", ")));
        } else {
            context.push(format!("- Ingredients to use: {}", requested.join(", ")));
            if !pantry.is_empty() {
                context.push(format!("- My pantry also contains: {}", pantry.join(", ")));
            }
        }
        if let Some(diet) = params.str("dietary_needs") {
            context.push(format!("- Dietary needs: {diet}"));
        }
        if let Some(time) = params.str("cooking_time") {
            context.push(format!("- Max cooking time: {time}"));
        }
        let liked = ctx.bank.recipes_with(Sentiment::Liked);
        if !liked.is_empty() {
            context.push(format!(
                "- The user likes these recipes: {}. Draw inspiration from them.",
                liked.join(", ")
            ));
        }
        let disliked = ctx.bank.recipes_with(Sentiment::Disliked);
        if !disliked.is_empty() {
            context.push(format!(
                "- The user dislikes these recipes: {}. Do not suggest them.",
                disliked.join(", ")
            ));
        }

        Ok(format!(
            "Please suggest a recipe as a single JSON object with the keys \"title\", \"description\", \
\"servings\", \"prep_time\", \"cook_time\", \"ingredients\" (an array of strings) and \
\"instructions\" (an array of strings). The \"title\" should be a fun and creative name.\n\n\
Base the recipe on the following context:\n{}\n\nExample format:\n{RECIPE_EXAMPLE}",
            context.join("\n")
        ))
    }
}

#[async_trait]
impl Tool for GenerateRecipeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GenerateRecipe
    }

    async fn execute(&self, params: &ToolParams, ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let prompt = Self::prompt(params, &ctx)?;
        let value = self.generator.generate_json(self.kind(), prompt).await?;

        let recipe: Recipe = serde_json::from_value(value)
            .map_err(|e| failed(self.kind(), format!("malformed recipe: {e}")))?;
        recipe.check().map_err(|reason| failed(self.kind(), reason))?;

        let data = serde_json::to_value(&recipe)
            .map_err(|e| failed(self.kind(), e.to_string()))?;
        Ok(ToolOutput::text(data.to_string()).with_data(data))
    }
}

pub struct GenerateMealPlanTool {
    generator: Generator,
}

impl GenerateMealPlanTool {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }

    fn prompt(params: &ToolParams) -> String {
        let days = params.integer("days").unwrap_or(3);
        let diet = params.str("diet").unwrap_or("any");
        let preferences = params.str("preferences").unwrap_or("none");
        format!(
            "Please create a meal plan for {days} days with the following preferences:\n\
- Dietary restrictions: {diet}\n\
- General preferences: {preferences}\n\n\
Respond with a single JSON object with one key \"plan\", an array of meal objects. \
Each meal object must have the keys \"day\" (integer), \"meal_type\" (\"Breakfast\", \"Lunch\" or \"Dinner\") \
and \"meal_name\" (string).\n\nExample format:\n{PLAN_EXAMPLE}"
        )
    }
}

#[async_trait]
impl Tool for GenerateMealPlanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GenerateMealPlan
    }

    async fn execute(&self, params: &ToolParams, _ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let value = self
            .generator
            .generate_json(self.kind(), Self::prompt(params))
            .await?;

        let plan = MealPlan::from_value(value)
            .map_err(|e| failed(self.kind(), format!("malformed meal plan: {e}")))?;
        if plan.is_empty() {
            return Err(failed(self.kind(), "the meal plan has no meals"));
        }

        let data = serde_json::to_value(&plan)
            .map_err(|e| failed(self.kind(), e.to_string()))?;
        Ok(ToolOutput::text(data.to_string()).with_data(data))
    }
}
