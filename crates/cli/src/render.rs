//! Terminal rendering of turn replies.
//!
//! Recipes and meal plans carry structured data; they are printed after the
//! model's own words so the user always gets the full details.

use souschef_agent::{ToolReport, TurnReply};
use souschef_core::meal::{MealPlan, Recipe};
use souschef_core::tool::ToolKind;

/// Render a reply for the terminal.
pub fn reply(reply: &TurnReply) -> String {
    let mut out = reply.text.trim().to_string();

    if let Some(details) = reply.tool.as_ref().and_then(details) {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&details);
    }

    out
}

/// Extra detail for a successful generator or export result.
fn details(report: &ToolReport) -> Option<String> {
    if !report.success {
        return None;
    }
    let data = report.data.clone()?;

    match report.kind {
        ToolKind::GenerateRecipe => serde_json::from_value::<Recipe>(data).ok().map(|r| recipe(&r)),
        ToolKind::GenerateMealPlan => MealPlan::from_value(data).ok().map(|p| meal_plan(&p)),
        ToolKind::ExportCalendar => data
            .get("file_path")
            .and_then(|p| p.as_str())
            .map(|p| format!("Calendar file: {p}")),
        _ => None,
    }
}

pub fn recipe(recipe: &Recipe) -> String {
    let mut lines = vec![format!("== {} ==", recipe.title)];
    if !recipe.description.is_empty() {
        lines.push(recipe.description.clone());
    }

    let facts: Vec<String> = [
        ("Servings", &recipe.servings),
        ("Prep", &recipe.prep_time),
        ("Cook", &recipe.cook_time),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}: {value}"))
    .collect();
    if !facts.is_empty() {
        lines.push(facts.join(" | "));
    }

    lines.push(String::new());
    lines.push("Ingredients:".into());
    lines.extend(recipe.ingredients.iter().map(|i| format!("  - {i}")));

    lines.push(String::new());
    lines.push("Instructions:".into());
    lines.extend(
        recipe
            .instructions
            .iter()
            .enumerate()
            .map(|(n, step)| format!("  {}. {step}", n + 1)),
    );

    lines.join("\n")
}

pub fn meal_plan(plan: &MealPlan) -> String {
    let mut lines = Vec::new();
    let mut current_day = None;

    for meal in &plan.plan {
        if current_day != Some(meal.day) {
            if current_day.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("Day {}", meal.day));
            current_day = Some(meal.day);
        }
        lines.push(format!("  {:<10} {}", meal.meal_type, meal.meal_name));
    }

    lines.join("\n")
}

/// The pantry as a bulleted list.
pub fn pantry<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let lines: Vec<String> = items.into_iter().map(|i| format!("  - {i}")).collect();
    if lines.is_empty() {
        "Your pantry is empty.".into()
    } else {
        lines.join("\n")
    }
}
