//! Pantry tools: add, remove and list ingredients on hand.
//!
//! The mutating tools compute their result against the current bank and
//! hand back a [`StateDelta`] covering only the names that actually change,
//! so a no-op request produces no delta and no write.

use async_trait::async_trait;
use souschef_core::error::ToolError;
use souschef_core::memory::{StateDelta, normalize_name};
use souschef_core::tool::{Tool, ToolContext, ToolKind, ToolOutput, ToolParams};
use std::collections::BTreeSet;

/// Normalized, deduplicated names in request order.
fn normalized(names: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .filter_map(|n| normalize_name(n))
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

fn ingredients(params: &ToolParams, kind: ToolKind) -> Result<Vec<String>, ToolError> {
    let names = normalized(params.string_list("ingredients").unwrap_or_default());
    if names.is_empty() {
        return Err(ToolError::InvalidParameters {
            tool: kind.name().to_string(),
            field: "ingredients".into(),
            reason: "must contain at least one entry".into(),
        });
    }
    Ok(names)
}

pub struct AddToPantryTool;

#[async_trait]
impl Tool for AddToPantryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::AddToPantry
    }

    async fn execute(&self, params: &ToolParams, ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let names = ingredients(params, self.kind())?;
        let (already_present, added): (Vec<String>, Vec<String>) =
            names.into_iter().partition(|n| ctx.bank.pantry.contains(n));

        let mut pantry: BTreeSet<String> = ctx.bank.pantry.iter().map(String::from).collect();
        pantry.extend(added.iter().cloned());

        let data = serde_json::json!({
            "status": "success",
            "added": added,
            "already_present": already_present,
            "pantry": pantry,
        });
        let output = ToolOutput::text(data.to_string()).with_data(data);

        Ok(if added.is_empty() {
            output
        } else {
            output.with_delta(StateDelta::AddIngredients { names: added })
        })
    }
}

pub struct RemoveFromPantryTool;

#[async_trait]
impl Tool for RemoveFromPantryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::RemoveFromPantry
    }

    async fn execute(&self, params: &ToolParams, ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let names = ingredients(params, self.kind())?;
        let (removed, not_present): (Vec<String>, Vec<String>) =
            names.into_iter().partition(|n| ctx.bank.pantry.contains(n));

        let pantry: Vec<&str> = ctx
            .bank
            .pantry
            .iter()
            .filter(|n| !removed.iter().any(|r| r == n))
            .collect();

        let data = serde_json::json!({
            "status": "success",
            "removed": removed,
            "not_present": not_present,
            "pantry": pantry,
        });
        let output = ToolOutput::text(data.to_string()).with_data(data);

        Ok(if removed.is_empty() {
            output
        } else {
            output.with_delta(StateDelta::RemoveIngredients { names: removed })
        })
    }
}

pub struct ViewPantryTool;

#[async_trait]
impl Tool for ViewPantryTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ViewPantry
    }

    async fn execute(&self, _params: &ToolParams, ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let data = serde_json::json!({ "pantry": ctx.bank.pantry.to_vec() });
        Ok(ToolOutput::text(data.to_string()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::params;
    use souschef_core::memory::MemoryBank;
    use serde_json::json;

    fn bank_with(items: &[&str]) -> MemoryBank {
        let mut bank = MemoryBank::new();
        bank.apply(&StateDelta::AddIngredients {
            names: items.iter().map(|s| s.to_string()).collect(),
        });
        bank
    }

    #[tokio::test]
    async fn add_to_empty_pantry_reports_sorted_contents() {
        let bank = MemoryBank::new();
        let out = AddToPantryTool
            .execute(
                &params(ToolKind::AddToPantry, json!({ "ingredients": ["chicken breast", "broccoli", "white rice"] })),
                ToolContext::new(&bank),
            )
            .await
            .unwrap();

        let data = out.data.unwrap();
        assert_eq!(data["pantry"], json!(["broccoli", "chicken breast", "white rice"]));
        assert_eq!(data["already_present"], json!([]));

        let mut after = bank.clone();
        after.apply(&out.delta.unwrap());
        assert_eq!(after.pantry.to_vec(), vec!["broccoli", "chicken breast", "white rice"]);
    }

    #[tokio::test]
    async fn adding_present_ingredient_has_no_delta() {
        let bank = bank_with(&["rice"]);
        let out = AddToPantryTool
            .execute(&params(ToolKind::AddToPantry, json!({ "ingredients": "Rice, RICE" })), ToolContext::new(&bank))
            .await
            .unwrap();
        assert!(out.delta.is_none());
        assert_eq!(out.data.unwrap()["already_present"], json!(["rice"]));
    }

    #[tokio::test]
    async fn remove_absent_ingredient_is_reported() {
        let bank = bank_with(&["rice"]);
        let out = RemoveFromPantryTool
            .execute(&params(ToolKind::RemoveFromPantry, json!({ "ingredients": ["pasta"] })), ToolContext::new(&bank))
            .await
            .unwrap();

        assert!(out.delta.is_none());
        let data = out.data.unwrap();
        assert_eq!(data["not_present"], json!(["pasta"]));
        assert_eq!(data["removed"], json!([]));
        assert_eq!(data["pantry"], json!(["rice"]));
    }

    #[tokio::test]
    async fn remove_present_ingredient_yields_delta() {
        let bank = bank_with(&["rice", "leeks"]);
        let out = RemoveFromPantryTool
            .execute(&params(ToolKind::RemoveFromPantry, json!({ "ingredients": ["Leeks", "pasta"] })), ToolContext::new(&bank))
            .await
            .unwrap();

        assert_eq!(out.delta, Some(StateDelta::RemoveIngredients { names: vec!["leeks".into()] }));
        let data = out.data.unwrap();
        assert_eq!(data["pantry"], json!(["rice"]));
        assert_eq!(data["not_present"], json!(["pasta"]));
    }

    #[tokio::test]
    async fn view_pantry_is_read_only() {
        let bank = bank_with(&["white rice", "broccoli"]);
        let out = ViewPantryTool
            .execute(&params(ToolKind::ViewPantry, json!({})), ToolContext::new(&bank))
            .await
            .unwrap();
        assert!(out.delta.is_none());
        assert_eq!(out.output, r#"{"pantry":["broccoli","white rice"]}"#);
    }
}
