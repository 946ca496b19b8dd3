//! Kitchen value objects produced by the generator tools.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// A recipe as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(alias = "name")]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub servings: String,

    #[serde(default)]
    pub prep_time: String,

    #[serde(default)]
    pub cook_time: String,

    #[serde(default)]
    pub ingredients: Vec<String>,

    /// Ordered steps
    #[serde(default, alias = "steps")]
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Reject recipes the user could not cook from.
    pub fn check(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("recipe has no title".into());
        }
        if self.ingredients.is_empty() {
            return Err("recipe has no ingredients".into());
        }
        if self.instructions.is_empty() {
            return Err("recipe has no instructions".into());
        }
        Ok(())
    }
}

/// One slot of a meal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub day: u32,

    /// "Breakfast", "Lunch" or "Dinner"; free text is tolerated.
    #[serde(default = "default_meal_type")]
    pub meal_type: String,

    #[serde(alias = "recipe", alias = "name")]
    pub meal_name: String,
}

fn default_meal_type() -> String {
    "Dinner".into()
}

/// An ordered sequence of day → meal assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub plan: Vec<PlannedMeal>,
}

impl MealPlan {
    /// Build a plan from either `{"plan": [...]}` or a bare array of meals.
    /// Entries are stably sorted by day.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut plan: MealPlan = match value {
            serde_json::Value::Array(_) => MealPlan {
                plan: serde_json::from_value(value)?,
            },
            other => serde_json::from_value(other)?,
        };
        plan.plan.sort_by_key(|m| m.day);
        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    /// Number of distinct days covered.
    pub fn day_count(&self) -> usize {
        let mut days: Vec<u32> = self.plan.iter().map(|m| m.day).collect();
        days.dedup();
        days.len()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}
