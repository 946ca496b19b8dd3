//! Tool kinds, schemas and the registry.
//!
//! The set of tools is closed: every tool the model may call is a variant
//! of [`ToolKind`], and each variant maps through a static table to its
//! parameter schema and side-effect class. Implementations of the [`Tool`]
//! trait are registered per kind.
//!
//! A call goes through two steps:
//! 1. [`ToolRegistry::resolve`] looks up the name and validates the raw
//!    parameters against the schema, producing a [`ToolCall`]
//! 2. [`ToolRegistry::execute`] runs the action with the validated params
//!
//! An action is never invoked with parameters that failed validation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;
use crate::error::ToolError;
use crate::meal::{MealPlan, PlannedMeal};
use crate::memory::{MemoryBank, Sentiment, StateDelta};

/// Identifier of every tool the assistant knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    AddToPantry,
    RemoveFromPantry,
    ViewPantry,
    GenerateRecipe,
    GenerateMealPlan,
    AddFeedback,
    ExportCalendar,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::AddToPantry,
        ToolKind::RemoveFromPantry,
        ToolKind::ViewPantry,
        ToolKind::GenerateRecipe,
        ToolKind::GenerateMealPlan,
        ToolKind::AddFeedback,
        ToolKind::ExportCalendar,
    ];

    /// The name the model uses to call this tool.
    pub fn name(self) -> &'static str {
        self.schema().name
    }

    /// Look up a tool by the name the model sent. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        // Older prompts called the export tool by its file-oriented name.
        if name == "create_calendar_file" {
            return Some(ToolKind::ExportCalendar);
        }
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The static schema entry for this tool.
    pub fn schema(self) -> &'static ToolSchema {
        match self {
            ToolKind::AddToPantry => &ADD_TO_PANTRY,
            ToolKind::RemoveFromPantry => &REMOVE_FROM_PANTRY,
            ToolKind::ViewPantry => &VIEW_PANTRY,
            ToolKind::GenerateRecipe => &GENERATE_RECIPE,
            ToolKind::GenerateMealPlan => &GENERATE_MEAL_PLAN,
            ToolKind::AddFeedback => &ADD_FEEDBACK,
            ToolKind::ExportCalendar => &EXPORT_CALENDAR,
        }
    }

    pub fn side_effect(self) -> SideEffect {
        self.schema().side_effect
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a tool may change the memory bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    ReadOnly,
    Mutating,
}

/// Expected type of a parameter, with the coercions it allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// String; numbers and booleans are stringified.
    Text,
    /// Integer within an inclusive range; numeric strings are parsed.
    Integer { min: i64, max: i64 },
    /// List of strings; a single string is split on commas.
    TextList,
    /// One of a fixed set of lowercase words, compared case-insensitively.
    OneOf(&'static [&'static str]),
    /// Calendar date written as `YYYY-MM-DD`.
    Date,
    /// Non-empty list of planned meals; `{"plan": [...]}` is unwrapped.
    /// Every entry needs a day of at least 1 and a meal name.
    MealList,
}

/// Default applied when an optional parameter is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    Integer(i64),
    Text(&'static str),
}

impl ParamDefault {
    fn to_value(self) -> Value {
        match self {
            ParamDefault::Integer(i) => Value::from(i),
            ParamDefault::Text(s) => Value::from(s),
        }
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Other keys the model sometimes uses for the same parameter.
    pub aliases: &'static [&'static str],
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<ParamDefault>,
    pub description: &'static str,
}

/// Static description of a tool: its parameters in order and its effect.
#[derive(Debug)]
pub struct ToolSchema {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub side_effect: SideEffect,
    pub params: &'static [ParamSpec],
}

const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec { name, aliases: &[], kind, required: true, default: None, description }
}

const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec { name, aliases: &[], kind, required: false, default: None, description }
}

static ADD_TO_PANTRY: ToolSchema = ToolSchema {
    kind: ToolKind::AddToPantry,
    name: "add_to_pantry",
    description: "Add ingredients to the user's pantry.",
    side_effect: SideEffect::Mutating,
    params: &[required("ingredients", ParamKind::TextList, "Ingredients to add.")],
};

static REMOVE_FROM_PANTRY: ToolSchema = ToolSchema {
    kind: ToolKind::RemoveFromPantry,
    name: "remove_from_pantry",
    description: "Remove ingredients from the user's pantry. Names not in the pantry are ignored.",
    side_effect: SideEffect::Mutating,
    params: &[required("ingredients", ParamKind::TextList, "Ingredients to remove.")],
};

static VIEW_PANTRY: ToolSchema = ToolSchema {
    kind: ToolKind::ViewPantry,
    name: "view_pantry",
    description: "List the current contents of the user's pantry.",
    side_effect: SideEffect::ReadOnly,
    params: &[],
};

static GENERATE_RECIPE: ToolSchema = ToolSchema {
    kind: ToolKind::GenerateRecipe,
    name: "generate_recipe",
    description: "Create a recipe from the pantry (or the given ingredients), honoring the user's feedback.",
    side_effect: SideEffect::ReadOnly,
    params: &[
        ParamSpec {
            aliases: &["extra_ingredients"],
            ..optional("ingredients", ParamKind::TextList, "Ingredients to cook with. Defaults to the pantry.")
        },
        ParamSpec {
            aliases: &["max_time", "time"],
            ..optional("cooking_time", ParamKind::Text, "Maximum total time, e.g. '30 minutes'.")
        },
        ParamSpec {
            aliases: &["diet"],
            ..optional("dietary_needs", ParamKind::Text, "Dietary requirements, e.g. 'gluten-free'.")
        },
    ],
};

static GENERATE_MEAL_PLAN: ToolSchema = ToolSchema {
    kind: ToolKind::GenerateMealPlan,
    name: "generate_meal_plan",
    description: "Plan breakfast, lunch and dinner for a number of days.",
    side_effect: SideEffect::ReadOnly,
    params: &[
        ParamSpec {
            aliases: &["day_count", "num_days"],
            ..required("days", ParamKind::Integer { min: 1, max: 14 }, "Number of days to plan.")
        },
        ParamSpec {
            aliases: &["dietary_needs"],
            default: Some(ParamDefault::Text("any")),
            ..optional("diet", ParamKind::Text, "Dietary restriction, e.g. 'vegetarian'.")
        },
        optional("preferences", ParamKind::Text, "General preferences, e.g. 'quick meals'."),
    ],
};

static ADD_FEEDBACK: ToolSchema = ToolSchema {
    kind: ToolKind::AddFeedback,
    name: "add_feedback",
    description: "Record whether the user liked or disliked a recipe.",
    side_effect: SideEffect::Mutating,
    params: &[
        ParamSpec {
            aliases: &["recipe", "title"],
            ..required("recipe_name", ParamKind::Text, "Name of the recipe.")
        },
        ParamSpec {
            aliases: &["feedback"],
            ..required("sentiment", ParamKind::OneOf(Sentiment::ACCEPTED), "'like' or 'dislike'.")
        },
        optional("note", ParamKind::Text, "Optional free-text comment."),
    ],
};

static EXPORT_CALENDAR: ToolSchema = ToolSchema {
    kind: ToolKind::ExportCalendar,
    name: "export_calendar",
    description: "Write a meal plan to an .ics calendar file. Defaults to the last plan generated in this session.",
    side_effect: SideEffect::ReadOnly,
    params: &[
        optional("meal_plan", ParamKind::MealList, "Meals as {day, meal_type, meal_name} objects."),
        optional("start_date", ParamKind::Date, "First day of the plan, YYYY-MM-DD. Defaults to today."),
    ],
};

impl ToolSchema {
    /// Validate raw parameters, applying coercions and defaults.
    ///
    /// Fails on the first missing or mistyped field. Unknown keys are ignored.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<ToolParams, ToolError> {
        let mut params = Map::new();

        for param in self.params {
            let found = std::iter::once(param.name)
                .chain(param.aliases.iter().copied())
                .find_map(|key| raw.get(key).filter(|v| !v.is_null()));

            match found {
                Some(value) => {
                    let coerced = coerce(param.kind, value).map_err(|reason| {
                        ToolError::InvalidParameters {
                            tool: self.name.to_string(),
                            field: param.name.to_string(),
                            reason,
                        }
                    })?;
                    params.insert(param.name.to_string(), coerced);
                }
                None if param.required => {
                    return Err(ToolError::InvalidParameters {
                        tool: self.name.to_string(),
                        field: param.name.to_string(),
                        reason: "is required".into(),
                    });
                }
                None => {
                    if let Some(default) = param.default {
                        params.insert(param.name.to_string(), default.to_value());
                    }
                }
            }
        }

        let known = |key: &str| {
            self.params
                .iter()
                .any(|p| p.name == key || p.aliases.contains(&key))
        };
        for key in raw.keys().filter(|k| !known(k)) {
            debug!(tool = self.name, key = %key, "Ignoring unknown tool parameter");
        }

        Ok(ToolParams(params))
    }

    /// JSON Schema rendering of the parameters, for the model's instructions.
    pub fn to_definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        for param in self.params {
            let mut prop = match param.kind {
                ParamKind::Text => serde_json::json!({ "type": "string" }),
                ParamKind::Integer { min, max } => {
                    serde_json::json!({ "type": "integer", "minimum": min, "maximum": max })
                }
                ParamKind::TextList => {
                    serde_json::json!({ "type": "array", "items": { "type": "string" } })
                }
                ParamKind::OneOf(options) => serde_json::json!({ "type": "string", "enum": options }),
                ParamKind::Date => serde_json::json!({ "type": "string", "format": "date" }),
                ParamKind::MealList => serde_json::json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "day": { "type": "integer" },
                            "meal_type": { "type": "string" },
                            "meal_name": { "type": "string" }
                        },
                        "required": ["day", "meal_type", "meal_name"]
                    }
                }),
            };
            prop["description"] = Value::from(param.description);
            properties.insert(param.name.to_string(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

fn coerce(kind: ParamKind, value: &Value) -> Result<Value, String> {
    match kind {
        ParamKind::Text => match value {
            Value::String(s) if s.trim().is_empty() => Err("must not be empty".into()),
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err("must be a string".into()),
        },
        ParamKind::Integer { min, max } => {
            let n = match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| "must be an integer".to_string())?;
            if n < min || n > max {
                return Err(format!("must be between {min} and {max}"));
            }
            Ok(Value::from(n))
        }
        ParamKind::TextList => {
            let items: Vec<String> = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.trim().to_string()),
                        Value::Number(n) => Ok(n.to_string()),
                        _ => Err("must be a list of strings".to_string()),
                    })
                    .collect::<Result<_, _>>()?,
                Value::String(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
                _ => return Err("must be a list of strings".into()),
            };
            let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
            if items.is_empty() {
                return Err("must contain at least one entry".into());
            }
            Ok(Value::from(items))
        }
        ParamKind::OneOf(options) => {
            let s = value
                .as_str()
                .map(|s| s.trim().to_lowercase())
                .ok_or_else(|| "must be a string".to_string())?;
            if options.contains(&s.as_str()) {
                Ok(Value::String(s))
            } else {
                Err(format!("must be one of: {}", options.join(", ")))
            }
        }
        ParamKind::Date => {
            let raw = value
                .as_str()
                .map(str::trim)
                .ok_or_else(|| "must be a YYYY-MM-DD string".to_string())?;
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| format!("'{raw}' is not a YYYY-MM-DD date"))?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }
        ParamKind::MealList => {
            let list = match value {
                Value::Object(obj) => obj.get("plan").unwrap_or(value),
                other => other,
            };
            let items = match list {
                Value::Array(items) if items.is_empty() => {
                    return Err("must contain at least one entry".into());
                }
                Value::Array(items) => items,
                _ => return Err("must be a list of meals".into()),
            };
            for (index, item) in items.iter().enumerate() {
                let meal = serde_json::from_value::<PlannedMeal>(item.clone())
                    .map_err(|e| format!("entry {index} is not a meal ({e})"))?;
                if meal.day == 0 {
                    return Err(format!("entry {index} has day 0; days start at 1"));
                }
                if meal.meal_name.trim().is_empty() {
                    return Err(format!("entry {index} has an empty meal_name"));
                }
            }
            Ok(list.clone())
        }
    }
}

/// Parameters that passed schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParams(Map<String, Value>);

impl ToolParams {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn string_list(&self, name: &str) -> Option<Vec<String>> {
        self.0.get(name).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

/// A tool request that resolved to a known tool with valid parameters.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub kind: ToolKind,
    pub params: ToolParams,
}

/// A tool definition rendered into the model's instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

/// Read-only state handed to an action.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub bank: &'a MemoryBank,
    /// The last meal plan generated in this session, if any
    pub last_meal_plan: Option<&'a MealPlan>,
}

impl<'a> ToolContext<'a> {
    pub fn new(bank: &'a MemoryBank) -> Self {
        Self { bank, last_meal_plan: None }
    }

    pub fn with_meal_plan(mut self, plan: Option<&'a MealPlan>) -> Self {
        self.last_meal_plan = plan;
        self
    }
}

/// What an action produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text folded back into the conversation for the model
    pub output: String,

    /// Structured result (pantry listing, recipe, plan, ...)
    pub data: Option<Value>,

    /// State change for the loop to apply and persist
    pub delta: Option<StateDelta>,
}

impl ToolOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self { output: output.into(), data: None, delta: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_delta(mut self, delta: StateDelta) -> Self {
        self.delta = Some(delta);
        self
    }
}

/// The core Tool trait.
///
/// Each action implements this trait and is registered under its kind.
/// Actions read the bank through [`ToolContext`] and describe any change
/// as a [`StateDelta`]; they never write state themselves.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which registry entry this action implements.
    fn kind(&self) -> ToolKind;

    /// Execute with parameters that already passed validation.
    async fn execute(
        &self,
        params: &ToolParams,
        ctx: ToolContext<'_>,
    ) -> std::result::Result<ToolOutput, ToolError>;
}

/// A registry of available tool implementations.
///
/// The dispatch loop uses this to:
/// 1. Render tool definitions into the model's instructions
/// 2. Resolve and validate the model's requests
/// 3. Execute validated calls
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool of the same kind.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    /// Get a tool by kind.
    pub fn get(&self, kind: ToolKind) -> Option<&dyn Tool> {
        self.tools.get(&kind).map(|t| t.as_ref())
    }

    /// Definitions of registered tools, in table order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL
            .into_iter()
            .filter(|k| self.tools.contains_key(k))
            .map(|k| k.schema().to_definition())
            .collect()
    }

    /// Look up a tool by name and validate its parameters.
    pub fn resolve(
        &self,
        name: &str,
        raw_params: &Map<String, Value>,
    ) -> std::result::Result<ToolCall, ToolError> {
        let kind = ToolKind::from_name(name)
            .filter(|k| self.tools.contains_key(k))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let params = kind.schema().validate(raw_params)?;
        Ok(ToolCall { kind, params })
    }

    /// Execute a validated call.
    pub async fn execute(
        &self,
        call: &ToolCall,
        ctx: ToolContext<'_>,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self
            .get(call.kind)
            .ok_or_else(|| ToolError::UnknownTool(call.kind.name().to_string()))?;
        tool.execute(&call.params, ctx).await
    }

    /// List all registered tool names, in table order.
    pub fn names(&self) -> Vec<&'static str> {
        ToolKind::ALL
            .into_iter()
            .filter(|k| self.tools.contains_key(k))
            .map(ToolKind::name)
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    /// A simple test tool for unit tests.
    struct CountingViewTool;

    #[async_trait]
    impl Tool for CountingViewTool {
        fn kind(&self) -> ToolKind {
            ToolKind::ViewPantry
        }

        async fn execute(
            &self,
            _params: &ToolParams,
            ctx: ToolContext<'_>,
        ) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text(format!("{} items", ctx.bank.pantry.len())))
        }
    }

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.schema().kind, kind);
        }
        assert_eq!(ToolKind::from_name(" View_Pantry "), Some(ToolKind::ViewPantry));
        assert_eq!(ToolKind::from_name("create_calendar_file"), Some(ToolKind::ExportCalendar));
        assert_eq!(ToolKind::from_name("deep_fry"), None);
    }

    #[test]
    fn side_effect_classes() {
        assert_eq!(ToolKind::AddToPantry.side_effect(), SideEffect::Mutating);
        assert_eq!(ToolKind::AddFeedback.side_effect(), SideEffect::Mutating);
        assert_eq!(ToolKind::ViewPantry.side_effect(), SideEffect::ReadOnly);
        assert_eq!(ToolKind::ExportCalendar.side_effect(), SideEffect::ReadOnly);
    }

    #[test]
    fn missing_required_field_is_named() {
        let err = ToolKind::AddToPantry.schema().validate(&Map::new()).unwrap_err();
        assert_eq!(
            err,
            ToolError::InvalidParameters {
                tool: "add_to_pantry".into(),
                field: "ingredients".into(),
                reason: "is required".into(),
            }
        );
    }

    #[test]
    fn comma_string_coerces_to_list() {
        let params = ToolKind::AddToPantry
            .schema()
            .validate(&obj(json!({ "ingredients": "eggs, milk ,, flour" })))
            .unwrap();
        assert_eq!(params.string_list("ingredients").unwrap(), vec!["eggs", "milk", "flour"]);
    }

    #[test]
    fn mistyped_list_is_rejected() {
        let err = ToolKind::RemoveFromPantry
            .schema()
            .validate(&obj(json!({ "ingredients": [1, {"x": 2}] })))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { ref field, .. } if field == "ingredients"));
    }

    #[test]
    fn integer_coercion_and_range() {
        let schema = ToolKind::GenerateMealPlan.schema();
        let params = schema.validate(&obj(json!({ "days": "3" }))).unwrap();
        assert_eq!(params.integer("days"), Some(3));
        assert_eq!(params.str("diet"), Some("any"));
        assert!(params.str("preferences").is_none());

        let err = schema.validate(&obj(json!({ "days": 40 }))).unwrap_err();
        assert!(err.to_string().contains("between 1 and 14"));
        assert!(schema.validate(&obj(json!({ "days": "a few" }))).is_err());
    }

    #[test]
    fn aliases_and_enums() {
        let params = ToolKind::AddFeedback
            .schema()
            .validate(&obj(json!({ "recipe_name": "Leek Soup", "feedback": "Like" })))
            .unwrap();
        assert_eq!(params.str("sentiment"), Some("like"));

        let err = ToolKind::AddFeedback
            .schema()
            .validate(&obj(json!({ "recipe_name": "Leek Soup", "sentiment": "meh" })))
            .unwrap_err();
        assert!(err.to_string().contains("must be one of"));
    }

    #[test]
    fn meal_plan_object_is_unwrapped() {
        let params = ToolKind::ExportCalendar
            .schema()
            .validate(&obj(json!({
                "meal_plan": { "plan": [{ "day": 1, "meal_type": "Lunch", "meal_name": "Soup" }] }
            })))
            .unwrap();
        assert!(params.value("meal_plan").unwrap().is_array());
    }

    #[test]
    fn malformed_meals_are_rejected_before_export() {
        let schema = ToolKind::ExportCalendar.schema();

        let err = schema
            .validate(&obj(json!({ "meal_plan": [{ "meal_type": "Lunch", "meal_name": "Soup" }] })))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { ref field, .. } if field == "meal_plan"));

        let err = schema
            .validate(&obj(json!({ "meal_plan": [{ "day": "Monday", "meal_name": "Soup" }] })))
            .unwrap_err();
        assert!(err.to_string().contains("entry 0"));

        assert!(schema.validate(&obj(json!({ "meal_plan": [{ "day": 0, "meal_name": "Soup" }] }))).is_err());
        assert!(schema.validate(&obj(json!({ "meal_plan": [{ "day": 1 }] }))).is_err());
        assert!(schema.validate(&obj(json!({ "meal_plan": [] }))).is_err());
    }

    #[test]
    fn start_date_must_be_a_calendar_date() {
        let schema = ToolKind::ExportCalendar.schema();

        let params = schema.validate(&obj(json!({ "start_date": " 2025-03-10 " }))).unwrap();
        assert_eq!(params.str("start_date"), Some("2025-03-10"));

        let err = schema.validate(&obj(json!({ "start_date": "next tuesday" }))).unwrap_err();
        assert_eq!(
            err,
            ToolError::InvalidParameters {
                tool: "export_calendar".into(),
                field: "start_date".into(),
                reason: "'next tuesday' is not a YYYY-MM-DD date".into(),
            }
        );
        assert!(schema.validate(&obj(json!({ "start_date": "2025-02-30" }))).is_err());
        assert!(schema.validate(&obj(json!({ "start_date": 20250310 }))).is_err());
    }

    #[test]
    fn definition_lists_required_params() {
        let def = ToolKind::AddFeedback.schema().to_definition();
        assert_eq!(def.name, "add_feedback");
        assert_eq!(def.parameters["required"], json!(["recipe_name", "sentiment"]));
        assert!(def.parameters["properties"]["note"].is_object());
    }

    #[test]
    fn registry_resolves_only_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountingViewTool));

        assert!(registry.resolve("view_pantry", &Map::new()).is_ok());
        let err = registry.resolve("add_to_pantry", &Map::new()).unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("add_to_pantry".into()));
        assert_eq!(registry.names(), vec!["view_pantry"]);
        assert_eq!(registry.definitions().len(), 1);
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountingViewTool));
        let bank = MemoryBank::new();

        let call = registry.resolve("view_pantry", &Map::new()).unwrap();
        let result = registry.execute(&call, ToolContext::new(&bank)).await.unwrap();
        assert_eq!(result.output, "0 items");
        assert!(result.delta.is_none());
    }
}
