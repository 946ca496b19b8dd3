//! Response interpreter: turns raw oracle text into a reply or a tool request.
//!
//! Extraction runs in two phases: locate a JSON payload (a fenced block is
//! preferred, otherwise the span from the first `{` to the last `}`), then
//! check that it has the shape of a tool request. Any failure degrades to
//! [`Interpretation::Text`] carrying the raw output. Interpretation never fails.

use serde_json::{Map, Value};

const FENCE: &str = "```";
const NAME_KEYS: [&str; 3] = ["tool_code", "tool", "name"];
const PARAM_KEYS: [&str; 3] = ["tool_params", "params", "arguments"];

/// The outcome of interpreting one oracle response.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// A plain reply for the user.
    Text(String),
    /// A candidate tool call; not yet validated against the registry.
    ToolRequest(ToolRequest),
}

/// A structured action request found in the oracle's output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub name: String,
    pub params: Map<String, Value>,
    /// Text surrounding the structured block, if any
    pub prose: Option<String>,
}

/// A located JSON payload and the text around it.
struct Located<'a> {
    payload: &'a str,
    before: &'a str,
    after: &'a str,
}

/// Interpret raw oracle output.
pub fn interpret(raw: &str) -> Interpretation {
    let Some(located) = locate(raw) else {
        return Interpretation::Text(raw.to_string());
    };
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(located.payload.trim()) else {
        return Interpretation::Text(raw.to_string());
    };
    match tool_request_from(obj) {
        Some(mut request) => {
            let prose = format!("{} {}", located.before.trim(), located.after.trim());
            let prose = prose.trim();
            if !prose.is_empty() {
                request.prose = Some(prose.to_string());
            }
            Interpretation::ToolRequest(request)
        }
        None => Interpretation::Text(raw.to_string()),
    }
}

/// Extract the first JSON value (object or array) embedded in model output.
///
/// Used by the generator tools, whose oracle replies are JSON wrapped in
/// varying amounts of prose and code fences.
pub fn extract_json_value(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }
    if raw.contains(FENCE) {
        let located = locate_fenced(raw)?;
        return serde_json::from_str(located.payload.trim()).ok();
    }
    let object_first = match (raw.find('{'), raw.find('[')) {
        (Some(brace), Some(bracket)) => brace < bracket,
        (brace, _) => brace.is_some(),
    };
    let (first, second) = if object_first {
        (('{', '}'), ('[', ']'))
    } else {
        (('[', ']'), ('{', '}'))
    };
    [first, second].into_iter().find_map(|(open, close)| {
        span(raw, open, close).and_then(|located| serde_json::from_str(located.payload).ok())
    })
}

fn locate(raw: &str) -> Option<Located<'_>> {
    if raw.contains(FENCE) {
        locate_fenced(raw)
    } else {
        span(raw, '{', '}')
    }
}

/// Find the first fenced block. An opened but unterminated fence yields `None`.
fn locate_fenced(raw: &str) -> Option<Located<'_>> {
    let open = raw.find(FENCE)?;
    let rest = &raw[open + FENCE.len()..];

    // Skip a language tag such as `json` on the opening line.
    let body_offset = match rest.find('\n') {
        Some(nl) if rest[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => nl + 1,
        _ => 0,
    };
    let body = &rest[body_offset..];
    let close = body.find(FENCE)?;

    Some(Located {
        payload: &body[..close],
        before: &raw[..open],
        after: &body[close + FENCE.len()..],
    })
}

/// The span from the first `open` to the last `close` character.
fn span(raw: &str, open: char, close: char) -> Option<Located<'_>> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(Located {
        payload: &raw[start..=end],
        before: &raw[..start],
        after: &raw[end + 1..],
    })
}

fn tool_request_from(mut obj: Map<String, Value>) -> Option<ToolRequest> {
    let name = NAME_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|n| !n.is_empty())?
        .to_string();

    let params = match PARAM_KEYS.iter().find_map(|key| obj.remove(*key)) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => return None,
    };

    Some(ToolRequest {
        name,
        params,
        prose: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expect_request(raw: &str) -> ToolRequest {
        match interpret(raw) {
            Interpretation::ToolRequest(req) => req,
            other => panic!("expected tool request, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_is_text() {
        let raw = "Leek soup sounds lovely. Want a recipe?";
        assert_eq!(interpret(raw), Interpretation::Text(raw.into()));
    }

    #[test]
    fn fenced_json_block_is_tool_request() {
        let raw = "Sure, adding those now.\n```json\n{\"tool_code\": \"add_to_pantry\", \"tool_params\": {\"ingredients\": [\"leeks\"]}}\n```";
        let req = expect_request(raw);
        assert_eq!(req.name, "add_to_pantry");
        assert_eq!(req.params["ingredients"], json!(["leeks"]));
        assert_eq!(req.prose.as_deref(), Some("Sure, adding those now."));
    }

    #[test]
    fn bare_fence_without_language_tag() {
        let raw = "```\n{\"tool_code\": \"view_pantry\"}\n```";
        let req = expect_request(raw);
        assert_eq!(req.name, "view_pantry");
        assert!(req.params.is_empty());
        assert!(req.prose.is_none());
    }

    #[test]
    fn unfenced_object_uses_brace_span() {
        let req = expect_request(r#"{"tool": "view_pantry", "params": null}"#);
        assert_eq!(req.name, "view_pantry");
        assert!(req.params.is_empty());
    }

    #[test]
    fn unterminated_fence_is_text() {
        let raw = "```json\n{\"tool_code\": \"view_pantry\", \"tool_params\": {}}";
        assert_eq!(interpret(raw), Interpretation::Text(raw.into()));
    }

    #[test]
    fn object_without_tool_name_is_text() {
        let raw = r#"{"title": "Leek Soup", "servings": 2}"#;
        assert_eq!(interpret(raw), Interpretation::Text(raw.into()));
    }

    #[test]
    fn non_object_params_is_text() {
        let raw = r#"{"tool_code": "add_to_pantry", "tool_params": "leeks"}"#;
        assert_eq!(interpret(raw), Interpretation::Text(raw.into()));
    }

    #[test]
    fn broken_json_is_text() {
        let raw = "Here you go: {\"tool_code\": \"view_pantry\", ";
        assert_eq!(interpret(raw), Interpretation::Text(raw.into()));
    }

    #[test]
    fn extract_json_value_handles_arrays_and_fences() {
        let plan = extract_json_value("Here is your plan:\n[{\"day\": 1, \"meal_name\": \"Oatmeal\"}]");
        assert!(plan.unwrap().is_array());

        let recipe = extract_json_value("```json\n{\"title\": \"Leek Soup\"}\n```\nEnjoy!");
        assert_eq!(recipe.unwrap()["title"], "Leek Soup");

        assert!(extract_json_value("no json here").is_none());
    }
}
