//! Shared test helpers for dispatch loop tests.

use souschef_core::error::ProviderError;
use souschef_core::message::Message;
use souschef_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// One scripted oracle reply.
#[derive(Clone)]
pub enum Scripted {
    Text(String),
    Fail(ProviderError),
}

/// A mock provider that plays back a script and records every request.
///
/// Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    script: Vec<Scripted>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers with each text in turn.
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Scripted::Text(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        match self.script.get(index) {
            Some(Scripted::Text(text)) => Ok(make_text_response(text)),
            Some(Scripted::Fail(err)) => Err(err.clone()),
            None => panic!(
                "SequentialMockProvider: no more responses (call #{index}, have {})",
                self.script.len()
            ),
        }
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Format a tool request the way the model is instructed to.
pub fn tool_request(name: &str, params: serde_json::Value) -> String {
    serde_json::json!({ "tool_code": name, "tool_params": params }).to_string()
}
