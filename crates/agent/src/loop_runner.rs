//! The dispatch loop implementation.

use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use souschef_config::DispatchConfig;
use souschef_core::error::{Error, ProviderError, ToolError};
use souschef_core::event::{DomainEvent, EventBus};
use souschef_core::interpreter::{Interpretation, interpret};
use souschef_core::meal::MealPlan;
use souschef_core::memory::{MemoryBank, StateStore};
use souschef_core::message::{Conversation, Message};
use souschef_core::provider::{Provider, ProviderRequest};
use souschef_core::tool::{SideEffect, ToolCall, ToolContext, ToolKind, ToolOutput, ToolRegistry};
use tracing::{debug, info, warn};
use crate::context::ContextBuilder;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The model gave a plain answer.
    Answered,
    /// The loop stopped the model early: a second tool request after the
    /// tool ran, or too many rejected requests.
    Forced,
    /// The oracle could not be reached; the answer is an apology.
    OracleUnavailable,
}

/// What the executed tool produced in a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReport {
    pub kind: ToolKind,
    pub success: bool,
    /// Text folded back into the conversation
    pub output: String,
    /// Structured result for rendering (recipe, plan, pantry...)
    pub data: Option<serde_json::Value>,
}

/// The result of one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub status: TurnStatus,
    pub tool: Option<ToolReport>,
}

/// The dispatch loop: owns the session's state and runs one turn at a time.
///
/// Each turn queries the oracle, interprets the reply, executes at most one
/// validated tool call, and queries again for a final answer. Mutations go
/// through the store before they reach the in-memory bank.
pub struct DispatchLoop {
    /// The oracle
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per oracle response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Durable storage for the memory bank
    store: Arc<dyn StateStore>,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,

    /// Builds the messages for each query
    context: ContextBuilder,

    /// Rejected tool requests allowed per turn before giving up
    max_tool_retries: u32,

    /// The committed memory bank
    bank: MemoryBank,

    /// The session's conversation (never persisted)
    conversation: Conversation,

    /// The last meal plan generated in this session
    last_meal_plan: Option<MealPlan>,
}

impl DispatchLoop {
    /// Create a loop over an already loaded memory bank.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn StateStore>,
        event_bus: Arc<EventBus>,
        bank: MemoryBank,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            store,
            event_bus,
            context: ContextBuilder::default(),
            max_tool_retries: 1,
            bank,
            conversation: Conversation::new(),
            last_meal_plan: None,
        }
    }

    /// Load the memory bank from `store` and create a loop over it.
    pub async fn open(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn StateStore>,
        event_bus: Arc<EventBus>,
    ) -> Result<Self, Error> {
        let bank = store.load().await?;
        info!(
            store = store.name(),
            pantry = bank.pantry.len(),
            feedback = bank.feedback.len(),
            "Memory bank loaded"
        );
        Ok(Self::new(provider, model, tools, store, event_bus, bank))
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per oracle response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set how many rejected tool requests the model may correct per turn.
    pub fn with_max_tool_retries(mut self, retries: u32) -> Self {
        self.max_tool_retries = retries;
        self
    }

    /// Set how many trailing messages are sent with each query.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.context = ContextBuilder::new(limit);
        self
    }

    /// Apply the `[dispatch]` configuration section.
    pub fn with_config(self, config: &DispatchConfig) -> Self {
        self.with_max_tool_retries(config.max_tool_retries)
            .with_history_limit(config.history_limit)
    }

    /// The committed memory bank.
    pub fn bank(&self) -> &MemoryBank {
        &self.bank
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn last_meal_plan(&self) -> Option<&MealPlan> {
        self.last_meal_plan.as_ref()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Process one user utterance and produce the turn's answer.
    ///
    /// Only a persistence failure is returned as an error: the change was
    /// not saved, and the in-memory bank still holds the previous state.
    pub async fn process(&mut self, input: &str) -> Result<TurnReply, Error> {
        let turn_start = self.conversation.messages.len();
        self.conversation.push(Message::user(input));
        info!(
            conversation_id = %self.conversation.id,
            messages = self.conversation.messages.len(),
            "Processing turn"
        );

        let mut rejections: u32 = 0;
        let mut executed: Option<ToolReport> = None;
        let mut iteration = 0;

        loop {
            iteration += 1;

            let raw = match self.query(turn_start, iteration).await {
                Ok(raw) => raw,
                Err(e) => return Ok(self.oracle_unavailable(e, turn_start, executed)),
            };
            self.conversation.push(Message::assistant(&raw));

            let request = match interpret(&raw) {
                Interpretation::Text(text) => {
                    return Ok(TurnReply {
                        text,
                        status: TurnStatus::Answered,
                        tool: executed,
                    });
                }
                Interpretation::ToolRequest(request) => request,
            };

            if let Some(report) = executed.take() {
                warn!(
                    tool = %request.name,
                    iteration,
                    "Second tool request in one turn, finalizing"
                );
                let text = request.prose.unwrap_or_else(|| report.output.clone());
                return Ok(TurnReply {
                    text,
                    status: TurnStatus::Forced,
                    tool: Some(report),
                });
            }

            let call = match self.tools.resolve(&request.name, &request.params) {
                Ok(call) => call,
                Err(e) => {
                    rejections += 1;
                    warn!(tool = %request.name, error = %e, rejections, "Tool request rejected");
                    self.event_bus.publish(DomainEvent::ToolRejected {
                        tool_name: request.name.clone(),
                        reason: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    self.conversation.push(Message::tool_result(
                        &request.name,
                        format!(
                            "Error: {e}. Available tools: {}. Correct the call or answer the user directly.",
                            self.tools.names().join(", ")
                        ),
                    ));

                    if rejections > self.max_tool_retries {
                        return Ok(TurnReply {
                            text: format!("Sorry, I couldn't do that: {e}"),
                            status: TurnStatus::Forced,
                            tool: None,
                        });
                    }
                    continue;
                }
            };

            let kind = call.kind;
            match self.execute(call).await {
                Ok(report) => {
                    self.conversation
                        .push(Message::tool_result(kind.name(), &report.output));
                    executed = Some(report);
                }
                Err(e) => {
                    self.conversation.push(Message::tool_result(
                        kind.name(),
                        format!("Error: the change could not be saved: {e}"),
                    ));
                    return Err(e);
                }
            }
        }
    }

    /// Query the oracle with the assembled context.
    async fn query(&self, turn_start: usize, iteration: usize) -> Result<String, ProviderError> {
        let definitions = self.tools.definitions();
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self
                .context
                .build(&self.conversation, turn_start, &self.bank, &definitions),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            conversation_id = %self.conversation.id,
            iteration,
            messages = request.messages.len(),
            "Querying oracle"
        );

        let start = Instant::now();
        let response = self.provider.complete(request).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.event_bus.publish(DomainEvent::OracleQueried {
            conversation_id: self.conversation.id.to_string(),
            model: response.model.clone(),
            iteration,
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(response.message.content)
    }

    /// Run a validated call and commit its delta.
    ///
    /// A failing action is reported, not returned. Only a failed save is an
    /// error, and then the bank is left as it was.
    async fn execute(&mut self, call: ToolCall) -> Result<ToolReport, Error> {
        let kind = call.kind;
        let ctx = ToolContext::new(&self.bank).with_meal_plan(self.last_meal_plan.as_ref());

        let start = Instant::now();
        let result = self
            .tools
            .execute(&call, ctx)
            .await
            .and_then(|output| check_side_effect(kind, output));
        let duration_ms = start.elapsed().as_millis() as u64;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %kind, error = %e, "Tool execution failed");
                self.event_bus.publish(DomainEvent::ToolExecuted {
                    tool_name: kind.name().to_string(),
                    success: false,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                return Ok(ToolReport {
                    kind,
                    success: false,
                    output: format!("Error: {e}"),
                    data: None,
                });
            }
        };

        if let Some(delta) = &output.delta {
            let mut next = self.bank.clone();
            if next.apply(delta) {
                if let Err(e) = self.store.save(&next).await {
                    warn!(tool = %kind, error = %e, "Failed to persist memory bank");
                    self.event_bus.publish(DomainEvent::ErrorOccurred {
                        context: format!("save after {kind}"),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(e.into());
                }
                self.bank = next;
                self.event_bus.publish(DomainEvent::StateSaved {
                    store: self.store.name().to_string(),
                    pantry_size: self.bank.pantry.len(),
                    feedback_count: self.bank.feedback.len(),
                    timestamp: Utc::now(),
                });
            }
        }

        if kind == ToolKind::GenerateMealPlan
            && let Some(data) = &output.data
        {
            match MealPlan::from_value(data.clone()) {
                Ok(plan) => self.last_meal_plan = Some(plan),
                Err(e) => warn!(error = %e, "Generated meal plan could not be kept for export"),
            }
        }

        info!(tool = %kind, duration_ms, "Tool executed");
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: kind.name().to_string(),
            success: true,
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(ToolReport {
            kind,
            success: true,
            output: output.output,
            data: output.data,
        })
    }

    /// Build the reply for a turn whose oracle query failed.
    fn oracle_unavailable(
        &mut self,
        error: ProviderError,
        turn_start: usize,
        executed: Option<ToolReport>,
    ) -> TurnReply {
        warn!(error = %error, "Oracle unavailable");
        self.event_bus.publish(DomainEvent::ErrorOccurred {
            context: "oracle query".into(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });

        let text = match &executed {
            Some(report) => format!(
                "I couldn't reach the model to finish up, but {} ran: {}",
                report.kind, report.output
            ),
            None => {
                // Nothing happened this turn; forget it so the next turn starts clean.
                self.conversation.messages.truncate(turn_start);
                format!("Sorry, I couldn't reach the model right now ({error}). Please try again.")
            }
        };

        TurnReply {
            text,
            status: TurnStatus::OracleUnavailable,
            tool: executed,
        }
    }
}

/// Refuse a state change from a tool whose class is read-only.
fn check_side_effect(kind: ToolKind, output: ToolOutput) -> Result<ToolOutput, ToolError> {
    match (&output.delta, kind.side_effect()) {
        (Some(delta), SideEffect::ReadOnly) => {
            warn!(tool = %kind, ?delta, "Read-only tool returned a state change, discarding");
            Err(ToolError::ExecutionFailed {
                tool: kind.name().to_string(),
                reason: "a read-only tool cannot change the memory bank".into(),
            })
        }
        _ => Ok(output),
    }
}
