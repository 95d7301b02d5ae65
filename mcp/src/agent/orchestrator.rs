//! The bounded model/tool loop.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::time::Instant;

use super::config::AgentConfig;
use super::error::AgentError;
use super::message::{ConversationState, ToolCallRequest};
use super::metrics::{LoopMetrics, estimate_tokens};
use super::model::ModelClient;
use crate::registry::{ToolRegistry, render_output};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    /// The model produced a reply with no tool calls.
    Completed,
    /// The turn limit was reached first; the content is the give-up message.
    TurnLimitReached,
}

/// Result of one agent run.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// How the run ended.
    pub status: LoopStatus,
    /// The final answer, or the give-up message.
    pub content: String,
    /// Counters for the run.
    pub metrics: LoopMetrics,
    /// The full conversation, oldest message first.
    pub conversation: ConversationState,
}

impl LoopOutcome {
    /// True if the model produced a final answer.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == LoopStatus::Completed
    }
}

/// State of the loop between steps.
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    DispatchingTools(Vec<ToolCallRequest>),
    Done(String),
}

/// Runs conversations between a model and a tool registry.
///
/// Every call to [`run`](Self::run) starts a fresh conversation. Tools keep
/// whatever state they share (such as the page cache of the product tools)
/// across runs of the same session, so use one session per independent task
/// or clear that state between runs (see
/// [`PageCache::clear`](crate::tools::PageCache::clear)).
pub struct AgentSession<M> {
    model: M,
    registry: ToolRegistry,
    config: AgentConfig,
}

impl<M: ModelClient> AgentSession<M> {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new(model: M, registry: ToolRegistry) -> Self {
        Self {
            model,
            registry,
            config: AgentConfig::default(),
        }
    }

    /// Creates a session with the given configuration.
    #[must_use]
    pub const fn with_config(model: M, registry: ToolRegistry, config: AgentConfig) -> Self {
        Self {
            model,
            registry,
            config,
        }
    }

    /// Sets the maximum number of model invocations (fluent builder pattern).
    #[must_use]
    pub const fn max_turns(mut self, max: usize) -> Self {
        self.config.max_turns = max;
        self
    }

    /// The tools offered to the model.
    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs one conversation for `request` until the model answers without
    /// tool calls or the turn limit is reached.
    ///
    /// Tool calls within a reply are dispatched one at a time, in order, and
    /// each result is appended before the next call runs. Unknown tools,
    /// invalid arguments and failing tools become error results the model can
    /// react to; they never end the run.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Model`] if the model cannot be invoked.
    #[tracing::instrument(skip_all, fields(max_turns = self.config.max_turns))]
    pub async fn run(&self, request: impl Into<String>) -> Result<LoopOutcome, AgentError> {
        let start = Instant::now();
        let tools = self.registry.list();
        let mut conversation = ConversationState::new(request);
        let mut metrics = LoopMetrics::default();
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if metrics.turns >= self.config.max_turns {
                        tracing::warn!(
                            event = "turn_limit_reached",
                            turns = metrics.turns,
                            tool_calls = metrics.tool_calls,
                            "turn_limit_reached"
                        );
                        metrics.wall_time = start.elapsed();
                        return Ok(LoopOutcome {
                            status: LoopStatus::TurnLimitReached,
                            content: self.config.give_up_message.clone(),
                            metrics,
                            conversation,
                        });
                    }

                    metrics.turns += 1;
                    let turn = metrics.turns;
                    metrics.estimated_input_tokens += estimate_tokens(
                        &serde_json::to_string(conversation.messages()).unwrap_or_default(),
                    );

                    let reply = self
                        .model
                        .complete(conversation.messages(), &tools)
                        .await
                        .map_err(|source| AgentError::Model { turn, source })?;

                    tracing::debug!(
                        event = "model_replied",
                        turn,
                        tool_calls = reply.tool_calls.len(),
                        "model_replied"
                    );

                    let calls = reply.tool_calls.clone();
                    let content = reply.content.clone();
                    conversation.push_assistant(reply.content, reply.tool_calls)?;

                    if calls.is_empty() {
                        LoopState::Done(content.unwrap_or_default())
                    } else {
                        LoopState::DispatchingTools(calls)
                    }
                }
                LoopState::DispatchingTools(calls) => {
                    for call in calls {
                        let result = self.dispatch(&call, &mut metrics).await;
                        conversation.push_tool_result(&call.id, result)?;
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(content) => {
                    metrics.wall_time = start.elapsed();
                    tracing::info!(
                        event = "run_completed",
                        turns = metrics.turns,
                        tool_calls = metrics.tool_calls,
                        failed_tool_calls = metrics.failed_tool_calls,
                        "run_completed"
                    );
                    return Ok(LoopOutcome {
                        status: LoopStatus::Completed,
                        content,
                        metrics,
                        conversation,
                    });
                }
            };
        }
    }

    /// Runs one tool call and renders its result as message text.
    async fn dispatch(&self, call: &ToolCallRequest, metrics: &mut LoopMetrics) -> String {
        metrics.tool_calls += 1;
        let arguments = normalize_arguments(call.arguments.clone());

        match self.registry.dispatch(&call.name, arguments).await {
            Ok(output) => render_output(&output),
            Err(e) => {
                metrics.failed_tool_calls += 1;
                tracing::warn!(
                    event = "tool_call_failed",
                    tool = %call.name,
                    call_id = %call.id,
                    error = %e,
                    "tool_call_failed"
                );
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}

/// Accepts arguments sent as a JSON-encoded string and treats `null` as no arguments.
fn normalize_arguments(arguments: Value) -> Value {
    match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(parsed @ Value::Object(_)) => parsed,
            _ => Value::String(raw),
        },
        other => other,
    }
}
