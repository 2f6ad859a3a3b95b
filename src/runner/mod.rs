use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_stream::try_stream;
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::agent::{Agent, HANDOFF_TOOL_PREFIX};
use crate::context::Context;
use crate::error::AgentError;
use crate::llm::{ChatModel, ModelMessage, ModelRequest, ModelToolCall, ModelToolChoice};
use crate::tools::{ToolSpec, render_output};
use crate::trace::{ToolCallTrace, Tracer};

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;
pub const DEFAULT_MAX_HANDOFFS: u32 = 5;

/// Caps for the two loops. Both are circuit breakers against runaway
/// tool-call or routing cycles, not recoverable errors.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_iterations: u32,
    pub max_handoffs: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_handoffs: DEFAULT_MAX_HANDOFFS,
        }
    }
}

/// Record of one executed tool call inside a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    pub result: String,
    pub is_error: bool,
}

/// Terminal output of one inner agent run. `handoff_to` is set only when a
/// handoff tool fired.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult {
    pub output: String,
    pub agent_name: String,
    pub messages: Vec<ModelMessage>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub handoff_to: Option<String>,
}

/// Progress events emitted while a run advances. `Completed` is always the
/// final event of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    ToolCall {
        tool: String,
        arguments: Value,
        tool_call_id: String,
    },
    ToolResult {
        tool: String,
        content: String,
        tool_call_id: String,
        is_error: bool,
    },
    Handoff {
        from: String,
        to: String,
        reason: Option<String>,
    },
    Completed {
        result: AgentResult,
    },
}

/// A requested tool call, resolved once per batch entry. The wire-name
/// prefix convention is reversed here and nowhere else.
enum RequestedCall {
    Regular,
    Handoff {
        target: Arc<Agent>,
        reason: Option<String>,
    },
}

fn classify_call(agent: &Agent, call: &ModelToolCall) -> Result<RequestedCall, AgentError> {
    let Some(slug) = call.name.strip_prefix(HANDOFF_TOOL_PREFIX) else {
        return Ok(RequestedCall::Regular);
    };

    let target =
        agent
            .handoff_agent_by_slug(slug)
            .ok_or_else(|| AgentError::HandoffTargetNotFound {
                agent: agent.name().to_string(),
                target: slug.to_string(),
            })?;

    let reason = call
        .arguments
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(RequestedCall::Handoff {
        target: Arc::clone(target),
        reason,
    })
}

/// Base tools plus one synthetic handoff tool per describable peer, built
/// fresh for each inner run. Agent definitions are never mutated.
fn effective_tools(agent: &Agent) -> Vec<ToolSpec> {
    let mut tools = agent.tools().to_vec();

    for peer in agent.handoffs() {
        if let Some(handoff_tool) = peer.handoff_tool() {
            if tools.iter().all(|tool| tool.name() != handoff_tool.name()) {
                tools.push(handoff_tool);
            }
        }
    }

    tools
}

async fn collect_result(
    stream: impl Stream<Item = Result<RunEvent, AgentError>>,
) -> Result<AgentResult, AgentError> {
    futures_util::pin_mut!(stream);

    let mut result = None;
    while let Some(event) = stream.next().await {
        if let RunEvent::Completed { result: completed } = event? {
            result = Some(completed);
        }
    }

    result.ok_or(AgentError::MissingResult)
}

/// Drives agents against a [`ChatModel`]: call the model, execute requested
/// tools or detect a handoff, append results, repeat until a plain-text
/// answer or a cap is hit.
pub struct Runner {
    model: Arc<dyn ChatModel>,
    config: RunnerConfig,
    tracer: Tracer,
}

impl Runner {
    pub fn new(model: impl ChatModel + 'static) -> Self {
        Self::with_config(model, RunnerConfig::default())
    }

    pub fn with_config(model: impl ChatModel + 'static, config: RunnerConfig) -> Self {
        Self {
            model: Arc::new(model),
            config,
            tracer: Tracer::new(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Runs a single agent to completion on a fresh context.
    pub async fn run(&self, agent: &Agent, input: &str) -> Result<AgentResult, AgentError> {
        self.run_with_context(agent, input, Context::new()).await
    }

    /// Runs a single agent on an existing context (the context is consumed;
    /// clone it first if the caller wants isolation).
    pub async fn run_with_context(
        &self,
        agent: &Agent,
        input: &str,
        context: Context,
    ) -> Result<AgentResult, AgentError> {
        collect_result(self.run_loop(agent, input.to_string(), context, agent.tools().to_vec()))
            .await
    }

    /// Streaming variant of [`run`]: yields progress events as the loop
    /// advances, ending with [`RunEvent::Completed`].
    ///
    /// [`run`]: Runner::run
    pub fn run_events<'a>(
        &'a self,
        agent: &'a Agent,
        input: impl Into<String>,
    ) -> impl Stream<Item = Result<RunEvent, AgentError>> + 'a {
        self.run_loop(agent, input.into(), Context::new(), agent.tools().to_vec())
    }

    /// Repeatedly drives the single-agent loop across a chain of agents
    /// until a final non-handoff result is produced or the handoff cap is
    /// hit. Each successor inherits the full prior transcript plus a
    /// continuation marker naming the agent that preceded it.
    pub async fn run_with_handoffs(
        &self,
        agent: &Arc<Agent>,
        input: &str,
    ) -> Result<AgentResult, AgentError> {
        let mut current = Arc::clone(agent);
        let mut input = input.to_string();
        let mut context = Context::new();
        let mut handoff_count = 0u32;

        loop {
            let tools = effective_tools(&current);
            let result =
                collect_result(self.run_loop(&current, input.clone(), context, tools)).await?;

            let Some(target_name) = result.handoff_to.clone() else {
                return Ok(result);
            };

            handoff_count += 1;

            // The inner loop only sets handoff_to for a resolved peer, but a
            // misconfigured graph should degrade to the partial result, not
            // loop forever.
            let Some(next) = current.handoff_agent(&target_name) else {
                tracing::warn!(
                    agent = current.name(),
                    target = %target_name,
                    "handoff target not found among peers, returning partial result"
                );
                return Ok(result);
            };
            let next = Arc::clone(next);

            if handoff_count >= self.config.max_handoffs {
                return Err(AgentError::MaxHandoffsReached {
                    max_handoffs: self.config.max_handoffs,
                });
            }

            tracing::info!(
                from = current.name(),
                to = next.name(),
                handoff_count,
                "continuing with handoff target"
            );

            input = format!("[Continuing from {}]", result.agent_name);
            context = Context::from_messages(result.messages.clone());
            current = next;
        }
    }

    fn run_loop<'a>(
        &'a self,
        agent: &'a Agent,
        input: String,
        mut context: Context,
        tools: Vec<ToolSpec>,
    ) -> impl Stream<Item = Result<RunEvent, AgentError>> + 'a {
        try_stream! {
            self.tracer.start_agent(agent.name());
            tracing::info!(agent = agent.name(), "starting agent run");

            if !context.has_leading_system() {
                context.push_system(agent.instructions());
            }
            context.push_user(input);

            let definitions = tools.iter().map(ToolSpec::definition).collect::<Vec<_>>();
            let tool_choice = if definitions.is_empty() {
                ModelToolChoice::None
            } else {
                ModelToolChoice::Auto
            };
            let tool_map = tools
                .iter()
                .map(|tool| (tool.name(), tool))
                .collect::<HashMap<_, _>>();

            let mut executed: Vec<ToolCallRecord> = Vec::new();

            for iteration in 1..=self.config.max_iterations {
                self.tracer.record_iteration(iteration);
                tracing::debug!(
                    agent = agent.name(),
                    iteration,
                    messages = context.len(),
                    "calling model"
                );

                let completion = self
                    .model
                    .invoke(ModelRequest {
                        model: agent.model(),
                        messages: context.messages(),
                        tools: &definitions,
                        tool_choice: tool_choice.clone(),
                        temperature: agent.temperature(),
                        max_tokens: agent.max_tokens(),
                    })
                    .await?;

                if completion.tool_calls.is_empty() {
                    let output = completion.text.unwrap_or_default();
                    context.push_assistant(Some(output.clone()), Vec::new());
                    self.tracer.finish_agent(&output, None);
                    tracing::info!(agent = agent.name(), iterations = iteration, "agent run complete");

                    yield RunEvent::Completed {
                        result: AgentResult {
                            output,
                            agent_name: agent.name().to_string(),
                            messages: context.messages().to_vec(),
                            tool_calls: executed,
                            handoff_to: None,
                        },
                    };
                    return;
                }

                // The request lands in the transcript verbatim before
                // anything executes.
                context.push_assistant(completion.text.clone(), completion.tool_calls.clone());

                // Resolve the whole batch before acting on it. A handoff
                // anywhere transfers control immediately and abandons the
                // rest of the batch; the successor inherits the transcript
                // and can re-request whatever it still needs.
                let mut handoff: Option<(Arc<Agent>, Option<String>)> = None;
                for call in &completion.tool_calls {
                    if let RequestedCall::Handoff { target, reason } = classify_call(agent, call)? {
                        handoff = Some((target, reason));
                        break;
                    }
                }

                if let Some((target, reason)) = handoff {
                    let output = format!("Handing off to {}", target.name());
                    self.tracer.finish_agent(&output, Some(target.name()));
                    tracing::info!(from = agent.name(), to = target.name(), "handoff requested");

                    yield RunEvent::Handoff {
                        from: agent.name().to_string(),
                        to: target.name().to_string(),
                        reason,
                    };
                    yield RunEvent::Completed {
                        result: AgentResult {
                            output,
                            agent_name: agent.name().to_string(),
                            messages: context.messages().to_vec(),
                            tool_calls: executed,
                            handoff_to: Some(target.name().to_string()),
                        },
                    };
                    return;
                }

                for call in &completion.tool_calls {
                    yield RunEvent::ToolCall {
                        tool: call.name.clone(),
                        arguments: call.arguments.clone(),
                        tool_call_id: call.id.clone(),
                    };

                    let started = Instant::now();
                    let (content, is_error) = match tool_map.get(call.name.as_str()) {
                        Some(tool) => match tool.execute(call.arguments.clone()).await {
                            Ok(value) => (render_output(&value), false),
                            Err(err) => (format!("Error: {err}"), true),
                        },
                        None => (format!("Error: tool '{}' not found", call.name), true),
                    };
                    let duration_ms = started.elapsed().as_millis() as u64;

                    if is_error {
                        tracing::warn!(
                            agent = agent.name(),
                            tool = %call.name,
                            result = %content,
                            "tool call failed"
                        );
                    } else {
                        tracing::debug!(
                            agent = agent.name(),
                            tool = %call.name,
                            duration_ms,
                            "tool call complete"
                        );
                    }

                    self.tracer.record_tool_call(ToolCallTrace {
                        tool_name: call.name.clone(),
                        arguments: call.arguments.clone(),
                        result: content.clone(),
                        duration_ms,
                        timestamp: Utc::now(),
                        success: !is_error,
                        error: is_error.then(|| content.clone()),
                    });

                    context.push_tool_result(
                        call.id.clone(),
                        call.name.clone(),
                        content.clone(),
                        is_error,
                    );
                    executed.push(ToolCallRecord {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                        result: content.clone(),
                        is_error,
                    });

                    yield RunEvent::ToolResult {
                        tool: call.name.clone(),
                        content,
                        tool_call_id: call.id.clone(),
                        is_error,
                    };
                }
            }

            self.tracer.finish_agent("max iterations exceeded", None);
            Err::<(), AgentError>(AgentError::MaxIterationsReached {
                agent: agent.name().to_string(),
                max_iterations: self.config.max_iterations,
            })?;
        }
    }
}
