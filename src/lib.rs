//! Agent loop with tool calling and handoff routing for construction-site
//! safety triage.
//!
//! Surface:
//! - [`Runner`] drives the single-agent loop (`run`, `run_events`) and
//!   multi-agent handoff control (`run_with_handoffs`)
//! - [`Agent`] definitions with explicit tool registration and handoff peers
//! - [`NvidiaModel`] adapter for any OpenAI-compatible chat endpoint
//! - the preconfigured safety [`team`] and its hazard-assessment tools

pub mod agent;
pub mod context;
pub mod error;
pub mod event;
pub mod llm;
pub mod runner;
pub mod team;
pub mod tools;
pub mod trace;

pub use agent::{Agent, AgentBuilder, DEFAULT_MODEL, HANDOFF_TOOL_PREFIX};
pub use context::Context;
pub use error::{AgentError, ProviderError, SchemaError, ToolError};
pub use event::{IncidentType, Prediction, SafetyEvent, SafetyStatus};
pub use llm::{
    ChatModel, ModelCompletion, ModelMessage, ModelRequest, ModelToolCall, ModelToolChoice,
    ModelToolDefinition, ModelUsage, NvidiaModel, NvidiaModelConfig,
};
pub use runner::{
    AgentResult, DEFAULT_MAX_HANDOFFS, DEFAULT_MAX_ITERATIONS, RunEvent, Runner, RunnerConfig,
    ToolCallRecord,
};
pub use team::{SafetyTeam, analysis_prompt, run_triage, safety_team};
pub use tools::ToolSpec;
pub use tools::schema::{JsonType, Parameters};
pub use trace::{AgentTrace, ToolCallTrace, Tracer};
