mod nvidia;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

pub use nvidia::{NvidiaModel, NvidiaModelConfig};

/// One turn of the rolling conversation sent to the model.
///
/// A `ToolResult` must back-reference a `tool_call_id` that appeared in a
/// preceding `Assistant` turn's tool-call list.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelMessage {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ModelToolCall>,
    },
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        content: String,
        is_error: bool,
    },
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A tool schema advertised to the model.
#[derive(Clone, Debug)]
pub struct ModelToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelToolChoice {
    Auto,
    Required,
    None,
    Tool(String),
}

/// A single chat-completion call.
///
/// Model id and sampling parameters travel with the request because the
/// active agent, not the adapter, owns them.
#[derive(Clone, Debug)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ModelMessage],
    pub tools: &'a [ModelToolDefinition],
    pub tool_choice: ModelToolChoice,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Normalized model output: either assistant text, requested tool calls,
/// or both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelCompletion {
    pub text: Option<String>,
    pub tool_calls: Vec<ModelToolCall>,
    pub usage: Option<ModelUsage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The single outbound boundary of the runner. Any chat-completion provider
/// that understands tool calling can be substituted.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, request: ModelRequest<'_>) -> Result<ModelCompletion, ProviderError>;
}
