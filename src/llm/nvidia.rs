use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::llm::{
    ChatModel, ModelCompletion, ModelMessage, ModelRequest, ModelToolCall, ModelToolChoice,
    ModelUsage,
};

const DEFAULT_API_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// Runtime configuration for [`NvidiaModel`].
///
/// The key must be supplied explicitly or through `NVIDIA_API_KEY`; there is
/// no fallback credential.
#[derive(Debug, Clone)]
pub struct NvidiaModelConfig {
    /// API key for the inference endpoint.
    pub api_key: String,
    /// Optional base URL override for any OpenAI-compatible endpoint.
    pub api_base_url: Option<String>,
}

impl NvidiaModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = Some(base_url.into());
        self
    }
}

/// OpenAI-compatible chat-completions adapter implementing [`ChatModel`].
///
/// Targets the NVIDIA integrate endpoint by default; any compatible provider
/// works through the base-URL override.
#[derive(Debug, Clone)]
pub struct NvidiaModel {
    client: Client,
    config: NvidiaModelConfig,
}

impl NvidiaModel {
    pub fn new(config: NvidiaModelConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Request(
                "api key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .build()
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        Ok(Self { client, config })
    }

    /// Creates an adapter using `NVIDIA_API_KEY` from the environment.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("NVIDIA_API_KEY")
            .map_err(|_| ProviderError::Request("NVIDIA_API_KEY is not set".to_string()))?;
        Self::new(NvidiaModelConfig::new(api_key))
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ChatModel for NvidiaModel {
    async fn invoke(&self, request: ModelRequest<'_>) -> Result<ModelCompletion, ProviderError> {
        let payload = build_request(&request);

        let response = self
            .client
            .post(self.endpoint())
            .header("authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Request(extract_api_error(response).await));
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|err| ProviderError::Response(err.to_string()))?;

        normalize_response(parsed)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<RequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinitionPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoicePayload>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum RequestMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<WireToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct ToolDefinitionPayload {
    #[serde(rename = "type")]
    type_: String,
    function: ToolFunctionPayload,
}

#[derive(Debug, Serialize)]
struct ToolFunctionPayload {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ToolChoicePayload {
    Mode(String),
    Specific {
        #[serde(rename = "type")]
        type_: String,
        function: ToolChoiceFunction,
    },
}

#[derive(Debug, Serialize)]
struct ToolChoiceFunction {
    name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    function: WireToolCallFunction,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct WireToolCallFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<Value>,
}

fn build_request(request: &ModelRequest<'_>) -> ChatCompletionRequest {
    let messages = to_wire_messages(request.messages);

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .iter()
                .map(|tool| ToolDefinitionPayload {
                    type_: "function".to_string(),
                    function: ToolFunctionPayload {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect::<Vec<_>>(),
        )
    };

    let tool_choice = if request.tools.is_empty() {
        None
    } else {
        Some(match request.tool_choice.clone() {
            ModelToolChoice::Auto => ToolChoicePayload::Mode("auto".to_string()),
            ModelToolChoice::Required => ToolChoicePayload::Mode("required".to_string()),
            ModelToolChoice::None => ToolChoicePayload::Mode("none".to_string()),
            ModelToolChoice::Tool(name) => ToolChoicePayload::Specific {
                type_: "function".to_string(),
                function: ToolChoiceFunction { name },
            },
        })
    };

    ChatCompletionRequest {
        model: request.model.to_string(),
        messages,
        tools,
        tool_choice,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn to_wire_messages(messages: &[ModelMessage]) -> Vec<RequestMessage> {
    let mut wire = Vec::new();

    for message in messages {
        match message {
            ModelMessage::System(content) => {
                if content.is_empty() {
                    continue;
                }
                wire.push(RequestMessage::System {
                    content: content.clone(),
                });
            }
            ModelMessage::User(content) => {
                if content.is_empty() {
                    continue;
                }
                wire.push(RequestMessage::User {
                    content: content.clone(),
                });
            }
            ModelMessage::Assistant {
                content,
                tool_calls,
            } => {
                let serialized_calls = tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        type_: "function".to_string(),
                        function: WireToolCallFunction {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect::<Vec<_>>();

                let assistant_content = content.as_ref().filter(|text| !text.is_empty()).cloned();
                if assistant_content.is_none() && serialized_calls.is_empty() {
                    continue;
                }

                wire.push(RequestMessage::Assistant {
                    content: assistant_content,
                    tool_calls: if serialized_calls.is_empty() {
                        None
                    } else {
                        Some(serialized_calls)
                    },
                });
            }
            ModelMessage::ToolResult {
                tool_call_id,
                tool_name: _,
                content,
                is_error: _,
            } => {
                // Failed results already carry the error marker in content.
                wire.push(RequestMessage::Tool {
                    tool_call_id: tool_call_id.clone(),
                    content: content.clone(),
                });
            }
        }
    }

    wire
}

fn normalize_response(response: ChatCompletionResponse) -> Result<ModelCompletion, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Response("response missing choices".to_string()))?;

    let message = choice
        .message
        .ok_or_else(|| ProviderError::Response("response missing choice message".to_string()))?;

    let mut tool_calls = Vec::new();
    for call in message.tool_calls {
        tool_calls.push(ModelToolCall {
            arguments: parse_call_arguments(&call.function.name, &call.function.arguments),
            id: call.id,
            name: call.function.name,
        });
    }

    let usage = response.usage.map(|usage| ModelUsage {
        input_tokens: usage.prompt_tokens.unwrap_or(0),
        output_tokens: usage.completion_tokens.unwrap_or(0),
    });

    Ok(ModelCompletion {
        text: message.content.filter(|text| !text.is_empty()),
        tool_calls,
        usage,
    })
}

/// Malformed argument text from the model degrades to an empty object so a
/// formatting slip never kills the run; the slip is still visible in logs.
fn parse_call_arguments(tool_name: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            tracing::warn!(tool = tool_name, value = %other, "tool call arguments are not an object, using empty arguments");
            json!({})
        }
        Err(err) => {
            tracing::warn!(tool = tool_name, error = %err, "tool call arguments are not valid JSON, using empty arguments");
            json!({})
        }
    }
}

async fn extract_api_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = parsed
            .error
            .code
            .map(|value| match value {
                Value::String(value) => value,
                other => other.to_string(),
            })
            .unwrap_or_else(|| status.as_u16().to_string());
        let error_type = parsed
            .error
            .type_
            .unwrap_or_else(|| status.to_string().to_uppercase());
        let message = parsed
            .error
            .message
            .unwrap_or_else(|| "unknown api error".to_string());

        return format!("api error {code} {error_type}: {message}");
    }

    if body.is_empty() {
        format!("api request failed ({status})")
    } else {
        format!("api request failed ({status}): {body}")
    }
}
