use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("tool schema must be a JSON object")]
    SchemaNotObject,
    #[error("tool schema must declare type=object")]
    RootTypeMustBeObject,
    #[error("required must be an array of strings")]
    InvalidRequired,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid tool arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("tool execution failed: {0}")]
    Execution(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider response invalid: {0}")]
    Response(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("agent '{agent}' exceeded maximum iterations ({max_iterations})")]
    MaxIterationsReached { agent: String, max_iterations: u32 },
    #[error("maximum handoffs ({max_handoffs}) exceeded")]
    MaxHandoffsReached { max_handoffs: u32 },
    #[error("handoff target '{target}' is not a declared peer of agent '{agent}'")]
    HandoffTargetNotFound { agent: String, target: String },
    #[error("agent run ended without producing a result")]
    MissingResult,
    #[error("agent configuration error: {0}")]
    Config(String),
}
