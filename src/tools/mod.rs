pub mod notify;
pub mod safety;
pub mod schema;

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::{SchemaError, ToolError};
use crate::llm::ModelToolDefinition;
use crate::tools::schema::Parameters;

type ToolHandler =
    dyn Fn(Value) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync;

/// A named, schema-described callable the model may request to invoke.
///
/// Registration is always explicit: name, description, parameter schema, and
/// handler. The handler receives the validated argument object and returns a
/// JSON value that the runner normalizes into the tool-result string.
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    parameters: Value,
    handler: Arc<ToolHandler>,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": true,
            }),
            handler: Arc::new(|_args| {
                Box::pin(async {
                    Err(ToolError::Execution(
                        "tool handler not configured".to_string(),
                    ))
                })
            }),
        }
    }

    /// Attaches an explicit JSON-Schema parameter object, validating its root
    /// shape first.
    pub fn with_schema(mut self, schema: Value) -> Result<Self, SchemaError> {
        validate_schema(&schema)?;
        self.parameters = schema;
        Ok(self)
    }

    /// Attaches a schema built with [`Parameters`]; infallible because the
    /// builder only produces valid object schemas.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters.build();
        self
    }

    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.handler = Arc::new(move |args| Box::pin(handler(args)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// The wire-facing schema advertised to the model.
    pub fn definition(&self) -> ModelToolDefinition {
        ModelToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }

    pub async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        validate_arguments(self.name(), &self.parameters, &args)?;
        (self.handler)(args).await
    }
}

/// Normalizes a tool's return value into the string fed back to the model:
/// objects and arrays serialize to canonical JSON text, strings pass through
/// unquoted, everything else stringifies.
pub fn render_output(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => value.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn validate_schema(schema: &Value) -> Result<(), SchemaError> {
    let schema_obj = schema.as_object().ok_or(SchemaError::SchemaNotObject)?;

    let root_type = schema_obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(SchemaError::RootTypeMustBeObject)?;

    if root_type != "object" {
        return Err(SchemaError::RootTypeMustBeObject);
    }

    if let Some(required) = schema_obj.get("required") {
        let required_arr = required.as_array().ok_or(SchemaError::InvalidRequired)?;
        for item in required_arr {
            if !item.is_string() {
                return Err(SchemaError::InvalidRequired);
            }
        }
    }

    Ok(())
}

fn validate_arguments(tool_name: &str, schema: &Value, args: &Value) -> Result<(), ToolError> {
    let args_obj = args
        .as_object()
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool_name.to_string(),
            message: "arguments must be a JSON object".to_string(),
        })?;

    let schema_obj = schema
        .as_object()
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool_name.to_string(),
            message: "tool schema must be a JSON object".to_string(),
        })?;

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for field in required {
            let Some(field_name) = field.as_str() else {
                continue;
            };
            if !args_obj.contains_key(field_name) {
                return Err(ToolError::InvalidArguments {
                    tool: tool_name.to_string(),
                    message: format!("missing required field: {field_name}"),
                });
            }
        }
    }

    let properties = schema_obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if schema_obj
        .get("additionalProperties")
        .and_then(Value::as_bool)
        == Some(false)
    {
        for key in args_obj.keys() {
            if !properties.contains_key(key) {
                return Err(ToolError::InvalidArguments {
                    tool: tool_name.to_string(),
                    message: format!("unknown field: {key}"),
                });
            }
        }
    }

    for (key, value) in args_obj {
        if let Some(field_schema) = properties.get(key) {
            if let Some(type_name) = field_schema.get("type").and_then(Value::as_str) {
                if !value_matches_type(value, type_name) {
                    return Err(ToolError::InvalidArguments {
                        tool: tool_name.to_string(),
                        message: format!("field '{key}' must be of type {type_name}"),
                    });
                }
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "string" => value.is_string(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "number" => value.as_f64().is_some(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::schema::JsonType;

    #[test]
    fn schema_validation_rejects_non_object_root() {
        let result = ToolSpec::new("bad", "bad").with_schema(json!({"type": "string"}));
        assert!(result.is_err());
    }

    #[test]
    fn render_output_normalizes_by_shape() {
        assert_eq!(render_output(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(render_output(&json!([1, 2])), "[1,2]");
        assert_eq!(render_output(&json!("plain text")), "plain text");
        assert_eq!(render_output(&json!(42)), "42");
        assert_eq!(render_output(&json!(true)), "true");
    }

    #[tokio::test]
    async fn argument_validation_reports_missing_required() {
        let tool = ToolSpec::new("alert", "send alert")
            .with_parameters(
                Parameters::new().required("message", JsonType::String, "alert text"),
            )
            .with_handler(|_args| async move { Ok(json!("sent")) });

        let err = tool.execute(json!({})).await.expect_err("should fail");

        let message = err.to_string();
        assert!(message.contains("missing required field"));
    }

    #[tokio::test]
    async fn argument_validation_rejects_wrong_type() {
        let tool = ToolSpec::new("score", "score a scene")
            .with_parameters(
                Parameters::new().required("description", JsonType::String, "scene text"),
            )
            .with_handler(|_args| async move { Ok(json!("ok")) });

        let err = tool
            .execute(json!({"description": 7}))
            .await
            .expect_err("should fail");

        assert!(err.to_string().contains("must be of type string"));
    }

    #[tokio::test]
    async fn handler_receives_validated_arguments() {
        let tool = ToolSpec::new("echo", "echo the message")
            .with_parameters(
                Parameters::new().required("message", JsonType::String, "message"),
            )
            .with_handler(|args| async move {
                let message = args
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ToolError::Execution("message missing".to_string()))?;
                Ok(json!({"echoed": message}))
            });

        let value = tool
            .execute(json!({"message": "hi"}))
            .await
            .expect("tool executes");
        assert_eq!(value, json!({"echoed": "hi"}));
    }
}
