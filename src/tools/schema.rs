//! Typed convenience layer over explicit schema registration.
//!
//! [`Parameters`] builds the object schema a [`crate::ToolSpec`] advertises
//! to the model, so call sites declare typed parameters instead of writing
//! raw JSON-Schema literals.

use serde_json::{Map, Value, json};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

/// Builder for a tool parameter schema. Parameters added with [`required`]
/// land in the schema's required list; [`optional`] ones do not.
///
/// [`required`]: Parameters::required
/// [`optional`]: Parameters::optional
#[derive(Clone, Debug, Default)]
pub struct Parameters {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(
        mut self,
        name: impl Into<String>,
        ty: JsonType,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            json!({"type": ty.as_str(), "description": description.into()}),
        );
        self.required.push(name);
        self
    }

    pub fn optional(
        mut self,
        name: impl Into<String>,
        ty: JsonType,
        description: impl Into<String>,
    ) -> Self {
        self.properties.insert(
            name.into(),
            json!({"type": ty.as_str(), "description": description.into()}),
        );
        self
    }

    pub fn build(self) -> Value {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
            "additionalProperties": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_object_schema_with_required_list() {
        let schema = Parameters::new()
            .required("description", JsonType::String, "scene description")
            .optional("urgency_level", JsonType::String, "alert urgency")
            .build();

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "description": {
                        "type": "string",
                        "description": "scene description"
                    },
                    "urgency_level": {
                        "type": "string",
                        "description": "alert urgency"
                    }
                },
                "required": ["description"],
                "additionalProperties": false,
            })
        );
    }

    #[test]
    fn empty_builder_allows_argument_free_tools() {
        let schema = Parameters::new().build();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!([]));
    }
}
