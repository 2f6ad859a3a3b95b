use std::collections::HashMap;

use serde_json::Value;

use crate::llm::{ModelMessage, ModelToolCall};

/// The ordered transcript driving one conversation, plus free-form metadata.
///
/// Mutated only by appending; messages are immutable once pushed. Cloning
/// yields an isolated copy so sequential runs cannot interfere with each
/// other's history.
#[derive(Clone, Debug, Default)]
pub struct Context {
    messages: Vec<ModelMessage>,
    metadata: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a context from a prior run's history (handoff continuation).
    pub fn from_messages(messages: Vec<ModelMessage>) -> Self {
        Self {
            messages,
            metadata: HashMap::new(),
        }
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// True when the transcript already opens with a system message, in which
    /// case the runner must not insert another one.
    pub fn has_leading_system(&self) -> bool {
        matches!(self.messages.first(), Some(ModelMessage::System(_)))
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(ModelMessage::System(content.into()));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ModelMessage::User(content.into()));
    }

    pub fn push_assistant(&mut self, content: Option<String>, tool_calls: Vec<ModelToolCall>) {
        self.messages.push(ModelMessage::Assistant {
            content,
            tool_calls,
        });
    }

    pub fn push_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) {
        self.messages.push(ModelMessage::ToolResult {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error,
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn leading_system_detection() {
        let mut context = Context::new();
        assert!(!context.has_leading_system());

        context.push_user("hello");
        assert!(!context.has_leading_system());

        let mut seeded = Context::new();
        seeded.push_system("instructions");
        seeded.push_user("hello");
        assert!(seeded.has_leading_system());
    }

    #[test]
    fn from_messages_preserves_order() {
        let history = vec![
            ModelMessage::System("sys".to_string()),
            ModelMessage::User("u1".to_string()),
            ModelMessage::Assistant {
                content: Some("a1".to_string()),
                tool_calls: vec![],
            },
        ];

        let context = Context::from_messages(history.clone());
        assert_eq!(context.messages(), history.as_slice());
    }

    #[test]
    fn clone_isolates_appends() {
        let mut original = Context::new();
        original.push_user("u1");

        let mut copy = original.clone();
        copy.push_user("u2");

        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn metadata_round_trip() {
        let mut context = Context::new();
        context.set_metadata("video_id", json!("vid_123"));
        assert_eq!(context.metadata("video_id"), Some(&json!("vid_123")));
        assert_eq!(context.metadata("missing"), None);
    }
}
