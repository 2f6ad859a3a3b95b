use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::error::AgentError;
use crate::tools::ToolSpec;
use crate::tools::schema::{JsonType, Parameters};

/// Default model for agents that do not pick their own.
pub const DEFAULT_MODEL: &str = "nvidia/nvidia-nemotron-nano-9b-v2";

/// Wire-name prefix marking a synthetic handoff tool. The prefix exists only
/// at the model boundary; the runner resolves requested calls to a tagged
/// variant before acting on them.
pub const HANDOFF_TOOL_PREFIX: &str = "handoff_to_";

/// Derives the wire slug for an agent display name: lowercased, spaces
/// replaced with underscores.
pub(crate) fn handoff_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// A configured persona: instructions, model target, sampling parameters,
/// owned tools, and the peers it may hand control to.
///
/// Agents are built once and read-only afterwards. Handoff tools are never
/// injected into an agent; the runner assembles a per-call effective tool
/// set instead, so one agent definition is safe to share across concurrent
/// runs.
#[derive(Debug)]
pub struct Agent {
    name: String,
    instructions: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    tools: Vec<ToolSpec>,
    tool_map: HashMap<String, usize>,
    handoffs: Vec<Arc<Agent>>,
    handoff_description: Option<String>,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn handoffs(&self) -> &[Arc<Agent>] {
        &self.handoffs
    }

    pub fn handoff_description(&self) -> Option<&str> {
        self.handoff_description.as_deref()
    }

    /// Exact-name tool lookup; absence rather than an error.
    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tool_map.get(name).map(|index| &self.tools[*index])
    }

    /// Case-insensitive lookup among declared handoff peers by display name.
    pub fn handoff_agent(&self, name: &str) -> Option<&Arc<Agent>> {
        self.handoffs
            .iter()
            .find(|peer| peer.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a wire slug (the part after the handoff prefix) back to a
    /// declared peer.
    pub(crate) fn handoff_agent_by_slug(&self, slug: &str) -> Option<&Arc<Agent>> {
        self.handoffs
            .iter()
            .find(|peer| handoff_slug(&peer.name).eq_ignore_ascii_case(slug))
    }

    /// Synthesizes the tool other agents use to hand control to this one.
    ///
    /// `None` when the agent has no handoff description: it opts out of
    /// being a handoff target. The executed body is cosmetic; the runner
    /// recognizes the call and transfers control before execution.
    pub fn handoff_tool(&self) -> Option<ToolSpec> {
        let description = self.handoff_description.clone()?;
        let agent_name = self.name.clone();

        Some(
            ToolSpec::new(
                format!("{HANDOFF_TOOL_PREFIX}{}", handoff_slug(&self.name)),
                description,
            )
            .with_parameters(Parameters::new().optional(
                "reason",
                JsonType::String,
                "Reason for the handoff",
            ))
            .with_handler(move |args| {
                let agent_name = agent_name.clone();
                async move {
                    let reason = args
                        .get("reason")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or_default();
                    Ok(json!(format!("Handing off to {agent_name}: {reason}")))
                }
            }),
        )
    }
}

pub struct AgentBuilder {
    name: String,
    instructions: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    tools: Vec<ToolSpec>,
    handoffs: Vec<Arc<Agent>>,
    handoff_description: Option<String>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            tools: Vec::new(),
            handoffs: Vec::new(),
            handoff_description: None,
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn handoff(mut self, agent: Arc<Agent>) -> Self {
        self.handoffs.push(agent);
        self
    }

    pub fn handoffs(mut self, agents: Vec<Arc<Agent>>) -> Self {
        self.handoffs.extend(agents);
        self
    }

    /// Marks this agent as a valid handoff target; the text becomes the
    /// synthetic handoff tool's description.
    pub fn handoff_description(mut self, description: impl Into<String>) -> Self {
        self.handoff_description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Config("agent name must not be empty".to_string()));
        }

        let Some(instructions) = self.instructions else {
            return Err(AgentError::Config(format!(
                "agent '{}' must have instructions",
                self.name
            )));
        };

        let mut tool_map = HashMap::new();
        for (index, tool) in self.tools.iter().enumerate() {
            if tool_map.insert(tool.name().to_string(), index).is_some() {
                return Err(AgentError::Config(format!(
                    "duplicate tool registered on agent '{}': {}",
                    self.name,
                    tool.name()
                )));
            }
        }

        Ok(Agent {
            name: self.name,
            instructions,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools,
            tool_map,
            handoffs: self.handoffs,
            handoff_description: self.handoff_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, description: Option<&str>) -> Arc<Agent> {
        let mut builder = Agent::builder(name).instructions("specialist");
        if let Some(description) = description {
            builder = builder.handoff_description(description);
        }
        Arc::new(builder.build().expect("agent builds"))
    }

    #[test]
    fn build_rejects_duplicate_tool_names() {
        let err = Agent::builder("Router")
            .instructions("route")
            .tool(ToolSpec::new("alert", "first"))
            .tool(ToolSpec::new("alert", "second"))
            .build()
            .expect_err("must fail");

        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn build_requires_instructions() {
        let err = Agent::builder("Router").build().expect_err("must fail");
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn handoff_agent_lookup_is_case_insensitive() {
        let fire = peer("Fire Safety Agent", Some("fire hazards"));
        let router = Agent::builder("Safety Router Agent")
            .instructions("route")
            .handoff(fire.clone())
            .build()
            .expect("agent builds");

        assert!(router.handoff_agent("fire safety agent").is_some());
        assert!(router.handoff_agent("FIRE SAFETY AGENT").is_some());
        assert!(router.handoff_agent("Medical Agent").is_none());
    }

    #[test]
    fn handoff_slug_round_trips_through_peer_lookup() {
        let fire = peer("Fire Safety Agent", Some("fire hazards"));
        let router = Agent::builder("Safety Router Agent")
            .instructions("route")
            .handoff(fire.clone())
            .build()
            .expect("agent builds");

        let slug = handoff_slug(fire.name());
        assert_eq!(slug, "fire_safety_agent");
        assert!(router.handoff_agent_by_slug(&slug).is_some());
        assert!(router.handoff_agent_by_slug("unknown_agent").is_none());
    }

    #[test]
    fn handoff_tool_requires_a_description() {
        let describable = peer("Fire Safety Agent", Some("Use for fire hazards"));
        let tool = describable.handoff_tool().expect("tool synthesized");
        assert_eq!(tool.name(), "handoff_to_fire_safety_agent");
        assert_eq!(tool.description(), "Use for fire hazards");

        let silent = peer("Scratch Agent", None);
        assert!(silent.handoff_tool().is_none());
    }

    #[tokio::test]
    async fn handoff_tool_body_is_cosmetic() {
        let fire = peer("Fire Safety Agent", Some("fire hazards"));
        let tool = fire.handoff_tool().expect("tool synthesized");

        let value = tool
            .execute(serde_json::json!({"reason": "visible flames"}))
            .await
            .expect("tool executes");
        assert_eq!(
            value,
            serde_json::json!("Handing off to Fire Safety Agent: visible flames")
        );
    }
}
