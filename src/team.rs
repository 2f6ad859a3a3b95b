//! The preconfigured construction-site safety team.
//!
//! A router agent reads the hazard assessment and hands control to the
//! matching specialist. Routing priority between simultaneous hazards is a
//! content policy stated in the router's instructions; the engine does not
//! enforce it.

use std::sync::Arc;

use crate::agent::Agent;
use crate::error::AgentError;
use crate::runner::{AgentResult, Runner};
use crate::tools::safety::{
    fire_hazard_tool, medical_hazard_tool, ppe_compliance_tool, site_alert_tool,
};

/// The assembled agent graph. The router owns the handoff edges; the
/// specialists are exposed so callers can drive one directly.
pub struct SafetyTeam {
    pub router: Arc<Agent>,
    pub medical: Arc<Agent>,
    pub fire: Arc<Agent>,
    pub compliance: Arc<Agent>,
}

/// Builds the router and its three specialists.
pub fn safety_team() -> Result<SafetyTeam, AgentError> {
    let medical = Arc::new(
        Agent::builder("EMS Safety Agent")
            .instructions(
                "You are an emergency medical services safety specialist. You detect and \
                 respond to medical emergencies on construction sites including chest pain, \
                 heat stroke, severe lacerations, allergic reactions, and diabetic \
                 emergencies. Provide immediate action steps and determine if 911 should be \
                 called. Be specific about symptoms observed and urgency level.",
            )
            .tool(medical_hazard_tool())
            .tool(site_alert_tool())
            .handoff_description(
                "Use for medical emergencies, worker health issues, injuries requiring \
                 immediate medical attention",
            )
            .build()?,
    );

    let fire = Arc::new(
        Agent::builder("Fire Safety Agent")
            .instructions(
                "You are a fire safety specialist. You identify fire hazards including \
                 spontaneous combustion risks, welding sparks near combustibles, electrical \
                 overloads, fuel storage violations, and battery thermal runaway. Provide \
                 fire prevention steps and emergency response procedures. Be specific about \
                 ignition sources and combustible materials present.",
            )
            .tool(fire_hazard_tool())
            .tool(site_alert_tool())
            .handoff_description(
                "Use for fire hazards, welding operations, electrical issues, combustible \
                 material storage",
            )
            .build()?,
    );

    let compliance = Arc::new(
        Agent::builder("PPE Compliance Agent")
            .instructions(
                "You are a PPE compliance specialist. You identify workers not wearing \
                 required personal protective equipment including hard hats, high-visibility \
                 clothing, fall protection harnesses, hearing protection, and respirators. \
                 Enforce PPE requirements and stop work if violations create imminent \
                 danger. Be specific about what PPE is missing and why it's required.",
            )
            .tool(ppe_compliance_tool())
            .tool(site_alert_tool())
            .handoff_description("Use for PPE violations, safety equipment issues, compliance enforcement")
            .build()?,
    );

    let router = Arc::new(
        Agent::builder("Safety Router Agent")
            .instructions(
                "You are the main safety coordinator. Analyze construction site scenarios \
                 and determine which type of hazard is present. Route to the appropriate \
                 specialist agent:\n\
                 - EMS Safety Agent: medical emergencies, worker health issues, heat-related illness\n\
                 - Fire Safety Agent: fire hazards, ignition sources, combustibles\n\
                 - PPE Compliance Agent: missing or improper safety equipment\n\n\
                 If multiple hazards exist, prioritize: medical > fire > compliance.",
            )
            .handoffs(vec![
                Arc::clone(&medical),
                Arc::clone(&fire),
                Arc::clone(&compliance),
            ])
            .build()?,
    );

    Ok(SafetyTeam {
        router,
        medical,
        fire,
        compliance,
    })
}

/// Wraps a hazard-assessment document in the triage prompt.
pub fn analysis_prompt(event_json: &str) -> String {
    format!("Analyze this construction site scenario for safety hazards:\n\n{event_json}")
}

/// Top-level entry point: routes an assessment document through the team and
/// returns the final specialist result.
pub async fn run_triage(runner: &Runner, event_json: &str) -> Result<AgentResult, AgentError> {
    let team = safety_team()?;
    runner
        .run_with_handoffs(&team.router, &analysis_prompt(event_json))
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::ProviderError;
    use crate::llm::{ChatModel, ModelCompletion, ModelRequest, ModelToolCall};

    struct ScriptedModel {
        responses: Mutex<VecDeque<ModelCompletion>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<ModelCompletion>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn invoke(
            &self,
            _request: ModelRequest<'_>,
        ) -> Result<ModelCompletion, ProviderError> {
            self.responses
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .ok_or_else(|| {
                    ProviderError::Response("scripted model exhausted responses".to_string())
                })
        }
    }

    #[tokio::test]
    async fn triage_routes_medical_event_to_ems_specialist() {
        let event_json = json!({
            "video_id": "vid_042",
            "safety_status": "HIGH",
            "scene_description": "Worker has chest pain and is sweating heavily",
            "predictions": {"probability": 0.9, "incident_type": "Medical Emergency"},
            "safety_response": "Provide first aid immediately"
        })
        .to_string();

        let model = ScriptedModel::new(vec![
            ModelCompletion {
                text: None,
                tool_calls: vec![ModelToolCall {
                    id: "call_1".to_string(),
                    name: "handoff_to_ems_safety_agent".to_string(),
                    arguments: json!({"reason": "medical distress"}),
                }],
                usage: None,
            },
            ModelCompletion {
                text: None,
                tool_calls: vec![ModelToolCall {
                    id: "call_2".to_string(),
                    name: "assess_medical_hazard".to_string(),
                    arguments: json!({
                        "description": "Worker has chest pain and is sweating heavily"
                    }),
                }],
                usage: None,
            },
            ModelCompletion {
                text: Some("911 dispatched; first aid responder assigned.".to_string()),
                tool_calls: vec![],
                usage: None,
            },
        ]);

        let runner = Runner::new(model);
        let result = run_triage(&runner, &event_json).await.expect("triage runs");

        assert_eq!(result.agent_name, "EMS Safety Agent");
        assert_eq!(result.output, "911 dispatched; first aid responder assigned.");
        assert!(result.handoff_to.is_none());

        let traces = runner.tracer().traces();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].agent_name, "Safety Router Agent");
        assert_eq!(traces[0].handoff_to.as_deref(), Some("EMS Safety Agent"));
        // the specialist's tool actually ran and dispatched the mocks
        assert_eq!(traces[1].tool_calls.len(), 1);
        assert!(traces[1].tool_calls[0].result.contains("911 DISPATCHED"));
    }

    #[test]
    fn team_wires_router_to_all_specialists() {
        let team = safety_team().expect("team builds");

        assert_eq!(team.router.handoffs().len(), 3);
        assert!(team.router.handoff_agent("EMS Safety Agent").is_some());
        assert!(team.router.handoff_agent("Fire Safety Agent").is_some());
        assert!(team.router.handoff_agent("PPE Compliance Agent").is_some());
        // the router itself cannot be handed off to
        assert!(team.router.handoff_description().is_none());
    }

    #[test]
    fn specialists_are_valid_handoff_targets() {
        let team = safety_team().expect("team builds");

        for specialist in [&team.medical, &team.fire, &team.compliance] {
            let tool = specialist.handoff_tool().expect("handoff tool synthesized");
            assert!(tool.name().starts_with("handoff_to_"));
        }

        assert_eq!(
            team.fire.handoff_tool().expect("tool").name(),
            "handoff_to_fire_safety_agent"
        );
    }

    #[test]
    fn specialists_carry_their_assessment_tools() {
        let team = safety_team().expect("team builds");

        assert!(team.medical.tool("assess_medical_hazard").is_some());
        assert!(team.fire.tool("assess_fire_hazard").is_some());
        assert!(team.compliance.tool("assess_ppe_compliance").is_some());
        assert!(team.medical.tool("send_site_alert").is_some());
        assert!(team.router.tools().is_empty());
    }

    #[test]
    fn analysis_prompt_embeds_the_document() {
        let prompt = analysis_prompt("{\"video_id\":\"v1\"}");
        assert!(prompt.starts_with("Analyze this construction site scenario"));
        assert!(prompt.ends_with("{\"video_id\":\"v1\"}"));
    }
}
