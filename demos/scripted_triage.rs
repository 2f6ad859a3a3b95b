//! Drives the full safety team offline with a scripted model.
//!
//! Run with: `cargo run --example scripted_triage`

use std::collections::VecDeque;
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use sitesafe::{
    ChatModel, ModelCompletion, ModelRequest, ModelToolCall, ProviderError, Runner, run_triage,
};

struct ScriptedModel {
    responses: Mutex<VecDeque<Result<ModelCompletion, ProviderError>>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<ModelCompletion, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, _request: ModelRequest<'_>) -> Result<ModelCompletion, ProviderError> {
        let mut guard = self.responses.lock().expect("lock poisoned");
        guard.pop_front().unwrap_or_else(|| {
            Err(ProviderError::Response(
                "scripted model exhausted responses".to_string(),
            ))
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let event_json = json!({
        "video_id": "demo_video_001",
        "safety_status": "HIGH",
        "scene_description": "A worker operating a pallet jack shows signs of distress, \
                              sweating heavily, and nearly collapses.",
        "predictions": {
            "probability": 0.9,
            "incident_type": "Medical Emergency"
        },
        "safety_response": "Provide first aid, move the worker to a cooler area, monitor closely."
    })
    .to_string();

    // Script the triage path: the router hands off to EMS, EMS assesses the
    // scene with its tool, then wraps up.
    let model = ScriptedModel::new(vec![
        Ok(ModelCompletion {
            text: None,
            tool_calls: vec![ModelToolCall {
                id: "call_1".to_string(),
                name: "handoff_to_ems_safety_agent".to_string(),
                arguments: json!({"reason": "worker in medical distress"}),
            }],
            usage: None,
        }),
        Ok(ModelCompletion {
            text: None,
            tool_calls: vec![ModelToolCall {
                id: "call_2".to_string(),
                name: "assess_medical_hazard".to_string(),
                arguments: json!({
                    "description": "Worker sweating heavily, showing confusion, near collapse"
                }),
            }],
            usage: None,
        }),
        Ok(ModelCompletion {
            text: Some(
                "Medical emergency confirmed. 911 dispatched and first aid responder assigned; \
                 monitor the worker until EMS arrives."
                    .to_string(),
            ),
            tool_calls: vec![],
            usage: None,
        }),
    ]);

    let runner = Runner::new(model);
    let result = run_triage(&runner, &event_json).await?;

    println!("Final agent: {}", result.agent_name);
    println!("Output:\n{}\n", result.output);
    println!("{}", runner.tracer().summary());

    Ok(())
}
