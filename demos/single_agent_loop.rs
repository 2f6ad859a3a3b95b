//! Streams the events of a single-agent run with a scripted model.
//!
//! Run with: `cargo run --example single_agent_loop`

use std::collections::VecDeque;
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::json;
use sitesafe::{
    Agent, ChatModel, JsonType, ModelCompletion, ModelRequest, ModelToolCall, Parameters,
    ProviderError, RunEvent, Runner, ToolSpec,
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

fn headcount_tool() -> ToolSpec {
    ToolSpec::new("muster_headcount", "count personnel at the muster point")
        .with_parameters(Parameters::new().required(
            "zone",
            JsonType::String,
            "site zone to count",
        ))
        .with_handler(|args| async move {
            let zone = args.get("zone").and_then(|v| v.as_str()).unwrap_or("?");
            Ok(json!({"zone": zone, "present": 12, "expected": 12}))
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let model = ScriptedModel::new(vec![
        Ok(ModelCompletion {
            text: None,
            tool_calls: vec![ModelToolCall {
                id: "call_1".to_string(),
                name: "muster_headcount".to_string(),
                arguments: json!({"zone": "B"}),
            }],
            usage: None,
        }),
        Ok(ModelCompletion {
            text: Some("All 12 workers accounted for at the zone B muster point.".to_string()),
            tool_calls: vec![],
            usage: None,
        }),
    ]);

    let agent = Agent::builder("Evacuation Agent")
        .instructions("You verify evacuations by counting personnel at muster points.")
        .tool(headcount_tool())
        .build()?;

    let runner = Runner::new(model);
    let stream = runner.run_events(&agent, "Verify the zone B evacuation");
    futures_util::pin_mut!(stream);

    while let Some(event) = stream.next().await {
        match event? {
            RunEvent::ToolCall {
                tool, arguments, ..
            } => println!("-> tool call: {tool}({arguments})"),
            RunEvent::ToolResult { tool, content, .. } => {
                println!("<- {tool}: {content}");
            }
            RunEvent::Handoff { from, to, .. } => println!("handoff: {from} -> {to}"),
            RunEvent::Completed { result } => println!("final: {}", result.output),
        }
    }

    Ok(())
}
