//! Execution traces for observability.
//!
//! Trace records are additive: the runner writes them as it goes, callers
//! read them after the fact, and nothing in the loop ever consults them for
//! control flow.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One tool invocation inside an agent run.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallTrace {
    pub tool_name: String,
    pub arguments: Value,
    pub result: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

/// One inner agent run, from first model call to final output or handoff.
#[derive(Debug, Clone, Serialize)]
pub struct AgentTrace {
    pub agent_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub iterations: u32,
    pub tool_calls: Vec<ToolCallTrace>,
    pub handoff_to: Option<String>,
    pub final_output: Option<String>,
}

impl AgentTrace {
    fn new(agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
            iterations: 0,
            tool_calls: Vec::new(),
            handoff_to: None,
            final_output: None,
        }
    }
}

#[derive(Default)]
struct TracerInner {
    finished: Vec<AgentTrace>,
    active: Option<AgentTrace>,
}

/// Collects [`AgentTrace`] records across the runs driven by one runner.
#[derive(Default)]
pub struct Tracer {
    inner: Mutex<TracerInner>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start_agent(&self, agent_name: &str) {
        let mut inner = self.inner.lock().expect("tracer lock poisoned");
        inner.active = Some(AgentTrace::new(agent_name));
    }

    pub(crate) fn record_iteration(&self, iteration: u32) {
        let mut inner = self.inner.lock().expect("tracer lock poisoned");
        if let Some(active) = inner.active.as_mut() {
            active.iterations = iteration;
        }
    }

    pub(crate) fn record_tool_call(&self, trace: ToolCallTrace) {
        let mut inner = self.inner.lock().expect("tracer lock poisoned");
        if let Some(active) = inner.active.as_mut() {
            active.tool_calls.push(trace);
        }
    }

    pub(crate) fn finish_agent(&self, output: &str, handoff_to: Option<&str>) {
        let mut inner = self.inner.lock().expect("tracer lock poisoned");
        if let Some(mut active) = inner.active.take() {
            let finished_at = Utc::now();
            active.duration_ms = Some(
                (finished_at - active.started_at)
                    .num_milliseconds()
                    .max(0) as u64,
            );
            active.finished_at = Some(finished_at);
            active.final_output = Some(output.to_string());
            active.handoff_to = handoff_to.map(str::to_string);
            inner.finished.push(active);
        }
    }

    /// Snapshot of all completed agent traces, in execution order.
    pub fn traces(&self) -> Vec<AgentTrace> {
        self.inner
            .lock()
            .expect("tracer lock poisoned")
            .finished
            .clone()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("tracer lock poisoned");
        inner.finished.clear();
        inner.active = None;
    }

    /// Human-readable execution summary.
    pub fn summary(&self) -> String {
        let traces = self.traces();
        let mut lines = Vec::new();

        lines.push("EXECUTION SUMMARY".to_string());
        lines.push("=".repeat(60));

        for (index, trace) in traces.iter().enumerate() {
            lines.push(format!("Agent {}: {}", index + 1, trace.agent_name));
            lines.push(format!(
                "  Duration: {}ms",
                trace.duration_ms.unwrap_or_default()
            ));
            lines.push(format!("  Iterations: {}", trace.iterations));
            lines.push(format!("  Tool Calls: {}", trace.tool_calls.len()));

            for call in &trace.tool_calls {
                let status = if call.success { "ok" } else { "failed" };
                lines.push(format!(
                    "    [{status}] {} ({}ms)",
                    call.tool_name, call.duration_ms
                ));
            }

            if let Some(target) = &trace.handoff_to {
                lines.push(format!("  Handoff: -> {target}"));
            }
        }

        lines.push("=".repeat(60));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tool_call(name: &str, success: bool) -> ToolCallTrace {
        ToolCallTrace {
            tool_name: name.to_string(),
            arguments: json!({}),
            result: "done".to_string(),
            duration_ms: 3,
            timestamp: Utc::now(),
            success,
            error: if success {
                None
            } else {
                Some("boom".to_string())
            },
        }
    }

    #[test]
    fn finish_moves_active_trace_into_history() {
        let tracer = Tracer::new();
        tracer.start_agent("Safety Router Agent");
        tracer.record_iteration(1);
        tracer.record_tool_call(tool_call("assess_fire_hazard", true));
        tracer.finish_agent("Handing off to Fire Safety Agent", Some("Fire Safety Agent"));

        let traces = tracer.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].agent_name, "Safety Router Agent");
        assert_eq!(traces[0].iterations, 1);
        assert_eq!(traces[0].tool_calls.len(), 1);
        assert_eq!(traces[0].handoff_to.as_deref(), Some("Fire Safety Agent"));
        assert!(traces[0].finished_at.is_some());
    }

    #[test]
    fn records_without_an_active_trace_are_ignored() {
        let tracer = Tracer::new();
        tracer.record_iteration(3);
        tracer.record_tool_call(tool_call("orphan", false));
        tracer.finish_agent("nothing", None);
        assert!(tracer.traces().is_empty());
    }

    #[test]
    fn summary_lists_agents_in_execution_order() {
        let tracer = Tracer::new();
        tracer.start_agent("Router");
        tracer.finish_agent("Handing off to Fire", Some("Fire"));
        tracer.start_agent("Fire");
        tracer.record_tool_call(tool_call("assess_fire_hazard", false));
        tracer.finish_agent("done", None);

        let summary = tracer.summary();
        assert!(summary.contains("Agent 1: Router"));
        assert!(summary.contains("Agent 2: Fire"));
        assert!(summary.contains("Handoff: -> Fire"));
        assert!(summary.contains("[failed] assess_fire_hazard"));
    }

    #[test]
    fn clear_discards_everything() {
        let tracer = Tracer::new();
        tracer.start_agent("Router");
        tracer.finish_agent("done", None);
        tracer.clear();
        assert!(tracer.traces().is_empty());
    }
}
