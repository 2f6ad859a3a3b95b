//! Specialist hazard-assessment tools.
//!
//! Each assessment scores a scene description against a weighted keyword
//! table, maps the score to a severity tier, and dispatches the mock
//! collaborators when the tier warrants it. The agent loop only ever sees
//! the rendered summary string.

use serde_json::{Value, json};

use crate::tools::ToolSpec;
use crate::tools::notify::{dispatch_911, log_incident, send_sms_blast};
use crate::tools::schema::{JsonType, Parameters};

const MEDICAL_KEYWORDS: &[(&str, u32)] = &[
    ("chest pain", 10),
    ("heart attack", 10),
    ("unconscious", 10),
    ("not breathing", 10),
    ("arterial bleed", 10),
    ("severe bleeding", 9),
    ("seizure", 9),
    ("allergic reaction", 8),
    ("heat stroke", 8),
    ("diabetic emergency", 7),
    ("laceration", 7),
    ("sweating heavily", 6),
    ("confusion", 6),
    ("pale", 5),
];

const FIRE_KEYWORDS: &[(&str, u32)] = &[
    ("fire", 10),
    ("flames", 10),
    ("gas leak", 10),
    ("explosion", 10),
    ("smoke visible", 9),
    ("battery thermal", 9),
    ("fuel", 8),
    ("electrical overload", 8),
    ("ignition", 8),
    ("smoldering", 8),
    ("combustible", 7),
    ("oily rags", 7),
    ("sparks", 6),
    ("welding", 5),
];

const PPE_KEYWORDS: &[(&str, u32)] = &[
    ("no harness", 10),
    ("no fall protection", 10),
    ("no hard hat", 9),
    ("missing hard hat", 9),
    ("without hard hat", 9),
    ("no high-vis", 8),
    ("no vest", 8),
    ("no respirator", 8),
    ("no safety glasses", 7),
    ("no hearing protection", 6),
    ("improper ppe", 6),
];

fn score_keywords<'a>(description: &str, table: &[(&'a str, u32)]) -> (u32, Vec<&'a str>) {
    let lowered = description.to_lowercase();
    let mut score = 0;
    let mut matched = Vec::new();

    for (keyword, weight) in table {
        if lowered.contains(keyword) {
            score += weight;
            matched.push(*keyword);
        }
    }

    (score, matched)
}

fn severity_tier(score: u32, critical_at: u32, high_at: u32) -> &'static str {
    if score >= critical_at {
        "CRITICAL"
    } else if score >= high_at {
        "HIGH"
    } else {
        "MODERATE"
    }
}

/// Scores a scene for medical emergencies; CRITICAL/HIGH severity dispatches
/// 911 and logs the incident.
pub fn assess_medical_hazard(description: &str) -> String {
    let (score, conditions) = score_keywords(description, MEDICAL_KEYWORDS);

    if score == 0 {
        return "No immediate medical emergency detected. Continue routine health monitoring."
            .to_string();
    }

    let severity = severity_tier(score, 15, 8);
    let mut lines = vec![
        format!("MEDICAL EMERGENCY DETECTED - Severity: {severity}"),
        format!("Conditions identified: {}", conditions.join(", ")),
    ];

    if severity != "MODERATE" {
        let call = dispatch_911(
            "Construction Site - GPS coordinates logged",
            "Medical Emergency",
            &format!("Worker showing signs of: {}", conditions.join(", ")),
        );
        lines.push(format!("911 DISPATCHED - Call ID: {}", call.call_id));
        lines.push(format!("ETA: {}", call.estimated_arrival));
        lines.push(format!("Units: {}", call.units_dispatched.join(", ")));

        let incident = log_incident(
            "Medical Emergency",
            severity,
            json!({"conditions": conditions, "score": score}),
        );
        lines.push(format!("Incident logged: {}", incident.incident_id));
    }

    lines.push("IMMEDIATE ACTIONS:".to_string());
    lines.push("1. Do not move the worker unless immediate danger present".to_string());
    lines.push("2. Assign first aid responder to stay with worker".to_string());
    lines.push("3. Clear area and prepare for EMS arrival".to_string());

    lines.join("\n")
}

/// Scores a scene for fire hazards; CRITICAL/HIGH risk dispatches the fire
/// department and logs the incident.
pub fn assess_fire_hazard(description: &str) -> String {
    let (score, hazards) = score_keywords(description, FIRE_KEYWORDS);

    if score == 0 {
        return "No active fire hazards detected. Maintain fire prevention protocols.".to_string();
    }

    let severity = severity_tier(score, 15, 8);
    let mut lines = vec![
        format!("FIRE HAZARD DETECTED - Risk Level: {severity}"),
        format!("Hazards identified: {}", hazards.join(", ")),
    ];

    if severity != "MODERATE" {
        let call = dispatch_911(
            "Construction Site - Building/zone coordinates logged",
            "Fire Emergency",
            &format!("Fire hazard: {}", hazards.join(", ")),
        );
        lines.push(format!(
            "FIRE DEPARTMENT DISPATCHED - Call ID: {}",
            call.call_id
        ));
        lines.push(format!("ETA: {}", call.estimated_arrival));

        let incident = log_incident(
            "Fire Hazard",
            severity,
            json!({"hazards": hazards, "risk_score": score}),
        );
        lines.push(format!("Fire incident logged: {}", incident.incident_id));
    }

    lines.push("IMMEDIATE ACTIONS:".to_string());
    lines.push("1. Evacuate immediate area".to_string());
    lines.push("2. Use fire extinguisher only if safe and trained".to_string());
    lines.push("3. Activate fire alarm system".to_string());
    lines.push("4. Account for all personnel at muster point".to_string());

    lines.join("\n")
}

/// Scores a scene for PPE violations; every detection is logged, CRITICAL
/// severity issues a work stoppage.
pub fn assess_ppe_compliance(description: &str) -> String {
    let (score, violations) = score_keywords(description, PPE_KEYWORDS);

    if score == 0 {
        return "PPE compliance satisfactory. Continue monitoring.".to_string();
    }

    let severity = severity_tier(score, 9, 6);
    let mut lines = vec![
        format!("PPE VIOLATION DETECTED - Severity: {severity}"),
        format!("Violations: {}", violations.join(", ")),
    ];

    let incident = log_incident(
        "PPE Compliance Violation",
        severity,
        json!({"violations": violations, "violation_score": score}),
    );
    lines.push(format!("Violation logged: {}", incident.incident_id));

    if severity == "CRITICAL" {
        lines.push("WORK STOPPAGE ISSUED".to_string());
        lines.push("Site supervisor and safety manager notified".to_string());
    }

    lines.push("COMPLIANCE ACTIONS:".to_string());
    lines.push("1. Stop worker - no entry to hazard area".to_string());
    lines.push("2. Provide required PPE immediately".to_string());
    lines.push("3. Document violation and retrain on PPE requirements".to_string());

    lines.join("\n")
}

/// SMS blast wrapper returning a delivery summary.
pub fn send_site_alert(message: &str, urgency: &str) -> String {
    let batch = send_sms_blast(message, urgency);

    [
        "SITE-WIDE ALERT SENT".to_string(),
        format!("Batch ID: {}", batch.batch_id),
        format!("Total Recipients: {} personnel", batch.total_sent),
        "Delivery Status: ALL DELIVERED".to_string(),
        format!("Message sent: \"{message}\""),
    ]
    .join("\n")
}

fn description_argument(args: &Value) -> String {
    args.get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn medical_hazard_tool() -> ToolSpec {
    ToolSpec::new(
        "assess_medical_hazard",
        "Detect medical emergencies in a scene and dispatch emergency services if needed",
    )
    .with_parameters(Parameters::new().required(
        "description",
        JsonType::String,
        "Description of the scene to assess",
    ))
    .with_handler(|args| async move {
        Ok(json!(assess_medical_hazard(&description_argument(&args))))
    })
}

pub fn fire_hazard_tool() -> ToolSpec {
    ToolSpec::new(
        "assess_fire_hazard",
        "Detect fire hazards in a scene and alert fire services if needed",
    )
    .with_parameters(Parameters::new().required(
        "description",
        JsonType::String,
        "Description of the scene to assess",
    ))
    .with_handler(|args| async move { Ok(json!(assess_fire_hazard(&description_argument(&args)))) })
}

pub fn ppe_compliance_tool() -> ToolSpec {
    ToolSpec::new(
        "assess_ppe_compliance",
        "Detect PPE violations in a scene and enforce compliance",
    )
    .with_parameters(Parameters::new().required(
        "description",
        JsonType::String,
        "Description of the scene to assess",
    ))
    .with_handler(|args| async move {
        Ok(json!(assess_ppe_compliance(&description_argument(&args))))
    })
}

pub fn site_alert_tool() -> ToolSpec {
    ToolSpec::new(
        "send_site_alert",
        "Send an SMS notification to site personnel about a safety hazard",
    )
    .with_parameters(
        Parameters::new()
            .required("alert_message", JsonType::String, "The alert text to send")
            .optional(
                "urgency_level",
                JsonType::String,
                "CRITICAL, HIGH, MODERATE, or LOW (defaults to HIGH)",
            ),
    )
    .with_handler(|args| async move {
        let message = args
            .get("alert_message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let urgency = args
            .get("urgency_level")
            .and_then(Value::as_str)
            .unwrap_or("HIGH");
        Ok(json!(send_site_alert(message, urgency)))
    })
}
