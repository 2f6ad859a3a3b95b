//! Mock notification and dispatch collaborators.
//!
//! These stand in for real emergency-service and safety-management
//! integrations. They perform only local computation and return small
//! structured records; the agent loop invokes them exclusively through the
//! tool execute path.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Site personnel roster used by the SMS blast: (name, role, priority).
/// Priority 1 is management, 2 supervisors/leads, 3 everyone else.
const SITE_PERSONNEL: &[(&str, &str, u8)] = &[
    ("John Smith", "Safety Manager", 1),
    ("Maria Garcia", "Site Supervisor", 1),
    ("Lisa Anderson", "First Aid Responder", 1),
    ("David Chen", "Foreman - Zone A", 2),
    ("Sarah Johnson", "Foreman - Zone B", 2),
    ("Michael Brown", "Security Officer", 2),
    ("James Davis", "Crane Operator", 2),
    ("Patricia Wilson", "Electrical Lead", 2),
    ("Robert Williams", "Equipment Operator", 3),
    ("Jennifer Martinez", "Quality Inspector", 3),
];

#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub call_id: String,
    pub status: String,
    pub estimated_arrival: String,
    pub units_dispatched: Vec<String>,
    pub dispatcher_notes: String,
    pub timestamp: DateTime<Utc>,
}

/// Mock 911 dispatch. Fire emergencies get an engine alongside the
/// ambulance.
pub fn dispatch_911(location: &str, emergency_type: &str, description: &str) -> DispatchRecord {
    let now = Utc::now();
    let units = if emergency_type.to_lowercase().contains("fire") {
        vec!["Ambulance 42".to_string(), "Fire Engine 7".to_string()]
    } else {
        vec!["Ambulance 42".to_string()]
    };

    DispatchRecord {
        call_id: format!("911-{}", now.format("%Y%m%d-%H%M%S")),
        status: "dispatched".to_string(),
        estimated_arrival: "8-12 minutes".to_string(),
        units_dispatched: units,
        dispatcher_notes: format!("Emergency at {location}. {description}"),
        timestamp: now,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentRecord {
    pub incident_id: String,
    pub status: String,
    pub severity: String,
    pub notifications_sent: Vec<String>,
    pub actions_triggered: Vec<String>,
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

/// Mock safety-management API: logs an incident and fans out notifications
/// according to severity.
pub fn log_incident(incident_type: &str, severity: &str, details: Value) -> IncidentRecord {
    let now = Utc::now();

    let mut notifications = vec![
        "Safety Manager".to_string(),
        "Site Supervisor".to_string(),
    ];
    if severity == "CRITICAL" {
        notifications.push("OSHA Compliance Officer".to_string());
    }

    let actions = vec![
        if severity == "CRITICAL" {
            "Work stoppage order issued".to_string()
        } else {
            "Safety alert issued".to_string()
        },
        format!("Incident report generated for {incident_type}"),
        "Photo documentation requested".to_string(),
    ];

    IncidentRecord {
        incident_id: format!("INC-{}", now.format("%Y%m%d-%H%M%S")),
        status: "logged".to_string(),
        severity: severity.to_string(),
        notifications_sent: notifications,
        actions_triggered: actions,
        details,
        timestamp: now,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsDelivery {
    pub recipient: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsBatch {
    pub batch_id: String,
    pub total_sent: usize,
    pub urgency: String,
    pub message: String,
    pub recipients: Vec<SmsDelivery>,
    pub failed: usize,
    pub timestamp: DateTime<Utc>,
}

/// Mock SMS blast to site personnel. CRITICAL reaches everyone, HIGH reaches
/// supervisors and leads, anything else reaches management only.
pub fn send_sms_blast(message: &str, urgency: &str) -> SmsBatch {
    let now = Utc::now();

    let max_priority = match urgency {
        "CRITICAL" => 3,
        "HIGH" => 2,
        _ => 1,
    };

    let prefix = match urgency {
        "CRITICAL" => "EMERGENCY",
        "HIGH" => "URGENT",
        "MODERATE" => "ALERT",
        _ => "NOTICE",
    };

    let recipients = SITE_PERSONNEL
        .iter()
        .filter(|(_, _, priority)| *priority <= max_priority)
        .map(|(name, role, _)| SmsDelivery {
            recipient: (*name).to_string(),
            role: (*role).to_string(),
            status: "delivered".to_string(),
        })
        .collect::<Vec<_>>();

    SmsBatch {
        batch_id: format!("SMS-{}", now.format("%Y%m%d-%H%M%S")),
        total_sent: recipients.len(),
        urgency: urgency.to_string(),
        message: format!("{prefix} SITE SAFETY ALERT: {message}"),
        recipients,
        failed: 0,
        timestamp: now,
    }
}
