// threat.rs — Threat levels and detected-threat records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How dangerous a detected pattern is. Ordered: `Low < ... < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Whether this level triggers the automatic response.
    pub fn warrants_response(&self) -> bool {
        *self >= ThreatLevel::High
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Which detector produced a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    RapidFailedOperations,
    RepeatedBlockedOperations,
    PathTraversalAttempt,
    CommandInjection,
    MassDeletion,
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreatType::RapidFailedOperations => "rapid_failed_operations",
            ThreatType::RepeatedBlockedOperations => "repeated_blocked_operations",
            ThreatType::PathTraversalAttempt => "path_traversal_attempt",
            ThreatType::CommandInjection => "command_injection",
            ThreatType::MassDeletion => "mass_deletion",
        };
        f.write_str(name)
    }
}

/// One detection. Created once, appended to the monitor's threat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityThreat {
    pub threat_id: Uuid,
    pub threat_type: ThreatType,
    pub threat_level: ThreatLevel,
    pub description: String,
    pub agent_id: String,
    /// The operation text that triggered detection.
    pub operation: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl SecurityThreat {
    pub(crate) fn new(
        threat_type: ThreatType,
        threat_level: ThreatLevel,
        description: impl Into<String>,
        agent_id: &str,
        operation: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            threat_id: Uuid::new_v4(),
            threat_type,
            threat_level,
            description: description.into(),
            agent_id: agent_id.to_string(),
            operation: operation.to_string(),
            timestamp,
            details: serde_json::Map::new(),
        }
    }

    pub(crate) fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
        assert!(!ThreatLevel::Medium.warrants_response());
        assert!(ThreatLevel::High.warrants_response());
        assert!(ThreatLevel::Critical.warrants_response());
    }

    #[test]
    fn threat_serializes_with_snake_case_tags() {
        let threat = SecurityThreat::new(
            ThreatType::MassDeletion,
            ThreatLevel::Critical,
            "many deletes",
            "agent-1",
            "rm a",
            Utc::now(),
        )
        .with_detail("count", 5);
        let json = serde_json::to_value(&threat).unwrap();
        assert_eq!(json["threat_type"], "mass_deletion");
        assert_eq!(json["threat_level"], "critical");
        assert_eq!(json["details"]["count"], 5);
    }
}
