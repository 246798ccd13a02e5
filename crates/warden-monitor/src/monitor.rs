// monitor.rs — ThreatMonitor: stateful pattern detection across an agent's
// recent history.
//
// Locking: the agent map is behind an RwLock that is held only long enough
// to find or insert the agent's slot. The slot's own Mutex is then held for
// the whole record-then-detect step, so different agents never contend and
// calls for one agent are analyzed in the order they acquire the slot.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use warden_policy::OperationKind;

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::detectors::{self, DetectionContext};
use crate::history::{AgentOperationRecord, AgentState};
use crate::threat::{SecurityThreat, ThreatLevel};

/// Called when a High or Critical threat is detected and auto-response is on.
///
/// Implementations might page an operator or tell the orchestrator to
/// suspend the agent. The monitor itself only marks the agent escalated.
pub trait EscalationHandler: Send + Sync {
    fn escalate(&self, threat: &SecurityThreat);
}

/// The outcome of analyzing one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub is_safe: bool,
    pub threat: Option<SecurityThreat>,
}

/// Filter for [`ThreatMonitor::detected_threats`].
#[derive(Debug, Clone, Default)]
pub struct ThreatFilter {
    pub agent_id: Option<String>,
    pub min_level: Option<ThreatLevel>,
    pub since: Option<DateTime<Utc>>,
    /// Keep only the most recent N matches.
    pub limit: Option<usize>,
}

impl ThreatFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn min_level(mut self, level: ThreatLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, threat: &SecurityThreat) -> bool {
        self.agent_id.as_deref().map_or(true, |a| threat.agent_id == a)
            && self.min_level.map_or(true, |l| threat.threat_level >= l)
            && self.since.map_or(true, |s| threat.timestamp >= s)
    }
}

/// Counters for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStats {
    pub agent_id: String,
    pub total_operations: u64,
    pub denied_operations: u64,
    pub threats_detected: u64,
    pub escalated: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

type AgentSlot = Arc<Mutex<AgentState>>;

/// Watches every agent's stream of operations for attack and failure
/// patterns.
pub struct ThreatMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    agents: RwLock<HashMap<String, AgentSlot>>,
    threats: Mutex<Vec<SecurityThreat>>,
    escalated: Mutex<HashSet<String>>,
    escalation_handler: Option<Arc<dyn EscalationHandler>>,
}

impl ThreatMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            agents: RwLock::new(HashMap::new()),
            threats: Mutex::new(Vec::new()),
            escalated: Mutex::new(HashSet::new()),
            escalation_handler: None,
        }
    }

    /// Take time from `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_escalation_handler(mut self, handler: Arc<dyn EscalationHandler>) -> Self {
        self.escalation_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Record an attempt and run the detector battery over the agent's
    /// updated history.
    ///
    /// Denied attempts must be reported too; the failure-pattern detectors
    /// only see what they are told about.
    pub fn analyze_operation(
        &self,
        agent_id: &str,
        operation_text: &str,
        allowed: bool,
        op_type: OperationKind,
        details: serde_json::Value,
    ) -> Analysis {
        let slot = self.slot(agent_id);

        let threat = {
            let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
            // Read under the lock so one agent's history stays in time order.
            let now = self.clock.now();
            let record = AgentOperationRecord {
                timestamp: now,
                operation_text: operation_text.to_string(),
                operation_type: op_type,
                allowed,
                details,
            };
            state.record(record.clone());
            let ctx = DetectionContext {
                agent_id,
                current: &record,
                state: &state,
                config: &self.config,
                now,
            };
            let threat = detectors::run(&ctx);
            if threat.is_some() {
                state.threats_detected += 1;
            }
            threat
        };

        if let Some(threat) = &threat {
            self.handle_threat(threat);
        }
        Analysis {
            is_safe: threat.is_none(),
            threat,
        }
    }

    /// Threats detected so far, oldest first.
    pub fn detected_threats(&self, filter: &ThreatFilter) -> Vec<SecurityThreat> {
        let threats = self.threats.lock().unwrap_or_else(|e| e.into_inner());
        let mut matched: Vec<SecurityThreat> =
            threats.iter().filter(|t| filter.matches(t)).cloned().collect();
        if let Some(limit) = filter.limit {
            let excess = matched.len().saturating_sub(limit);
            matched.drain(..excess);
        }
        matched
    }

    pub fn agent_stats(&self, agent_id: &str) -> Option<AgentStats> {
        let slot = self.existing_slot(agent_id)?;
        let state = slot.lock().unwrap_or_else(|e| e.into_inner());
        Some(AgentStats {
            agent_id: agent_id.to_string(),
            total_operations: state.total_operations,
            denied_operations: state.denied_operations,
            threats_detected: state.threats_detected,
            escalated: self.is_escalated(agent_id),
            last_seen: state.last_seen,
        })
    }

    /// The agent's retained history, oldest first.
    pub fn recent_history(&self, agent_id: &str) -> Vec<AgentOperationRecord> {
        match self.existing_slot(agent_id) {
            Some(slot) => {
                let state = slot.lock().unwrap_or_else(|e| e.into_inner());
                state.history.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    pub fn is_escalated(&self, agent_id: &str) -> bool {
        self.escalated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(agent_id)
    }

    /// Forget an agent's history and escalation. Its threats stay in the log.
    pub fn clear_agent(&self, agent_id: &str) {
        self.agents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(agent_id);
        self.escalated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(agent_id);
    }

    fn existing_slot(&self, agent_id: &str) -> Option<AgentSlot> {
        self.agents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(agent_id)
            .cloned()
    }

    fn slot(&self, agent_id: &str) -> AgentSlot {
        if let Some(slot) = self.existing_slot(agent_id) {
            return slot;
        }
        let mut agents = self.agents.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(agents.entry(agent_id.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(AgentState::new(
                self.config.history_capacity,
                self.config.denied_capacity,
            )))
        }))
    }

    fn handle_threat(&self, threat: &SecurityThreat) {
        tracing::warn!(
            agent_id = %threat.agent_id,
            threat_type = %threat.threat_type,
            threat_level = %threat.threat_level,
            "{}",
            threat.description
        );
        self.threats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(threat.clone());

        if !(self.config.auto_response && threat.threat_level.warrants_response()) {
            return;
        }
        tracing::error!(
            agent_id = %threat.agent_id,
            threat_id = %threat.threat_id,
            threat_type = %threat.threat_type,
            "critical security threat, escalating agent"
        );
        self.escalated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(threat.agent_id.clone());
        if let Some(handler) = &self.escalation_handler {
            handler.escalate(threat);
        }
    }
}

impl Default for ThreatMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl std::fmt::Debug for ThreatMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreatMonitor")
            .field("config", &self.config)
            .field("has_escalation_handler", &self.escalation_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::threat::ThreatType;
    use chrono::Duration;

    fn fixed_monitor(config: MonitorConfig) -> (ThreatMonitor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let monitor = ThreatMonitor::new(config).with_clock(clock.clone());
        (monitor, clock)
    }

    fn deny(monitor: &ThreatMonitor, agent: &str, text: &str) -> Analysis {
        monitor.analyze_operation(agent, text, false, OperationKind::Command, serde_json::Value::Null)
    }

    fn allow(monitor: &ThreatMonitor, agent: &str, text: &str, kind: OperationKind) -> Analysis {
        monitor.analyze_operation(agent, text, true, kind, serde_json::Value::Null)
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ThreatType>>);

    impl EscalationHandler for Recorder {
        fn escalate(&self, threat: &SecurityThreat) {
            self.0.lock().unwrap().push(threat.threat_type);
        }
    }

    #[test]
    fn oversized_window_covers_all_history() {
        let config = MonitorConfig {
            window_secs: u64::MAX,
            ..MonitorConfig::default()
        };
        let (monitor, clock) = fixed_monitor(config);
        for i in 1..5 {
            assert!(deny(&monitor, "a", &format!("tool{} --flag", i)).is_safe);
            clock.advance(Duration::days(365));
        }
        let threat = deny(&monitor, "a", "tool5 --flag").threat.unwrap();
        assert_eq!(threat.threat_type, ThreatType::RapidFailedOperations);

        let config = MonitorConfig {
            window_secs: 100_000_000_000_000_000,
            ..MonitorConfig::default()
        };
        let (monitor, _) = fixed_monitor(config);
        assert!(allow(&monitor, "a", "ls", OperationKind::Command).is_safe);
    }

    #[test]
    fn history_timestamps_are_ordered_under_contention() {
        // Every read returns a later instant than the one before.
        struct TickingClock(std::sync::atomic::AtomicI64);
        impl Clock for TickingClock {
            fn now(&self) -> DateTime<Utc> {
                let tick = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(tick)
            }
        }

        let monitor = Arc::new(
            ThreatMonitor::new(MonitorConfig {
                history_capacity: 10_000,
                ..MonitorConfig::default()
            })
            .with_clock(Arc::new(TickingClock(Default::default()))),
        );
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let monitor = monitor.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        allow(&monitor, "shared", &format!("echo {} {}", t, i), OperationKind::Command);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = monitor.recent_history("shared");
        assert_eq!(history.len(), 400);
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn benign_operations_are_safe() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        let analysis = allow(&monitor, "a", "ls -la", OperationKind::Command);
        assert!(analysis.is_safe);
        assert!(analysis.threat.is_none());
        assert_eq!(monitor.recent_history("a").len(), 1);
    }

    #[test]
    fn rapid_failures_are_medium() {
        let (monitor, clock) = fixed_monitor(MonitorConfig::default());
        for i in 1..5 {
            assert!(deny(&monitor, "a", &format!("tool{} --flag", i)).is_safe);
            clock.advance(Duration::seconds(1));
        }
        let analysis = deny(&monitor, "a", "tool5 --flag");
        let threat = analysis.threat.unwrap();
        assert_eq!(threat.threat_type, ThreatType::RapidFailedOperations);
        assert_eq!(threat.threat_level, ThreatLevel::Medium);
        // Medium does not escalate.
        assert!(!monitor.is_escalated("a"));
    }

    #[test]
    fn failures_outside_the_window_do_not_count() {
        let (monitor, clock) = fixed_monitor(MonitorConfig::default());
        for i in 1..=10 {
            assert!(deny(&monitor, "a", &format!("tool{} --flag", i)).is_safe);
            clock.advance(Duration::seconds(61));
        }
    }

    #[test]
    fn repeated_similar_denials_are_high_and_escalate() {
        let recorder = Arc::new(Recorder::default());
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        let monitor = monitor.with_escalation_handler(recorder.clone());

        assert!(deny(&monitor, "a", "rm -rf /tmp/a").is_safe);
        assert!(deny(&monitor, "a", "rm -rf /tmp/b").is_safe);
        let threat = deny(&monitor, "a", "rm -rf /tmp/c").threat.unwrap();

        assert_eq!(threat.threat_type, ThreatType::RepeatedBlockedOperations);
        assert_eq!(threat.threat_level, ThreatLevel::High);
        assert!(monitor.is_escalated("a"));
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![ThreatType::RepeatedBlockedOperations]
        );
    }

    #[test]
    fn allowed_attempt_is_not_a_repeat() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        deny(&monitor, "a", "make deploy-a");
        deny(&monitor, "a", "make deploy-b");
        deny(&monitor, "a", "make deploy-c");
        let analysis = allow(&monitor, "a", "make deploy-d", OperationKind::Command);
        assert!(analysis.is_safe);
    }

    #[test]
    fn path_traversal_is_high() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        let threat = allow(&monitor, "a", "cat ../../etc/passwd", OperationKind::Command)
            .threat
            .unwrap();
        assert_eq!(threat.threat_type, ThreatType::PathTraversalAttempt);
        assert_eq!(threat.threat_level, ThreatLevel::High);
        assert_eq!(threat.details["signature"], "../");
    }

    #[test]
    fn command_injection_is_critical() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        let threat = allow(&monitor, "a", "echo $(whoami)", OperationKind::Command)
            .threat
            .unwrap();
        assert_eq!(threat.threat_type, ThreatType::CommandInjection);
        assert_eq!(threat.threat_level, ThreatLevel::Critical);
        assert!(monitor.is_escalated("a"));
    }

    #[test]
    fn mass_deletion_is_critical() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        for i in 1..5 {
            let a = allow(&monitor, "a", &format!("src/f{}.txt", i), OperationKind::FileDelete);
            assert!(a.is_safe);
        }
        let threat = allow(&monitor, "a", "src/f5.txt", OperationKind::FileDelete)
            .threat
            .unwrap();
        assert_eq!(threat.threat_type, ThreatType::MassDeletion);
        assert_eq!(threat.threat_level, ThreatLevel::Critical);
    }

    #[test]
    fn delete_commands_count_toward_mass_deletion() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        for name in ["a", "b", "c", "d"] {
            allow(&monitor, "x", &format!("unlink build/{}.o", name), OperationKind::Command);
        }
        let threat = allow(&monitor, "x", "shred notes.txt", OperationKind::Command)
            .threat
            .unwrap();
        assert_eq!(threat.threat_type, ThreatType::MassDeletion);
    }

    #[test]
    fn auto_response_can_be_disabled() {
        let config = MonitorConfig {
            auto_response: false,
            ..MonitorConfig::default()
        };
        let (monitor, _) = fixed_monitor(config);
        let analysis = allow(&monitor, "a", "echo `id`", OperationKind::Command);
        assert!(!analysis.is_safe);
        assert!(!monitor.is_escalated("a"));
    }

    #[test]
    fn agents_are_isolated() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        for i in 0..4 {
            deny(&monitor, "a", &format!("tool{} x", i));
        }
        assert!(deny(&monitor, "b", "tool9 x").is_safe);
        assert_eq!(monitor.agent_stats("a").unwrap().denied_operations, 4);
        assert_eq!(monitor.agent_stats("b").unwrap().denied_operations, 1);
        assert!(monitor.agent_stats("c").is_none());
    }

    #[test]
    fn history_is_bounded() {
        let config = MonitorConfig {
            history_capacity: 3,
            ..MonitorConfig::default()
        };
        let (monitor, _) = fixed_monitor(config);
        for i in 0..10 {
            allow(&monitor, "a", &format!("echo {}", i), OperationKind::Command);
        }
        let history = monitor.recent_history("a");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].operation_text, "echo 7");
        assert_eq!(monitor.agent_stats("a").unwrap().total_operations, 10);
    }

    #[test]
    fn replay_under_fixed_clock_is_deterministic() {
        let sequence = ["ls", "rm -rf a", "cat x", "rm -rf b", "rm -rf c", "pwd"];
        let start = Utc::now();

        let run = || {
            let clock = Arc::new(ManualClock::new(start));
            let monitor = ThreatMonitor::default().with_clock(clock.clone());
            sequence
                .iter()
                .position(|text| {
                    clock.advance(Duration::seconds(2));
                    let allowed = !text.starts_with("rm");
                    let analysis = monitor.analyze_operation(
                        "a",
                        text,
                        allowed,
                        OperationKind::Command,
                        serde_json::Value::Null,
                    );
                    !analysis.is_safe
                })
        };

        let first = run();
        assert_eq!(first, Some(4));
        assert_eq!(first, run());
    }

    #[test]
    fn threat_filter_selects_by_agent_level_and_limit() {
        let (monitor, clock) = fixed_monitor(MonitorConfig::default());
        allow(&monitor, "a", "cat ../x", OperationKind::Command);
        clock.advance(Duration::seconds(1));
        allow(&monitor, "b", "echo $(id)", OperationKind::Command);
        clock.advance(Duration::seconds(1));
        allow(&monitor, "a", "echo `id`", OperationKind::Command);

        assert_eq!(monitor.detected_threats(&ThreatFilter::new()).len(), 3);
        assert_eq!(monitor.detected_threats(&ThreatFilter::new().agent("a")).len(), 2);

        let critical = monitor.detected_threats(&ThreatFilter::new().min_level(ThreatLevel::Critical));
        assert_eq!(critical.len(), 2);

        let latest = monitor.detected_threats(&ThreatFilter::new().limit(1));
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].agent_id, "a");
        assert_eq!(latest[0].threat_type, ThreatType::CommandInjection);
    }

    #[test]
    fn clear_agent_resets_state_but_keeps_threat_log() {
        let (monitor, _) = fixed_monitor(MonitorConfig::default());
        allow(&monitor, "a", "echo $(id)", OperationKind::Command);
        assert!(monitor.is_escalated("a"));

        monitor.clear_agent("a");
        assert!(!monitor.is_escalated("a"));
        assert!(monitor.recent_history("a").is_empty());
        assert_eq!(monitor.detected_threats(&ThreatFilter::new()).len(), 1);
    }

    #[test]
    fn concurrent_agents_do_not_interfere() {
        let monitor = Arc::new(ThreatMonitor::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let monitor = Arc::clone(&monitor);
                std::thread::spawn(move || {
                    let agent = format!("agent-{}", t);
                    for i in 0..50 {
                        monitor.analyze_operation(
                            &agent,
                            &format!("echo {}", i),
                            true,
                            OperationKind::Command,
                            serde_json::Value::Null,
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for t in 0..8 {
            let stats = monitor.agent_stats(&format!("agent-{}", t)).unwrap();
            assert_eq!(stats.total_operations, 50);
            assert_eq!(stats.threats_detected, 0);
        }
    }
}
