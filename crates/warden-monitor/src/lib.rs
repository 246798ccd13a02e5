//! # warden-monitor
//!
//! Behavioral threat detection for Warden.
//!
//! The validator judges each operation on its own. The [`ThreatMonitor`]
//! judges the *sequence*: it keeps a bounded history per agent and runs an
//! ordered battery of detectors (rapid failures, repeated blocked retries,
//! path traversal, command injection, mass deletion) after every attempt.
//!
//! High and Critical threats trigger the automatic response: a
//! `tracing::error!` signal, the agent is marked escalated, and the
//! registered [`EscalationHandler`] (if any) is invoked.

pub mod clock;
pub mod config;
pub mod detectors;
pub mod history;
pub mod monitor;
pub mod threat;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use history::AgentOperationRecord;
pub use monitor::{AgentStats, Analysis, EscalationHandler, ThreatFilter, ThreatMonitor};
pub use threat::{SecurityThreat, ThreatLevel, ThreatType};
