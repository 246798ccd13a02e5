// history.rs — Per-agent bounded operation history.
//
// Each agent gets two ring buffers: everything it attempted, and just the
// denied attempts. Both evict oldest-first once full, so only the newest
// records influence detection.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_policy::OperationKind;

/// One attempted operation as seen by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOperationRecord {
    pub timestamp: DateTime<Utc>,
    pub operation_text: String,
    pub operation_type: OperationKind,
    pub allowed: bool,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl AgentOperationRecord {
    /// The first whitespace-separated token of the operation text.
    pub fn leading_token(&self) -> &str {
        leading_token(&self.operation_text)
    }
}

pub(crate) fn leading_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// Everything the monitor keeps for a single agent.
#[derive(Debug)]
pub(crate) struct AgentState {
    pub history: VecDeque<AgentOperationRecord>,
    pub denied: VecDeque<AgentOperationRecord>,
    history_capacity: usize,
    denied_capacity: usize,
    pub total_operations: u64,
    pub denied_operations: u64,
    pub threats_detected: u64,
    pub last_seen: Option<DateTime<Utc>>,
}

impl AgentState {
    pub fn new(history_capacity: usize, denied_capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(history_capacity.min(1024)),
            denied: VecDeque::with_capacity(denied_capacity.min(1024)),
            history_capacity,
            denied_capacity,
            total_operations: 0,
            denied_operations: 0,
            threats_detected: 0,
            last_seen: None,
        }
    }

    /// Append a record, evicting the oldest entries past capacity.
    pub fn record(&mut self, record: AgentOperationRecord) {
        self.total_operations += 1;
        self.last_seen = Some(record.timestamp);
        if !record.allowed {
            self.denied_operations += 1;
            push_bounded(&mut self.denied, record.clone(), self.denied_capacity);
        }
        push_bounded(&mut self.history, record, self.history_capacity);
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(item);
}
