// config.rs — Threat monitor tuning, loaded from the `[monitor]` section.

use serde::{Deserialize, Serialize};

/// Detector thresholds and buffer sizes.
///
/// Every field has a serde default, so an empty `[monitor]` table (or no
/// table at all) yields the standard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Records kept per agent (all attempts).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Denied records kept per agent.
    #[serde(default = "default_denied_capacity")]
    pub denied_capacity: usize,

    /// Sliding window for the rate-based detectors, in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Denials within the window that count as rapid failure.
    #[serde(default = "default_rapid_failure_threshold")]
    pub rapid_failure_threshold: usize,

    /// Similar recent denials that count as a repeated-block pattern.
    #[serde(default = "default_repeated_block_threshold")]
    pub repeated_block_threshold: usize,

    /// How many recent denials to compare against for similarity.
    #[serde(default = "default_similarity_lookback")]
    pub similarity_lookback: usize,

    /// Deletions within the window that count as mass deletion.
    #[serde(default = "default_mass_deletion_threshold")]
    pub mass_deletion_threshold: usize,

    /// Escalate on High/Critical threats.
    #[serde(default = "default_auto_response")]
    pub auto_response: bool,
}

fn default_history_capacity() -> usize {
    100
}

fn default_denied_capacity() -> usize {
    50
}

fn default_window_secs() -> u64 {
    60
}

fn default_rapid_failure_threshold() -> usize {
    5
}

fn default_repeated_block_threshold() -> usize {
    3
}

fn default_similarity_lookback() -> usize {
    10
}

fn default_mass_deletion_threshold() -> usize {
    5
}

fn default_auto_response() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            denied_capacity: default_denied_capacity(),
            window_secs: default_window_secs(),
            rapid_failure_threshold: default_rapid_failure_threshold(),
            repeated_block_threshold: default_repeated_block_threshold(),
            similarity_lookback: default_similarity_lookback(),
            mass_deletion_threshold: default_mass_deletion_threshold(),
            auto_response: default_auto_response(),
        }
    }
}
