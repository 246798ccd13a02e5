// detectors.rs — The ordered detector battery.
//
// Each detector looks at the agent's state *after* the current record has
// been appended and either returns a threat or passes. `run` returns the
// first hit in a fixed order, so one call produces at most one threat.

use chrono::{DateTime, Duration, Utc};

use crate::config::MonitorConfig;
use crate::history::{leading_token, AgentOperationRecord, AgentState};
use crate::threat::{SecurityThreat, ThreatLevel, ThreatType};

/// Substrings that indicate an attempt to escape the project tree or read
/// credentials. Matched case-insensitively.
pub const PATH_TRAVERSAL_SIGNATURES: &[&str] = &[
    "../",
    "..\\",
    "%2e%2e",
    "/etc/passwd",
    "/etc/shadow",
    "/etc/sudoers",
    ".ssh/id_",
    "/proc/self/",
];

/// Substrings that indicate chained or smuggled shell execution.
pub const COMMAND_INJECTION_SIGNATURES: &[&str] = &[
    "; rm ",
    "&& rm ",
    "| sh",
    "| bash",
    "`",
    "$(",
    "> /dev/",
    "| nc ",
];

/// Leading tokens that make a command count as a deletion.
pub const DELETE_COMMANDS: &[&str] = &["rm", "rmdir", "unlink", "del", "shred"];

/// Maximum relative length difference for two operations to be "similar".
const SIMILARITY_LENGTH_RATIO: f64 = 0.3;

pub(crate) struct DetectionContext<'a> {
    pub agent_id: &'a str,
    pub current: &'a AgentOperationRecord,
    pub state: &'a AgentState,
    pub config: &'a MonitorConfig,
    pub now: DateTime<Utc>,
}

impl DetectionContext<'_> {
    /// Oldest timestamp still inside the window. A window reaching past
    /// the start of representable time covers everything.
    fn window_start(&self) -> DateTime<Utc> {
        i64::try_from(self.config.window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|window| self.now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn threat(
        &self,
        threat_type: ThreatType,
        level: ThreatLevel,
        description: impl Into<String>,
    ) -> SecurityThreat {
        SecurityThreat::new(
            threat_type,
            level,
            description,
            self.agent_id,
            &self.current.operation_text,
            self.now,
        )
    }
}

/// Run every detector in order and return the first threat found.
pub(crate) fn run(ctx: &DetectionContext<'_>) -> Option<SecurityThreat> {
    rapid_failed_operations(ctx)
        .or_else(|| repeated_blocked_operations(ctx))
        .or_else(|| path_traversal_attempt(ctx))
        .or_else(|| command_injection(ctx))
        .or_else(|| mass_deletion(ctx))
}

fn rapid_failed_operations(ctx: &DetectionContext<'_>) -> Option<SecurityThreat> {
    let since = ctx.window_start();
    let count = ctx
        .state
        .denied
        .iter()
        .filter(|r| r.timestamp >= since)
        .count();
    if count < ctx.config.rapid_failure_threshold {
        return None;
    }
    Some(
        ctx.threat(
            ThreatType::RapidFailedOperations,
            ThreatLevel::Medium,
            format!(
                "{} denied operations within {}s",
                count, ctx.config.window_secs
            ),
        )
        .with_detail("denied_in_window", count)
        .with_detail("window_secs", ctx.config.window_secs),
    )
}

/// Only a denied attempt can be a repeat of earlier denials.
fn repeated_blocked_operations(ctx: &DetectionContext<'_>) -> Option<SecurityThreat> {
    if ctx.current.allowed {
        return None;
    }
    let count = ctx
        .state
        .denied
        .iter()
        .rev()
        .take(ctx.config.similarity_lookback)
        .filter(|r| is_similar(&r.operation_text, &ctx.current.operation_text))
        .count();
    if count < ctx.config.repeated_block_threshold {
        return None;
    }
    Some(
        ctx.threat(
            ThreatType::RepeatedBlockedOperations,
            ThreatLevel::High,
            format!("{} similar blocked operations retried", count),
        )
        .with_detail("similar_count", count)
        .with_detail("lookback", ctx.config.similarity_lookback),
    )
}

fn path_traversal_attempt(ctx: &DetectionContext<'_>) -> Option<SecurityThreat> {
    let signature = find_signature(&ctx.current.operation_text, PATH_TRAVERSAL_SIGNATURES)?;
    Some(
        ctx.threat(
            ThreatType::PathTraversalAttempt,
            ThreatLevel::High,
            format!("path traversal signature '{}'", signature),
        )
        .with_detail("signature", signature),
    )
}

fn command_injection(ctx: &DetectionContext<'_>) -> Option<SecurityThreat> {
    let signature = find_signature(&ctx.current.operation_text, COMMAND_INJECTION_SIGNATURES)?;
    Some(
        ctx.threat(
            ThreatType::CommandInjection,
            ThreatLevel::Critical,
            format!("command injection signature '{}'", signature),
        )
        .with_detail("signature", signature),
    )
}

fn mass_deletion(ctx: &DetectionContext<'_>) -> Option<SecurityThreat> {
    if !is_delete_like(ctx.current) {
        return None;
    }
    let since = ctx.window_start();
    let count = ctx
        .state
        .history
        .iter()
        .filter(|r| r.timestamp >= since && is_delete_like(r))
        .count();
    if count < ctx.config.mass_deletion_threshold {
        return None;
    }
    Some(
        ctx.threat(
            ThreatType::MassDeletion,
            ThreatLevel::Critical,
            format!(
                "{} deletions within {}s",
                count, ctx.config.window_secs
            ),
        )
        .with_detail("deletions_in_window", count)
        .with_detail("window_secs", ctx.config.window_secs),
    )
}

/// Coarse similarity: same leading token and lengths within 30% of each
/// other. Catches an agent retrying a blocked command with small tweaks.
pub fn is_similar(a: &str, b: &str) -> bool {
    let (ta, tb) = (leading_token(a), leading_token(b));
    if ta.is_empty() || ta != tb {
        return false;
    }
    let (la, lb) = (a.chars().count(), b.chars().count());
    let longest = la.max(lb);
    if longest == 0 {
        return true;
    }
    (la.abs_diff(lb) as f64) <= SIMILARITY_LENGTH_RATIO * longest as f64
}

fn is_delete_like(record: &AgentOperationRecord) -> bool {
    record.operation_type.is_delete() || DELETE_COMMANDS.contains(&record.leading_token())
}

fn find_signature(text: &str, signatures: &[&'static str]) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    signatures.iter().copied().find(|sig| lowered.contains(sig))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_requires_same_leading_token() {
        assert!(is_similar("rm -rf /tmp/a", "rm -rf /tmp/b"));
        assert!(!is_similar("rm -rf /tmp/a", "ls -rf /tmp/a"));
        assert!(!is_similar("", ""));
    }

    #[test]
    fn similarity_bounds_length_difference() {
        // 10 vs 13 chars: diff 3 <= 0.3 * 13
        assert!(is_similar("cat aaaaaa", "cat aaaaaaaaa"));
        // 10 vs 20 chars: diff 10 > 0.3 * 20
        assert!(!is_similar("cat aaaaaa", "cat aaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn signatures_match_case_insensitively() {
        assert_eq!(
            find_signature("GET /%2E%2E/secret", PATH_TRAVERSAL_SIGNATURES),
            Some("%2e%2e")
        );
        assert_eq!(
            find_signature("echo $(whoami)", COMMAND_INJECTION_SIGNATURES),
            Some("$(")
        );
        assert_eq!(find_signature("ls -la", COMMAND_INJECTION_SIGNATURES), None);
    }
}
