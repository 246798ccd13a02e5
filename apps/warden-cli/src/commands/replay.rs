// replay.rs — `warden replay`: feed a recorded operation stream through the
// gatekeeper in one process, so threat detection sees the whole sequence.
//
// Input is JSONL, one OperationRequest per line:
//   {"command": "ls -la"}
//   {"kind": "file_delete", "file_path": "src/old.rs"}
// Blank lines and lines starting with '#' are ignored.

use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use warden_gatekeeper::WardenConfig;
use warden_policy::{Operation, OperationRequest};

use super::{format_decision, open_manager};

/// Parse one input line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Operation>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let request: OperationRequest = serde_json::from_str(line)?;
    Ok(Some(request.into_operation()?))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub allowed: usize,
    pub denied: usize,
    pub threats: usize,
    pub skipped: usize,
}

pub fn execute(agent: &str, file: &Path, config: &WardenConfig) -> anyhow::Result<()> {
    let summary = replay(agent, file, config)?;
    println!(
        "\n{} allowed, {} denied, {} threat(s), {} skipped",
        summary.allowed, summary.denied, summary.threats, summary.skipped
    );
    Ok(())
}

fn replay(agent: &str, file: &Path, config: &WardenConfig) -> anyhow::Result<ReplaySummary> {
    let input = std::fs::File::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?;
    let manager = open_manager(config)?;
    let mut summary = ReplaySummary::default();

    for (idx, line) in std::io::BufReader::new(input).lines().enumerate() {
        let line_no = idx + 1;
        let operation = match parse_line(&line?) {
            Ok(Some(op)) => op,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed operation");
                summary.skipped += 1;
                continue;
            }
        };

        let decision = manager.validate_operation(agent, &operation)?;
        println!("#{:<4} {}", line_no, format_decision(&operation, &decision));
        if decision.is_allowed() {
            summary.allowed += 1;
        } else {
            summary.denied += 1;
        }
        if decision.threat.is_some() {
            summary.threats += 1;
        }
    }
    Ok(summary)
}
