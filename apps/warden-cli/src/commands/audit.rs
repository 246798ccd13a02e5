// audit.rs — Audit subcommands: tail, query, verify.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use warden_audit::{read_filtered, verify_chain, AuditEntry, AuditError, AuditEventType, AuditQuery};
use warden_gatekeeper::WardenConfig;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show the most recent entries.
    Tail {
        /// Number of entries to show.
        #[arg(short, default_value = "10")]
        n: usize,
    },
    /// Filter entries by agent, event type, and time range.
    Query {
        #[arg(long)]
        agent: Option<String>,
        /// Event type, e.g. operation_blocked or security_violation.
        #[arg(long)]
        event: Option<AuditEventType>,
        /// RFC 3339 lower bound, inclusive.
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// RFC 3339 upper bound, inclusive.
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        /// Return at most this many entries (oldest first).
        #[arg(long)]
        limit: Option<usize>,
        /// Print raw JSON lines instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Verify the keyed hash chain.
    Verify,
}

pub fn execute(cmd: &AuditCommands, config: &WardenConfig) -> anyhow::Result<()> {
    let path = &config.audit.log_path;
    if !path.exists() {
        println!("No audit log found at {}", path.display());
        return Ok(());
    }

    match cmd {
        AuditCommands::Tail { n } => {
            let result = read_filtered(path, &AuditQuery::new())?;
            let start = result.entries.len().saturating_sub(*n);
            print_table(&result.entries[start..]);
        }

        AuditCommands::Query {
            agent,
            event,
            since,
            until,
            limit,
            json,
        } => {
            let query = AuditQuery {
                start: *since,
                end: *until,
                agent_id: agent.clone(),
                event_type: *event,
                limit: *limit,
            };
            let result = read_filtered(path, &query)?;
            if *json {
                for entry in &result.entries {
                    println!("{}", serde_json::to_string(entry)?);
                }
            } else {
                print_table(&result.entries);
            }
            if result.skipped > 0 {
                eprintln!("({} malformed line(s) skipped)", result.skipped);
            }
        }

        AuditCommands::Verify => {
            let key = config.master_key()?;
            match verify_chain(path, Some(key.as_slice())) {
                Ok(count) => {
                    println!("Audit log verified: {} entries, hash chain intact.", count);
                }
                Err(AuditError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    println!();
                    println!("The audit log may have been tampered with.");
                    anyhow::bail!("Audit log integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn print_table(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries.");
        return;
    }
    println!(
        "{:<20} {:<9} {:<20} {:<12} OPERATION",
        "TIMESTAMP", "SEVERITY", "EVENT", "AGENT"
    );
    println!("{}", "-".repeat(90));
    for entry in entries {
        println!(
            "{:<20} {:<9} {:<20} {:<12} {} -> {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.severity.to_string(),
            entry.event_type.to_string(),
            entry.agent_id,
            entry.operation,
            entry.result,
        );
    }
}
