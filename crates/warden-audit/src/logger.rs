// logger.rs — Append-only JSONL audit logger.
//
// The audit log is stored as a JSONL (JSON Lines) file: one JSON object per
// line. Each entry is linked to the previous line via `previous_hash`,
// forming a hash chain, so inserting, deleting, or modifying entries can be
// detected by `verify_chain`.
//
// The logger is shared by every caller of the gatekeeper, so appends go
// through a Mutex: computing the link, writing the line, and updating the
// chain state happen as one step and lines never interleave.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;

use crate::entry::{AuditEntry, AuditEventType, AuditSeverity};
use crate::error::AuditError;
use crate::hasher::ChainHasher;
use crate::query::{
    is_blank, raw_lines, read_filtered, strip_line_ending, AuditQuery, AuditQueryResult,
};

/// Captured command output longer than this many characters is truncated.
pub const MAX_OUTPUT_CHARS: usize = 1000;

struct WriterState {
    writer: BufWriter<File>,
    /// The raw text of the last line written, hashed into the next entry's
    /// `previous_hash`. Keeping the line rather than its hash lets the chain
    /// key be set after the file is opened.
    last_line: Option<String>,
}

/// A thread-safe, append-only audit logger backed by a JSONL file.
///
/// In Rust, `&self` methods on a type holding a `Mutex` can be called from
/// many threads at once through an `Arc<AuditLogger>`.
pub struct AuditLogger {
    path: PathBuf,
    hasher: ChainHasher,
    console_mirror: bool,
    state: Mutex<WriterState>,
}

impl AuditLogger {
    /// Open (or create) an audit log at the given path.
    ///
    /// Parent directories are created as needed. If the file already has
    /// content, the last complete line is recovered so new entries chain
    /// onto it. A trailing partial line (a write cut short by a crash) is
    /// closed off with a newline and is not part of the chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| AuditError::OpenFailed {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(open_err)?;
            }
        }

        let tail = if path.exists() {
            read_tail(&path)?
        } else {
            LogTail::default()
        };

        // Append mode: existing data is never overwritten.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;
        if tail.partial {
            tracing::warn!(path = %path.display(), "audit log ends with a partial line");
            file.write_all(b"\n").map_err(open_err)?;
        }
        let last_line = tail.last_line;

        Ok(Self {
            path,
            hasher: ChainHasher::unkeyed(),
            console_mirror: true,
            state: Mutex::new(WriterState {
                writer: BufWriter::new(file),
                last_line,
            }),
        })
    }

    /// Link entries with HMAC-SHA256 under `key` instead of plain SHA-256.
    pub fn with_chain_key(mut self, key: &[u8]) -> Self {
        self.hasher = ChainHasher::keyed(key);
        self
    }

    /// Mirror every entry to `tracing` at a level matching its severity.
    pub fn with_console_mirror(mut self, enabled: bool) -> Self {
        self.console_mirror = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a fully-built entry, filling in its `previous_hash`.
    ///
    /// Returns the entry as written.
    pub fn append(&self, mut entry: AuditEntry) -> Result<AuditEntry, AuditError> {
        {
            let mut state = self.state.lock().map_err(|_| AuditError::LockPoisoned)?;
            entry.previous_hash = state.last_line.as_deref().map(|l| self.hasher.link(l));

            // Single JSON line, no pretty-printing.
            let json = serde_json::to_string(&entry)?;
            writeln!(state.writer, "{}", json)?;
            state.writer.flush()?;
            state.last_line = Some(json);
        }

        if self.console_mirror {
            mirror(&entry);
        }
        Ok(entry)
    }

    /// Record an arbitrary event.
    pub fn log_event(
        &self,
        event_type: AuditEventType,
        agent_id: &str,
        operation: &str,
        result: &str,
        details: serde_json::Value,
        severity: AuditSeverity,
    ) -> Result<AuditEntry, AuditError> {
        self.append(
            AuditEntry::new(event_type, agent_id, operation, result)
                .with_severity(severity)
                .with_details(details),
        )
    }

    /// Record the terminal allow/deny decision for an operation.
    ///
    /// Allowed operations are logged at `Info`, blocked ones at `Warning`.
    pub fn log_operation(
        &self,
        agent_id: &str,
        operation: &str,
        allowed: bool,
        reason: &str,
        details: serde_json::Value,
    ) -> Result<AuditEntry, AuditError> {
        let (event_type, severity) = if allowed {
            (AuditEventType::OperationAllowed, AuditSeverity::Info)
        } else {
            (AuditEventType::OperationBlocked, AuditSeverity::Warning)
        };
        self.append(
            AuditEntry::new(event_type, agent_id, operation, reason)
                .with_severity(severity)
                .with_allowed(allowed)
                .with_details(details),
        )
    }

    /// Record why an operation was blocked.
    ///
    /// Severity is `Critical` when `details` carries a `threat` object (a
    /// detected attack pattern) and `Error` for plain policy violations.
    pub fn log_security_violation(
        &self,
        agent_id: &str,
        operation: &str,
        violation: &str,
        details: serde_json::Value,
    ) -> Result<AuditEntry, AuditError> {
        let severity = if details.get("threat").is_some_and(|t| !t.is_null()) {
            AuditSeverity::Critical
        } else {
            AuditSeverity::Error
        };
        self.append(
            AuditEntry::new(AuditEventType::SecurityViolation, agent_id, operation, violation)
                .with_severity(severity)
                .with_allowed(false)
                .with_details(details),
        )
    }

    /// Record a command's outcome. Output is truncated to
    /// [`MAX_OUTPUT_CHARS`] characters per stream.
    ///
    /// `exit_code` is `None` when the process was killed (timeout or signal).
    pub fn log_command_execution(
        &self,
        agent_id: &str,
        command: &str,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
        duration: Duration,
    ) -> Result<AuditEntry, AuditError> {
        let (result, severity) = match exit_code {
            Some(0) => ("exit 0".to_string(), AuditSeverity::Info),
            Some(code) => (format!("exit {}", code), AuditSeverity::Warning),
            None => ("killed".to_string(), AuditSeverity::Warning),
        };
        let details = json!({
            "exit_code": exit_code,
            "stdout": truncate_output(stdout, MAX_OUTPUT_CHARS),
            "stderr": truncate_output(stderr, MAX_OUTPUT_CHARS),
            "duration_ms": duration.as_millis() as u64,
        });
        self.log_event(
            AuditEventType::CommandExecution,
            agent_id,
            command,
            &result,
            details,
            severity,
        )
    }

    /// Read entries matching `query` from this logger's file.
    pub fn query(&self, query: &AuditQuery) -> Result<AuditQueryResult, AuditError> {
        read_filtered(&self.path, query)
    }

    /// Verify this logger's own file with its own chain key.
    pub fn verify(&self) -> Result<usize, AuditError> {
        verify_with(&self.path, &self.hasher)
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("path", &self.path)
            .field("hasher", &self.hasher)
            .field("console_mirror", &self.console_mirror)
            .finish()
    }
}

/// Verify the hash chain of a log file.
///
/// Every entry's `previous_hash` must equal the link of the preceding raw
/// line (HMAC under `key` when given). Returns the number of entries
/// checked, or an `IntegrityViolation` naming the first broken line.
pub fn verify_chain(path: impl AsRef<Path>, key: Option<&[u8]>) -> Result<usize, AuditError> {
    let hasher = match key {
        Some(key) => ChainHasher::keyed(key),
        None => ChainHasher::unkeyed(),
    };
    verify_with(path.as_ref(), &hasher)
}

fn verify_with(path: &Path, hasher: &ChainHasher) -> Result<usize, AuditError> {
    let file = File::open(path).map_err(|source| AuditError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut previous: Option<String> = None;
    let mut count = 0;

    for (line_num, line) in raw_lines(BufReader::new(file)).enumerate() {
        let line = line.map_err(|source| AuditError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let body = strip_line_ending(&line);
        if is_blank(body) {
            continue;
        }
        let line = std::str::from_utf8(body)
            .map_err(|_| AuditError::InvalidUtf8 { line: line_num + 1 })?;
        let entry: AuditEntry = serde_json::from_str(line)?;
        if entry.previous_hash != previous {
            return Err(AuditError::IntegrityViolation {
                line: line_num + 1,
                expected: previous.unwrap_or_else(|| "None".to_string()),
                actual: entry.previous_hash.unwrap_or_else(|| "None".to_string()),
            });
        }
        // Hash the raw line, not a re-serialization, which could reorder fields.
        previous = Some(hasher.link(line));
        count += 1;
    }

    Ok(count)
}

/// Truncate `text` to `max` characters, noting how much was dropped.
pub fn truncate_output(text: &str, max: usize) -> String {
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max).collect();
    format!("{}... [truncated {} chars]", kept, total - max)
}

#[derive(Default)]
struct LogTail {
    last_line: Option<String>,
    /// The file does not end in a newline.
    partial: bool,
}

fn read_tail(path: &Path) -> Result<LogTail, AuditError> {
    let file = File::open(path).map_err(|source| AuditError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tail = LogTail::default();
    for line in raw_lines(BufReader::new(file)) {
        let line = line.map_err(|source| AuditError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        if !line.ends_with(b"\n") {
            tail.partial = true;
            break;
        }
        let body = strip_line_ending(&line);
        if !is_blank(body) {
            tail.last_line = Some(String::from_utf8_lossy(body).into_owned());
        }
    }
    Ok(tail)
}

fn mirror(entry: &AuditEntry) {
    match entry.severity {
        AuditSeverity::Info => tracing::info!(
            event = %entry.event_type,
            agent_id = %entry.agent_id,
            result = %entry.result,
            "{}",
            entry.operation
        ),
        AuditSeverity::Warning => tracing::warn!(
            event = %entry.event_type,
            agent_id = %entry.agent_id,
            result = %entry.result,
            "{}",
            entry.operation
        ),
        AuditSeverity::Error | AuditSeverity::Critical => tracing::error!(
            event = %entry.event_type,
            agent_id = %entry.agent_id,
            severity = %entry.severity,
            result = %entry.result,
            "{}",
            entry.operation
        ),
    }
}
