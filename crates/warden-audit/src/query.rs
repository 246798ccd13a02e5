// query.rs — Filtered reads over the audit log.
//
// Queries stream the file line by line and never hold the writer lock, so a
// slow reader cannot stall the gatekeeper. A line that fails to parse is
// counted and skipped rather than failing the whole query; strict parsing
// belongs to `verify_chain`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::entry::{AuditEntry, AuditEventType};
use crate::error::AuditError;

/// Filter for reading entries back out of the log.
///
/// All fields are optional; an empty query matches every entry.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Inclusive lower bound on `timestamp`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end: Option<DateTime<Utc>>,
    pub agent_id: Option<String>,
    pub event_type: Option<AuditEventType>,
    /// Stop after this many matches (oldest first).
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn event_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether a single entry passes every filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }
        if let Some(agent_id) = &self.agent_id {
            if &entry.agent_id != agent_id {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if entry.event_type != event_type {
                return false;
            }
        }
        true
    }
}

/// Entries matching a query, plus how many unreadable lines were skipped.
#[derive(Debug, Clone, Default)]
pub struct AuditQueryResult {
    pub entries: Vec<AuditEntry>,
    pub skipped: usize,
}

/// Read entries from `path` that match `query`, in file order.
///
/// A missing log file is an empty result, not an error.
pub fn read_filtered(
    path: impl AsRef<Path>,
    query: &AuditQuery,
) -> Result<AuditQueryResult, AuditError> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AuditQueryResult::default());
        }
        Err(source) => {
            return Err(AuditError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut result = AuditQueryResult::default();
    if query.limit == Some(0) {
        return Ok(result);
    }

    for line in raw_lines(BufReader::new(file)) {
        let line = line.map_err(|source| AuditError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let body = strip_line_ending(&line);
        if is_blank(body) {
            continue;
        }
        let entry: AuditEntry = match std::str::from_utf8(body)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(text).map_err(|e| e.to_string()))
        {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed audit line");
                result.skipped += 1;
                continue;
            }
        };
        if !query.matches(&entry) {
            continue;
        }
        result.entries.push(entry);
        if query.limit.is_some_and(|limit| result.entries.len() >= limit) {
            break;
        }
    }

    Ok(result)
}

/// Raw lines of a log, each with its `\n` if it had one. Bytes, not
/// `String`s: one corrupt line must not stop the reader.
pub(crate) fn raw_lines<R: BufRead>(mut reader: R) -> impl Iterator<Item = io::Result<Vec<u8>>> {
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(buf)),
            Err(e) => {
                done = true;
                Some(Err(e))
            }
        }
    })
}

pub(crate) fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

pub(crate) fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
