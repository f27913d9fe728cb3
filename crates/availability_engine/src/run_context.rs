use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// One upstream call, recorded whatever its outcome
#[derive(Debug, Clone, Serialize)]
pub struct CallLogEntry {
    /// What the call was for (e.g. "availability 2025-07")
    pub context: String,
    /// Full request URL, query string included
    pub url: String,
    /// HTTP status, absent when no response arrived
    pub status: Option<u16>,
    /// Failure description, absent on success
    pub error: Option<String>,
    /// When the call completed
    pub timestamp: DateTime<Utc>,
}

impl CallLogEntry {
    /// Whether the call produced usable data
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-run diagnostics threaded through every component.
///
/// Calls issued concurrently append through a shared reference; entries are
/// independent of each other so ordering only reflects completion order.
#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    call_log: Mutex<Vec<CallLogEntry>>,
    notes: Mutex<Vec<String>>,
}

/// Owned snapshot of a finished run's diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Identifier of the run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the report was taken
    pub finished_at: DateTime<Utc>,
    /// Every upstream call in completion order
    pub call_log: Vec<CallLogEntry>,
    /// Processing notes (degradations, dropped inputs, capping)
    pub notes: Vec<String>,
    /// Number of successful calls
    pub calls_succeeded: usize,
    /// Number of failed calls
    pub calls_failed: usize,
}

impl RunContext {
    /// Start a fresh run
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            call_log: Mutex::new(Vec::new()),
            notes: Mutex::new(Vec::new()),
        }
    }

    /// Identifier of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append a successful call
    pub fn record_success(&self, context: &str, url: &str, status: u16) {
        debug!("[{}] {} -> {} ({})", self.run_id, context, status, url);
        self.push_entry(CallLogEntry {
            context: context.to_string(),
            url: url.to_string(),
            status: Some(status),
            error: None,
            timestamp: Utc::now(),
        });
    }

    /// Append a failed call
    pub fn record_failure(&self, context: &str, url: &str, status: Option<u16>, error: &str) {
        warn!("[{}] {} failed: {} ({})", self.run_id, context, error, url);
        self.push_entry(CallLogEntry {
            context: context.to_string(),
            url: url.to_string(),
            status,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        });
    }

    /// Add a processing note
    pub fn note(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("[{}] note: {}", self.run_id, message);
        lock(&self.notes).push(message);
    }

    /// Copy of the call log so far
    pub fn call_log(&self) -> Vec<CallLogEntry> {
        lock(&self.call_log).clone()
    }

    /// Copy of the notes so far
    pub fn notes(&self) -> Vec<String> {
        lock(&self.notes).clone()
    }

    /// (succeeded, failed) call counts
    pub fn call_stats(&self) -> (usize, usize) {
        let log = lock(&self.call_log);
        let succeeded = log.iter().filter(|entry| entry.succeeded()).count();
        (succeeded, log.len() - succeeded)
    }

    /// Consume the context into an owned report
    pub fn into_report(self) -> RunReport {
        let (calls_succeeded, calls_failed) = self.call_stats();
        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            call_log: self
                .call_log
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
            notes: self.notes.into_inner().unwrap_or_else(PoisonError::into_inner),
            calls_succeeded,
            calls_failed,
        }
    }

    fn push_entry(&self, entry: CallLogEntry) {
        lock(&self.call_log).push(entry);
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

// Entries are pushed whole, so a poisoned lock still guards a consistent Vec.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
