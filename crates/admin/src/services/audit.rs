//! Operator-visible audit log.
//!
//! Entries are append-only and live as long as the admin process. Every entry
//! is also emitted through `tracing` at the matching level.

use std::sync::{Mutex, MutexGuard, PoisonError};

use prodigital_core::{LogEntry, LogLevel};
use tracing::{error, info, warn};

/// Append-only list of [`LogEntry`] values.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl AuditLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a copy of it.
    pub fn push(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry::new(level, message);
        match level {
            LogLevel::Info | LogLevel::Success => {
                info!(level = level.as_str(), "{}", entry.message);
            }
            LogLevel::Warning => warn!("{}", entry.message),
            LogLevel::Error => error!("{}", entry.message),
        }
        self.lock().push(entry.clone());
        entry
    }

    pub fn info(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Error, message)
    }

    /// Snapshot of every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Number of entries so far. Use as a mark for [`Self::since`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Entries appended after `mark`.
    #[must_use]
    pub fn since(&self, mark: usize) -> Vec<LogEntry> {
        self.lock().get(mark..).map(<[_]>::to_vec).unwrap_or_default()
    }

    // A panic while holding the lock cannot leave a half-pushed entry behind.
    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
