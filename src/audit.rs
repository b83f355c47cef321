//! Audit log sink.
//!
//! User and admin actions (registration, login, deletions, catalog edits)
//! are appended as plain text lines: `<timestamp> - <LEVEL> - <message>`.
//! The sink is passed to each component explicitly. Passwords and other
//! secrets never reach it.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::error::{CampusError, FailOpen, Result};

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// Append-only audit sink.
pub trait AuditLog {
    /// Append one entry.
    fn record(&self, level: AuditLevel, message: &str) -> Result<()>;

    /// Append an info entry; failures are logged and ignored.
    fn info(&self, message: &str) {
        self.record(AuditLevel::Info, message)
            .fail_open_default("writing audit entry");
    }

    /// Append a warning entry; failures are logged and ignored.
    fn warning(&self, message: &str) {
        self.record(AuditLevel::Warning, message)
            .fail_open_default("writing audit entry");
    }

    /// Append an error entry; failures are logged and ignored.
    fn error(&self, message: &str) {
        self.record(AuditLevel::Error, message)
            .fail_open_default("writing audit entry");
    }
}

/// Audit log appending to a text file.
pub struct FileAuditLog {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl FileAuditLog {
    /// Create a log writing to `path`, stamped with the system clock.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_clock(path, Box::new(SystemClock))
    }

    /// Create a log with a custom clock.
    pub fn with_clock(path: impl AsRef<Path>, clock: Box<dyn Clock>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            clock,
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for FileAuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAuditLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, level: AuditLevel, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CampusError::storage(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CampusError::storage(&self.path, e))?;

        let timestamp = self.clock.now().format("%Y-%m-%d %H:%M:%S,%3f");
        writeln!(file, "{} - {} - {}", timestamp, level, message)
            .map_err(|e| CampusError::storage(&self.path, e))?;

        Ok(())
    }
}

/// In-memory audit log for testing.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<String>>,
}

impl MemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, formatted `<LEVEL> - <message>`.
    pub fn entries(&self) -> Vec<String> {
        self.entries.read().unwrap().clone()
    }

    /// Whether any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.read().unwrap().iter().any(|e| e.contains(needle))
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, level: AuditLevel, message: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .push(format!("{} - {}", level, message));
        Ok(())
    }
}
