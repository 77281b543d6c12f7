//! Audit sink for privileged lease overrides.
//!
//! Every successful force-release writes exactly one entry to an append-only
//! log; no other lock-service path writes audit entries, and the service
//! never reads the log back. Entries are stored in NDJSON format (one JSON
//! object per line).
//!
//! # Entry Format
//!
//! Each entry is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (currently only `force_release`)
//! - `actor`: Identity of the privileged actor
//! - `resource`: The resource id whose lease was removed
//! - `previous_holder`: Identity of the displaced holder, omitted when the
//!   lease had already expired away or never existed

use crate::error::{LockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Actions that can be recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Privileged unconditional removal of a lease.
    ForceRelease,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::ForceRelease => write!(f, "force_release"),
        }
    }
}

/// An audit record for a privileged override.
///
/// Entries are serialized as single-line JSON objects and appended to
/// the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC3339 timestamp when the override occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: AuditAction,

    /// Identity of the privileged actor.
    pub actor: String,

    /// The resource id whose lease was removed.
    pub resource: String,

    /// Identity of the displaced holder, if a row existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_holder: Option<String>,
}

impl AuditEntry {
    /// Create a new entry with the given action, timestamped at `ts` (the
    /// clock reading of the request being audited).
    pub fn new(
        action: AuditAction,
        actor: impl Into<String>,
        resource: impl Into<String>,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            ts,
            action,
            actor: actor.into(),
            resource: resource.into(),
            previous_holder: None,
        }
    }

    /// Set the displaced holder for this entry.
    pub fn with_previous_holder(mut self, holder_id: impl Into<String>) -> Self {
        self.previous_holder = Some(holder_id.into());
        self
    }

    /// Serialize the entry to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| LockError::Storage(format!("failed to serialize audit entry: {}", e)))
    }
}

/// Append-only destination for audit entries.
pub trait AuditSink: Send + Sync {
    /// Record one entry. Must not silently drop it: a failed write is a
    /// failed force-release.
    fn record(&self, entry: &AuditEntry) -> Result<()>;
}

impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        (**self).record(entry)
    }
}

/// File-backed audit sink appending NDJSON lines.
///
/// The file (and its parent directory) is created on first write. Each append
/// results in one line with a trailing newline, synced to disk.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    /// Create a sink writing to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        let json_line = entry.to_ndjson_line()?;

        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                LockError::Storage(format!(
                    "failed to create audit log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LockError::Storage(format!(
                    "failed to open audit log '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            LockError::Storage(format!(
                "failed to write audit entry to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        // Sync to disk for durability
        file.sync_all().map_err(|e| {
            LockError::Storage(format!(
                "failed to sync audit log '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

/// In-memory audit sink for tests and embedders that forward entries
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, in order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| LockError::Storage("audit sink mutex poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}
