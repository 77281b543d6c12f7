//! File-backed lease store.
//!
//! Each lease is one JSON document under the store directory, named by a
//! percent-encoded form of its resource id. Writes go through a uniquely
//! named temp file followed by a rename, so readers never observe a
//! partially written lease.
//!
//! Mutations are exclusive across processes, not just threads: every
//! read-decide-write sequence holds a sidecar `.lock` file created with
//! `create_new` (the filesystem's exclusive-create), so two CLI invocations
//! racing the same directory serialize. An internal mutex additionally lets
//! threads of one process wait on each other without spinning on the
//! sidecar. A lock file left behind by a crashed process is taken over once
//! it goes stale.

use super::{acquire_decision, LeaseStore, PutOutcome};
use crate::error::{LockError, Result};
use crate::lease::Lease;
use chrono::{DateTime, Utc};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const LOCK_STALE_AFTER: Duration = Duration::from_secs(10);
const LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(10);

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Lease store keeping one JSON file per resource id.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    mutations: Mutex<()>,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        fs::create_dir_all(&dir).map_err(|e| {
            LockError::Storage(format!(
                "failed to create lease directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self {
            dir,
            mutations: Mutex::new(()),
        })
    }

    /// The store's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lease_path(&self, resource_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", encode_resource_id(resource_id)))
    }

    fn read_lease(path: &Path) -> Result<Option<Lease>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LockError::Storage(format!(
                    "failed to read lease file '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let lease = serde_json::from_str(&content).map_err(|e| {
            LockError::Storage(format!(
                "failed to parse lease file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(lease))
    }

    fn write_lease(&self, lease: &Lease) -> Result<()> {
        let path = self.lease_path(&lease.resource_id);

        // Unique per process and per write, so an unrelated writer can never
        // clobber or rename-race this temp file
        let tmp_path = self.dir.join(format!(
            "{}.{}-{}.tmp",
            encode_resource_id(&lease.resource_id),
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed),
        ));

        let json = serde_json::to_string_pretty(lease)
            .map_err(|e| LockError::Storage(format!("failed to serialize lease: {}", e)))?;

        fs::write(&tmp_path, json).map_err(|e| {
            LockError::Storage(format!(
                "failed to write lease file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            // Clean up the temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            LockError::Storage(format!(
                "failed to commit lease file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    fn remove_lease(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::Storage(format!(
                "failed to remove lease file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn mutation_guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.mutations
            .lock()
            .map_err(|_| LockError::Storage("lease store mutex poisoned".to_string()))
    }

    fn lock_dir(&self) -> Result<DirLock> {
        DirLock::acquire(self.dir.join(".lock"))
    }
}

/// Sidecar lock file guarding one mutation's read-decide-write sequence
/// against other processes. Removed on drop.
#[derive(Debug)]
struct DirLock {
    path: PathBuf,
}

impl DirLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        let deadline = Instant::now() + LOCK_WAIT;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // Holder pid, for post-mortem inspection of a stale lock
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        // A crashed holder never removes its lock file;
                        // take it over
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(LockError::Storage(format!(
                            "timed out waiting for store lock '{}'",
                            path.display()
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(LockError::Storage(format!(
                        "failed to create store lock '{}': {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > LOCK_STALE_AFTER)
}

impl LeaseStore for FileStore {
    fn get(&self, resource_id: &str) -> Result<Option<Lease>> {
        Self::read_lease(&self.lease_path(resource_id))
    }

    fn put_if_acquirable(&self, candidate: Lease, now: DateTime<Utc>) -> Result<PutOutcome> {
        let _guard = self.mutation_guard()?;
        let _dir_lock = self.lock_dir()?;

        let existing = Self::read_lease(&self.lease_path(&candidate.resource_id))?;
        let outcome = acquire_decision(existing.as_ref(), candidate, now);
        if let PutOutcome::Granted(lease) = &outcome {
            self.write_lease(lease)?;
        }

        Ok(outcome)
    }

    fn update_if_held_by(&self, renewed: &Lease) -> Result<bool> {
        let _guard = self.mutation_guard()?;
        let _dir_lock = self.lock_dir()?;

        let path = self.lease_path(&renewed.resource_id);
        match Self::read_lease(&path)? {
            Some(current) if current.holder_id == renewed.holder_id => {
                self.write_lease(renewed)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_if_held_by(&self, resource_id: &str, holder_id: &str) -> Result<bool> {
        let _guard = self.mutation_guard()?;
        let _dir_lock = self.lock_dir()?;

        let path = self.lease_path(resource_id);
        match Self::read_lease(&path)? {
            Some(current) if current.holder_id == holder_id => {
                Self::remove_lease(&path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete(&self, resource_id: &str) -> Result<Option<Lease>> {
        let _guard = self.mutation_guard()?;
        let _dir_lock = self.lock_dir()?;

        let path = self.lease_path(resource_id);
        let removed = Self::read_lease(&path)?;
        if removed.is_some() {
            Self::remove_lease(&path)?;
        }

        Ok(removed)
    }

    fn list(&self) -> Result<Vec<Lease>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            LockError::Storage(format!(
                "failed to read lease directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut leases = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                LockError::Storage(format!("failed to read lease directory entry: {}", e))
            })?;

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // Skip unparsable files; get() on the same resource still errors
            if let Ok(Some(lease)) = Self::read_lease(&path) {
                leases.push(lease);
            }
        }

        leases.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
        Ok(leases)
    }
}

/// Encode a resource id into a filesystem-safe file stem.
///
/// Alphanumerics plus `.`, `_`, and `-` pass through; every other byte
/// becomes `%XX`. The encoding is injective, so distinct resource ids never
/// collide on disk.
pub(crate) fn encode_resource_id(resource_id: &str) -> String {
    let mut encoded = String::with_capacity(resource_id.len());
    for byte in resource_id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    encoded
}
