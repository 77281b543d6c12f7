//! In-memory lease store.

use super::{acquire_decision, LeaseStore, PutOutcome};
use crate::error::{LockError, Result};
use crate::lease::Lease;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Lease store backed by a mutex-guarded map.
///
/// The mutex is the atomicity boundary: the read-decide-write sequence of
/// `put_if_acquirable` runs entirely inside one critical section, so racing
/// acquirers serialize and exactly one wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leases: Mutex<HashMap<String, Lease>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, HashMap<String, Lease>>> {
        self.leases
            .lock()
            .map_err(|_| LockError::Storage("lease table mutex poisoned".to_string()))
    }
}

impl LeaseStore for MemoryStore {
    fn get(&self, resource_id: &str) -> Result<Option<Lease>> {
        Ok(self.table()?.get(resource_id).cloned())
    }

    fn put_if_acquirable(&self, candidate: Lease, now: DateTime<Utc>) -> Result<PutOutcome> {
        let mut table = self.table()?;

        let outcome = acquire_decision(table.get(&candidate.resource_id), candidate, now);
        if let PutOutcome::Granted(lease) = &outcome {
            table.insert(lease.resource_id.clone(), lease.clone());
        }

        Ok(outcome)
    }

    fn update_if_held_by(&self, renewed: &Lease) -> Result<bool> {
        let mut table = self.table()?;

        match table.get(&renewed.resource_id) {
            Some(current) if current.holder_id == renewed.holder_id => {
                table.insert(renewed.resource_id.clone(), renewed.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_if_held_by(&self, resource_id: &str, holder_id: &str) -> Result<bool> {
        let mut table = self.table()?;

        match table.get(resource_id) {
            Some(current) if current.holder_id == holder_id => {
                table.remove(resource_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete(&self, resource_id: &str) -> Result<Option<Lease>> {
        Ok(self.table()?.remove(resource_id))
    }

    fn list(&self) -> Result<Vec<Lease>> {
        let mut leases: Vec<Lease> = self.table()?.values().cloned().collect();
        leases.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
        Ok(leases)
    }
}
