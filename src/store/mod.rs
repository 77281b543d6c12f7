//! Lease storage for pagelock.
//!
//! The store keeps at most one lease row per resource id behind a narrow
//! interface, so ownership and mutation rights are explicit at every call
//! site. The only write path for acquisition is `put_if_acquirable`, a single
//! atomic conditional operation: a separate check-then-write would leave a
//! race window where two concurrent acquirers both observe "unlocked" and
//! both write.
//!
//! Stores never expire rows proactively. Expiry is discovered lazily by
//! comparing `expires_at` to the caller-supplied `now`; an expired row
//! lingers until the next acquire replaces it.

mod file;
mod memory;


pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::lease::Lease;
use chrono::{DateTime, Utc};

/// Outcome of the atomic conditional acquire write.
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    /// The candidate lease was written and now owns the resource.
    Granted(Lease),

    /// A live lease held by a different holder blocked the write;
    /// the existing row is returned unchanged.
    Conflict(Lease),
}

/// Durable keyed persistence of at most one lease record per resource id.
///
/// Implementations must make `put_if_acquirable` atomic: two concurrent
/// acquirers for the same resource id must not both observe `Granted`.
pub trait LeaseStore: Send + Sync {
    /// Read the current record, without liveness filtering. The caller
    /// decides liveness.
    fn get(&self, resource_id: &str) -> Result<Option<Lease>>;

    /// The only write path for acquisition: writes `candidate` if no row
    /// exists, the existing row is not live at `now`, or the existing live
    /// row is held by `candidate.holder_id` (same-holder refresh, preserving
    /// the original `acquired_at`). Otherwise leaves the row unchanged and
    /// reports it as a conflict.
    fn put_if_acquirable(&self, candidate: Lease, now: DateTime<Utc>) -> Result<PutOutcome>;

    /// Overwrite the row only if one still exists with the same holder.
    /// Returns whether the write occurred. Used by the extend heartbeat,
    /// which must never re-create a row that was released or force-released
    /// after the holder check.
    fn update_if_held_by(&self, renewed: &Lease) -> Result<bool>;

    /// Remove the row only if the current holder matches. Returns whether a
    /// delete occurred. Used for voluntary release.
    fn delete_if_held_by(&self, resource_id: &str, holder_id: &str) -> Result<bool>;

    /// Remove the row regardless of holder, returning it if one existed.
    /// Used only by force-release, after the caller has checked
    /// authorization.
    fn delete(&self, resource_id: &str) -> Result<Option<Lease>>;

    /// All current rows, including expired ones awaiting lazy replacement.
    fn list(&self) -> Result<Vec<Lease>>;
}

impl<T: LeaseStore + ?Sized> LeaseStore for std::sync::Arc<T> {
    fn get(&self, resource_id: &str) -> Result<Option<Lease>> {
        (**self).get(resource_id)
    }

    fn put_if_acquirable(&self, candidate: Lease, now: DateTime<Utc>) -> Result<PutOutcome> {
        (**self).put_if_acquirable(candidate, now)
    }

    fn update_if_held_by(&self, renewed: &Lease) -> Result<bool> {
        (**self).update_if_held_by(renewed)
    }

    fn delete_if_held_by(&self, resource_id: &str, holder_id: &str) -> Result<bool> {
        (**self).delete_if_held_by(resource_id, holder_id)
    }

    fn delete(&self, resource_id: &str) -> Result<Option<Lease>> {
        (**self).delete(resource_id)
    }

    fn list(&self) -> Result<Vec<Lease>> {
        (**self).list()
    }
}

/// Shared acquirability decision, applied by every store inside its atomic
/// critical section.
///
/// Grants cover three cases uniformly: truly unlocked, previously expired,
/// and re-acquired by the same holder. A same-holder refresh keeps the
/// original grant time.
pub(crate) fn acquire_decision(
    existing: Option<&Lease>,
    mut candidate: Lease,
    now: DateTime<Utc>,
) -> PutOutcome {
    match existing {
        Some(current) if current.is_live(now) => {
            if current.holder_id == candidate.holder_id {
                candidate.acquired_at = current.acquired_at;
                PutOutcome::Granted(candidate)
            } else {
                PutOutcome::Conflict(current.clone())
            }
        }
        _ => PutOutcome::Granted(candidate),
    }
}
