//! Lock service operations.

use super::types::{ForceReleased, LockStatus, Released};
use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::authz::AuthorizationGate;
use crate::config::Config;
use crate::error::{LockError, Result};
use crate::lease::{Lease, LockInfo};
use crate::store::{LeaseStore, PutOutcome};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// The collaborative edit-lock service.
///
/// Grants exclusive editing rights over a resource id to one holder at a
/// time using time-bounded leases. Operations are synchronous and never
/// retried internally; `now` is always supplied by the caller so expiry is
/// decided against one consistent clock reading per request.
pub struct LockService<S, G, A> {
    store: S,
    gate: G,
    audit: A,
    ttl: Duration,
}

impl<S, G, A> LockService<S, G, A>
where
    S: LeaseStore,
    G: AuthorizationGate,
    A: AuditSink,
{
    /// Create a service over the given store, authorization gate, and audit
    /// sink, with the TTL taken from config.
    pub fn new(store: S, gate: G, audit: A, config: &Config) -> Self {
        Self {
            store,
            gate,
            audit,
            ttl: Duration::minutes(i64::from(config.lease_ttl_minutes)),
        }
    }

    /// The configured lease TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Report the lock state of `resource_id` as seen by `requester_id`.
    /// Pure read, no side effects.
    pub fn check_status(
        &self,
        resource_id: &str,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LockStatus> {
        let status = match self.store.get(resource_id)? {
            None => LockStatus::Unlocked,
            Some(lease) if !lease.is_live(now) => LockStatus::Unlocked,
            Some(lease) if lease.holder_id == requester_id => LockStatus::LockedBySelf(lease),
            Some(lease) => LockStatus::LockedByOther(LockInfo::from(&lease)),
        };

        Ok(status)
    }

    /// Acquire the lease for `resource_id`.
    ///
    /// Succeeds when the resource is truly unlocked, its lease has expired,
    /// or the requester already holds it (idempotent refresh preserving the
    /// original `acquired_at`). Fails with `LockError::Conflict` only when a
    /// live lease is held by a different holder; the conflict carries that
    /// holder's identity and expiry so the caller can decide whether to wait
    /// or escalate.
    pub fn acquire(
        &self,
        resource_id: &str,
        requester_id: &str,
        holder_display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Lease> {
        let candidate = Lease::new(resource_id, requester_id, holder_display_name, now, self.ttl);

        match self.store.put_if_acquirable(candidate, now)? {
            PutOutcome::Granted(lease) => Ok(lease),
            PutOutcome::Conflict(current) => Err(LockError::Conflict(LockInfo::from(&current))),
        }
    }

    /// Heartbeat: advance the lease's `last_activity_at` and `expires_at`.
    ///
    /// Only valid for the current live holder. This is not a takeover
    /// mechanism: other requesters get `NotHolder`, and when no live lease
    /// exists the result is `NotFound` rather than a fresh grant.
    pub fn extend(
        &self,
        resource_id: &str,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Lease> {
        let current = match self.store.get(resource_id)? {
            Some(lease) if lease.is_live(now) => lease,
            _ => return Err(LockError::NotFound(resource_id.to_string())),
        };

        if current.holder_id != requester_id {
            return Err(LockError::NotHolder(format!(
                "'{}' is held by {}",
                resource_id, current.holder_id
            )));
        }

        let mut renewed = current;
        renewed.touch(now, self.ttl);

        // Conditional write-back: if the row was released, force-released,
        // or taken over after the read above, the heartbeat must not
        // re-create or overwrite it.
        if self.store.update_if_held_by(&renewed)? {
            Ok(renewed)
        } else {
            Err(LockError::NotFound(resource_id.to_string()))
        }
    }

    /// Voluntarily release the lease for `resource_id`.
    ///
    /// Deletion happens only if the caller is the recorded holder. Releasing
    /// a lease that is absent or held by someone else is a harmless no-op.
    pub fn release(&self, resource_id: &str, requester_id: &str) -> Result<Released> {
        if self.store.delete_if_held_by(resource_id, requester_id)? {
            Ok(Released::Released)
        } else {
            debug!(
                resource = resource_id,
                requester = requester_id,
                "release no-op: lease absent or held by someone else"
            );
            Ok(Released::NoOp)
        }
    }

    /// Privileged unconditional removal of the lease for `resource_id`.
    ///
    /// The authorization gate is consulted before any mutation; refusal
    /// leaves storage untouched and writes no audit entry. Every successful
    /// force-release records exactly one audit entry; there is no code path
    /// around it.
    pub fn force_release(
        &self,
        resource_id: &str,
        actor_id: &str,
        actor_role: &str,
        now: DateTime<Utc>,
    ) -> Result<ForceReleased> {
        if !self.gate.can_force_release(actor_role) {
            return Err(LockError::Permission(format!(
                "role '{}' may not force-release",
                actor_role
            )));
        }

        let removed = self.store.delete(resource_id)?;
        let previous_holder = removed.map(|lease| lease.holder_id);

        let mut entry = AuditEntry::new(AuditAction::ForceRelease, actor_id, resource_id, now);
        if let Some(holder_id) = &previous_holder {
            entry = entry.with_previous_holder(holder_id.clone());
        }
        self.audit.record(&entry)?;

        info!(
            resource = resource_id,
            actor = actor_id,
            previous_holder = previous_holder.as_deref(),
            "lease force-released"
        );

        Ok(ForceReleased { previous_holder })
    }

    /// All current lease rows, including expired ones awaiting lazy
    /// replacement.
    pub fn list_leases(&self) -> Result<Vec<Lease>> {
        self.store.list()
    }
}
