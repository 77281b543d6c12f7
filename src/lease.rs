//! Lease data model.
//!
//! A `Lease` is a time-bounded exclusive claim on one resource id. At most one
//! live lease (where `expires_at > now`) exists per resource; a row may linger
//! in storage after logical expiry until the next acquire replaces it (lazy
//! expiry; there is no background sweeper).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A lease record as persisted in the lease store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    /// Identifier of the editable resource. Primary key: at most one row
    /// exists per resource id at a time.
    pub resource_id: String,

    /// Identity of the current lease owner.
    pub holder_id: String,

    /// Cached display label for UI; not authoritative.
    pub holder_display_name: String,

    /// When the lease was first granted. Preserved across same-holder
    /// re-acquires and extends; reset only when a new holder takes over.
    pub acquired_at: DateTime<Utc>,

    /// Most recent acquire or extend touch.
    pub last_activity_at: DateTime<Utc>,

    /// Always `last_activity_at + TTL`; never set independently.
    pub expires_at: DateTime<Utc>,

    /// Soft-delete flag for stores that keep tombstones. Row-based stores
    /// delete outright, so this defaults to true.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

impl Lease {
    /// Create a fresh lease granted to `holder_id` at `now`.
    pub fn new(
        resource_id: &str,
        holder_id: &str,
        holder_display_name: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            holder_id: holder_id.to_string(),
            holder_display_name: holder_display_name.to_string(),
            acquired_at: now,
            last_activity_at: now,
            expires_at: now + ttl,
            is_active: true,
        }
    }

    /// Whether the lease is live at `now`. Expiry is exclusive: a lease whose
    /// `expires_at` equals `now` is no longer live.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    /// Heartbeat touch: advances `last_activity_at` and `expires_at`,
    /// never `acquired_at`.
    pub fn touch(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.last_activity_at = now;
        self.expires_at = now + ttl;
    }

    /// Time remaining until expiry, if any.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_live(now) {
            Some(self.expires_at - now)
        } else {
            None
        }
    }

    /// Format the time remaining as a human-readable string.
    pub fn remaining_string(&self, now: DateTime<Utc>) -> String {
        match self.remaining(now) {
            None => "expired".to_string(),
            Some(remaining) => {
                let minutes = remaining.num_minutes();
                let hours = remaining.num_hours();

                if hours > 0 {
                    format!("{}h {}m", hours, minutes % 60)
                } else if minutes > 0 {
                    format!("{}m", minutes)
                } else {
                    format!("{}s", remaining.num_seconds())
                }
            }
        }
    }
}

/// Non-authoritative view of a lease, surfaced on conflicts and in status
/// payloads so the caller can decide whether to wait or escalate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Identity of the current holder.
    pub holder_id: String,

    /// Display label for UI.
    pub holder_display_name: String,

    /// When the holder's lease expires.
    pub expires_at: DateTime<Utc>,
}

impl From<&Lease> for LockInfo {
    fn from(lease: &Lease) -> Self {
        Self {
            holder_id: lease.holder_id.clone(),
            holder_display_name: lease.holder_display_name.clone(),
            expires_at: lease.expires_at,
        }
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) until {}",
            self.holder_display_name,
            self.holder_id,
            self.expires_at.to_rfc3339()
        )
    }
}
