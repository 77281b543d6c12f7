//! Outcome types for lock service operations.

use crate::lease::{Lease, LockInfo};

/// Result of a status check for one resource, relative to the requester.
#[derive(Debug, Clone, PartialEq)]
pub enum LockStatus {
    /// No row, or the row has expired (lazy expiry: the row may still be
    /// in storage).
    Unlocked,

    /// A live lease exists and the requester holds it.
    LockedBySelf(Lease),

    /// A live lease exists, held by someone else.
    LockedByOther(LockInfo),
}

/// Result of a voluntary release.
///
/// Releasing a lease you do not hold is treated as harmless rather than
/// exceptional; the no-op is still distinguishable for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// The caller held the lease and it was removed.
    Released,

    /// No lease was removed: none existed, or it was held by someone else.
    NoOp,
}

/// Result of a successful privileged override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceReleased {
    /// Identity of the displaced holder, if a row existed.
    pub previous_holder: Option<String>,
}
