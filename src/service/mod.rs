//! The lease protocol: status check, acquire, extend, release,
//! force-release.
//!
//! All policy lives here: conflict rules, lazy expiry, TTL arithmetic, the
//! authorization boundary for privileged override, and the audit obligation.
//! Correctness under concurrent acquires is delegated entirely to the lease
//! store's atomic conditional write; the service performs no locking of its
//! own.

mod protocol;
mod types;

#[cfg(test)]
mod tests;

pub use protocol::LockService;
pub use types::{ForceReleased, LockStatus, Released};
