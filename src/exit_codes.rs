//! Exit code constants for the pagelock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing lease, no identity)
//! - 2: Permission refusal (force-release without the override capability)
//! - 3: Storage failure (backing store unavailable or write failure)
//! - 4: Lease contention (held by another live editor)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, missing caller identity, or no such lease.
pub const USER_ERROR: i32 = 1;

/// Permission refusal: force-release attempted without the override role.
pub const PERMISSION_FAILURE: i32 = 2;

/// Storage failure: lease store or audit log could not be read or written.
pub const STORAGE_FAILURE: i32 = 3;

/// Lease contention: the resource is held by another live editor.
pub const LEASE_FAILURE: i32 = 4;
