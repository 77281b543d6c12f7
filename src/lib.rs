//! Collaborative edit-lock (lease) manager for shared page editing.
//!
//! Pagelock grants exclusive editing rights over a shared resource (a
//! "page") to one actor at a time, using time-bounded leases rather than
//! persistent locks:
//!
//! - [`store`]: durable keyed storage of at most one lease per resource id,
//!   with an atomic conditional write for acquisition
//! - [`service`]: the lease protocol (status check, acquire, extend,
//!   release, and audited force-release)
//! - [`authz`]: the capability gate consulted before privileged override
//! - [`audit`]: the append-only sink recording every force-release
//! - [`api`]: transport-agnostic request/response shaping for a web layer
//!
//! Expiry is lazy: an expired lease lingers in storage until the next
//! acquire replaces it. There is no background sweeper and no waiting;
//! acquire never blocks, it reports the current holder and lets the caller
//! decide whether to wait or escalate.

pub mod api;
pub mod audit;
pub mod authz;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod http;
pub mod lease;
pub mod service;
pub mod store;
