//! HTTP status code constants for the transport-facing surface.
//!
//! The lock service is transport-agnostic; the web layer that exposes it
//! maps errors and action responses to these codes.

/// Request succeeded.
pub const OK: u16 = 200;

/// Missing or malformed request input.
pub const BAD_REQUEST: u16 = 400;

/// No caller identity was supplied.
pub const UNAUTHORIZED: u16 = 401;

/// Caller lacks the required capability or is not the holder.
pub const FORBIDDEN: u16 = 403;

/// No live lease exists for the resource.
pub const NOT_FOUND: u16 = 404;

/// A live lease held by another editor blocks the operation.
pub const CONFLICT: u16 = 409;

/// The backing store failed.
pub const INTERNAL_SERVER_ERROR: u16 = 500;
