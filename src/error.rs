//! Error types for pagelock.
//!
//! Uses thiserror for derive macros and provides caller-actionable error
//! messages. Errors map to HTTP status codes for the web layer and to exit
//! codes for the CLI.

use crate::exit_codes;
use crate::http;
use crate::lease::LockInfo;
use thiserror::Error;

/// Main error type for lock service operations.
///
/// `Conflict` and `NotHolder` are expected steady-state outcomes of the lease
/// protocol, not faults; `Conflict` carries the current holder so the caller
/// can render useful UI. `Storage` is the only variant representing a
/// lower-layer failure.
#[derive(Error, Debug)]
pub enum LockError {
    /// Missing or malformed request input (e.g., empty resource id).
    #[error("{0}")]
    Validation(String),

    /// No caller identity was supplied.
    #[error("authentication required: {0}")]
    Authentication(String),

    /// Caller lacks the force-release capability.
    #[error("permission denied: {0}")]
    Permission(String),

    /// A live lease held by another editor blocks the operation.
    #[error("resource is locked by {0}")]
    Conflict(LockInfo),

    /// Extend was attempted by someone other than the current holder.
    #[error("not the lease holder: {0}")]
    NotHolder(String),

    /// No live lease exists for the resource.
    #[error("no live lease for '{0}'")]
    NotFound(String),

    /// The backing store failed; details are logged, not leaked upward.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LockError {
    /// Returns the HTTP status code for this error when surfaced by a
    /// transport layer.
    pub fn http_status(&self) -> u16 {
        match self {
            LockError::Validation(_) => http::BAD_REQUEST,
            LockError::Authentication(_) => http::UNAUTHORIZED,
            LockError::Permission(_) => http::FORBIDDEN,
            LockError::Conflict(_) => http::CONFLICT,
            LockError::NotHolder(_) => http::FORBIDDEN,
            LockError::NotFound(_) => http::NOT_FOUND,
            LockError::Storage(_) => http::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the appropriate CLI exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::Validation(_) => exit_codes::USER_ERROR,
            LockError::Authentication(_) => exit_codes::USER_ERROR,
            LockError::NotFound(_) => exit_codes::USER_ERROR,
            LockError::Permission(_) => exit_codes::PERMISSION_FAILURE,
            LockError::Conflict(_) => exit_codes::LEASE_FAILURE,
            LockError::NotHolder(_) => exit_codes::LEASE_FAILURE,
            LockError::Storage(_) => exit_codes::STORAGE_FAILURE,
        }
    }
}

/// Result type alias for pagelock operations.
pub type Result<T> = std::result::Result<T, LockError>;
