//! Request/response shaping for the lock service.
//!
//! This is the transport-agnostic surface the web layer exposes: it
//! validates the raw inputs (resource id, caller identity), invokes the
//! service, and shapes the results into serializable payloads with HTTP
//! status codes. A lease conflict is not a transport error: it becomes a
//! 409 payload carrying the current holder so the editor can render who has
//! the page and until when.

use crate::audit::AuditSink;
use crate::authz::AuthorizationGate;
use crate::error::{LockError, Result};
use crate::http;
use crate::lease::{Lease, LockInfo};
use crate::service::{LockService, LockStatus};
use crate::store::LeaseStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Authenticated caller, supplied by the external identity/session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Stable identity used as the lease holder id.
    pub id: String,

    /// Display label cached on the lease for other editors' UI.
    pub display_name: String,

    /// Role consulted by the authorization gate for force-release.
    pub role: String,
}

/// Mutating actions accepted by the POST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockAction {
    Acquire,
    Extend,
    Release,
    ForceRelease,
}

impl FromStr for LockAction {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "acquire" => Ok(LockAction::Acquire),
            "extend" => Ok(LockAction::Extend),
            "release" => Ok(LockAction::Release),
            "force_release" => Ok(LockAction::ForceRelease),
            other => Err(LockError::Validation(format!(
                "unknown lock action '{}'",
                other
            ))),
        }
    }
}

/// Response body for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether a live lease exists for the resource.
    pub is_locked: bool,

    /// Whether the caller may edit: unlocked, or locked by the caller.
    pub can_edit: bool,

    /// Current holder details, present whenever a live lease exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_info: Option<LockInfo>,
}

/// Response body for the action endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionResponse {
    /// Acquire or extend succeeded; the caller's current lease.
    Granted { lock: Lease },

    /// Acquire lost to a live lease; the holder to show the caller.
    Conflict { lock_info: LockInfo },

    /// Release or force-release completed.
    Ok { ok: bool },
}

impl ActionResponse {
    /// HTTP status code for this response.
    pub fn http_status(&self) -> u16 {
        match self {
            ActionResponse::Granted { .. } => http::OK,
            ActionResponse::Conflict { .. } => http::CONFLICT,
            ActionResponse::Ok { .. } => http::OK,
        }
    }
}

fn require_caller(caller: Option<&Caller>) -> Result<&Caller> {
    caller.ok_or_else(|| LockError::Authentication("caller identity required".to_string()))
}

fn require_resource_id(resource_id: Option<&str>) -> Result<&str> {
    match resource_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(LockError::Validation("resource_id is required".to_string())),
    }
}

/// Handle `GET status?resource_id=R`.
pub fn status<S, G, A>(
    service: &LockService<S, G, A>,
    caller: Option<&Caller>,
    resource_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StatusResponse>
where
    S: LeaseStore,
    G: AuthorizationGate,
    A: AuditSink,
{
    let caller = require_caller(caller)?;
    let resource_id = require_resource_id(resource_id)?;

    let response = match service.check_status(resource_id, &caller.id, now)? {
        LockStatus::Unlocked => StatusResponse {
            is_locked: false,
            can_edit: true,
            lock_info: None,
        },
        LockStatus::LockedBySelf(lease) => StatusResponse {
            is_locked: true,
            can_edit: true,
            lock_info: Some(LockInfo::from(&lease)),
        },
        LockStatus::LockedByOther(info) => StatusResponse {
            is_locked: true,
            can_edit: false,
            lock_info: Some(info),
        },
    };

    Ok(response)
}

/// Handle `POST action=..., resource_id=R`.
pub fn perform<S, G, A>(
    service: &LockService<S, G, A>,
    caller: Option<&Caller>,
    action: LockAction,
    resource_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ActionResponse>
where
    S: LeaseStore,
    G: AuthorizationGate,
    A: AuditSink,
{
    let caller = require_caller(caller)?;
    let resource_id = require_resource_id(resource_id)?;

    match action {
        LockAction::Acquire => {
            match service.acquire(resource_id, &caller.id, &caller.display_name, now) {
                Ok(lock) => Ok(ActionResponse::Granted { lock }),
                Err(LockError::Conflict(lock_info)) => Ok(ActionResponse::Conflict { lock_info }),
                Err(err) => Err(err),
            }
        }
        LockAction::Extend => {
            let lock = service.extend(resource_id, &caller.id, now)?;
            Ok(ActionResponse::Granted { lock })
        }
        LockAction::Release => {
            // No-op releases still report success
            service.release(resource_id, &caller.id)?;
            Ok(ActionResponse::Ok { ok: true })
        }
        LockAction::ForceRelease => {
            service.force_release(resource_id, &caller.id, &caller.role, now)?;
            Ok(ActionResponse::Ok { ok: true })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::authz::RoleGate;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    type TestService = LockService<MemoryStore, RoleGate, MemoryAuditSink>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn test_service() -> TestService {
        LockService::new(
            MemoryStore::new(),
            RoleGate::new(["admin"]),
            MemoryAuditSink::new(),
            &Config::default(),
        )
    }

    fn editor(id: &str) -> Caller {
        Caller {
            id: id.to_string(),
            display_name: id.to_string(),
            role: "editor".to_string(),
        }
    }

    fn admin(id: &str) -> Caller {
        Caller {
            id: id.to_string(),
            display_name: id.to_string(),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn status_requires_resource_id() {
        let service = test_service();
        let caller = editor("alice");

        for missing in [None, Some(""), Some("   ")] {
            let err = status(&service, Some(&caller), missing, t0()).unwrap_err();
            assert!(matches!(err, LockError::Validation(_)));
            assert_eq!(err.http_status(), http::BAD_REQUEST);
        }
    }

    #[test]
    fn status_requires_caller() {
        let service = test_service();

        let err = status(&service, None, Some("page-1"), t0()).unwrap_err();
        assert!(matches!(err, LockError::Authentication(_)));
        assert_eq!(err.http_status(), http::UNAUTHORIZED);
    }

    #[test]
    fn status_of_unlocked_resource() {
        let service = test_service();

        let response = status(&service, Some(&editor("alice")), Some("page-1"), t0()).unwrap();

        assert!(!response.is_locked);
        assert!(response.can_edit);
        assert!(response.lock_info.is_none());

        // lock_info is omitted from the wire format entirely
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("lock_info"));
    }

    #[test]
    fn status_reflects_holder_perspective() {
        let service = test_service();
        perform(
            &service,
            Some(&editor("alice")),
            LockAction::Acquire,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        let own = status(&service, Some(&editor("alice")), Some("page-1"), t0()).unwrap();
        assert!(own.is_locked);
        assert!(own.can_edit);

        let other = status(&service, Some(&editor("bob")), Some("page-1"), t0()).unwrap();
        assert!(other.is_locked);
        assert!(!other.can_edit);
        assert_eq!(other.lock_info.unwrap().holder_id, "alice");
    }

    #[test]
    fn acquire_returns_lock_payload() {
        let service = test_service();

        let response = perform(
            &service,
            Some(&editor("alice")),
            LockAction::Acquire,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        assert_eq!(response.http_status(), http::OK);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["lock"]["holder_id"], "alice");
    }

    #[test]
    fn conflicting_acquire_returns_409_payload_not_error() {
        let service = test_service();
        perform(
            &service,
            Some(&editor("alice")),
            LockAction::Acquire,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        let response = perform(
            &service,
            Some(&editor("bob")),
            LockAction::Acquire,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        assert_eq!(response.http_status(), http::CONFLICT);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["lock_info"]["holder_id"], "alice");
    }

    #[test]
    fn extend_errors_map_to_transport_statuses() {
        let service = test_service();

        let err = perform(
            &service,
            Some(&editor("alice")),
            LockAction::Extend,
            Some("page-1"),
            t0(),
        )
        .unwrap_err();
        assert_eq!(err.http_status(), http::NOT_FOUND);

        perform(
            &service,
            Some(&editor("alice")),
            LockAction::Acquire,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        let err = perform(
            &service,
            Some(&editor("bob")),
            LockAction::Extend,
            Some("page-1"),
            t0(),
        )
        .unwrap_err();
        assert_eq!(err.http_status(), http::FORBIDDEN);
    }

    #[test]
    fn release_reports_ok_even_as_noop() {
        let service = test_service();

        let response = perform(
            &service,
            Some(&editor("alice")),
            LockAction::Release,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        assert_eq!(response.http_status(), http::OK);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], true);
    }

    #[test]
    fn force_release_requires_capability() {
        let service = test_service();
        perform(
            &service,
            Some(&editor("bob")),
            LockAction::Acquire,
            Some("page-1"),
            t0(),
        )
        .unwrap();

        let err = perform(
            &service,
            Some(&editor("mallory")),
            LockAction::ForceRelease,
            Some("page-1"),
            t0(),
        )
        .unwrap_err();
        assert_eq!(err.http_status(), http::FORBIDDEN);

        let response = perform(
            &service,
            Some(&admin("ada")),
            LockAction::ForceRelease,
            Some("page-1"),
            t0(),
        )
        .unwrap();
        assert_eq!(response.http_status(), http::OK);
    }

    #[test]
    fn lock_action_parses_from_snake_case() {
        assert_eq!("acquire".parse::<LockAction>().unwrap(), LockAction::Acquire);
        assert_eq!("extend".parse::<LockAction>().unwrap(), LockAction::Extend);
        assert_eq!("release".parse::<LockAction>().unwrap(), LockAction::Release);
        assert_eq!(
            "force_release".parse::<LockAction>().unwrap(),
            LockAction::ForceRelease
        );
        assert!("steal".parse::<LockAction>().is_err());
    }
}
