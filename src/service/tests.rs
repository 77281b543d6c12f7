//! Tests for the lock service protocol.
//!
//! Timestamps are fixed (T0 plus offsets) so expiry arithmetic is exact;
//! the reference TTL is the default 30 minutes.

use super::*;
use crate::audit::MemoryAuditSink;
use crate::authz::RoleGate;
use crate::config::Config;
use crate::error::LockError;
use crate::store::{LeaseStore, MemoryStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

type TestService = LockService<Arc<MemoryStore>, RoleGate, Arc<MemoryAuditSink>>;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

fn minutes(m: i64) -> Duration {
    Duration::minutes(m)
}

/// Service over an in-memory store, with handles kept for inspection.
fn test_service() -> (TestService, Arc<MemoryStore>, Arc<MemoryAuditSink>) {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let service = LockService::new(
        Arc::clone(&store),
        RoleGate::new(["admin"]),
        Arc::clone(&audit),
        &Config::default(),
    );
    (service, store, audit)
}

#[test]
fn acquire_grants_fresh_lease() {
    let (service, _, _) = test_service();

    let lease = service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    assert_eq!(lease.resource_id, "page-1");
    assert_eq!(lease.holder_id, "alice");
    assert_eq!(lease.holder_display_name, "Alice");
    assert_eq!(lease.acquired_at, t0());
    assert_eq!(lease.last_activity_at, t0());
    assert_eq!(lease.expires_at, t0() + minutes(30));
}

#[test]
fn acquire_against_live_lease_conflicts() {
    let (service, store, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    let err = service
        .acquire("page-1", "bob", "Bob", t0() + minutes(5))
        .unwrap_err();

    match err {
        LockError::Conflict(info) => {
            assert_eq!(info.holder_id, "alice");
            assert_eq!(info.holder_display_name, "Alice");
            assert_eq!(info.expires_at, t0() + minutes(30));
        }
        other => panic!("expected Conflict, got {:?}", other),
    }

    // Conflict stability: the losing attempt changed nothing
    let stored = store.get("page-1").unwrap().unwrap();
    assert_eq!(stored.holder_id, "alice");
    assert_eq!(stored.expires_at, t0() + minutes(30));
}

#[test]
fn acquire_after_expiry_replaces_holder() {
    let (service, _, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    // Untouched lease expires at T0+30m; B acquires at T0+31m
    let lease = service
        .acquire("page-1", "bob", "Bob", t0() + minutes(31))
        .unwrap();

    assert_eq!(lease.holder_id, "bob");
    assert_eq!(lease.acquired_at, t0() + minutes(31));
    assert_eq!(lease.expires_at, t0() + minutes(61));
}

#[test]
fn same_holder_reacquire_is_idempotent_refresh() {
    let (service, _, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    let refreshed = service
        .acquire("page-1", "alice", "Alice", t0() + minutes(10))
        .unwrap();

    // Never fails, always advances expiry, keeps the original grant time
    assert_eq!(refreshed.acquired_at, t0());
    assert_eq!(refreshed.last_activity_at, t0() + minutes(10));
    assert_eq!(refreshed.expires_at, t0() + minutes(40));
}

#[test]
fn extend_by_holder_advances_expiry_only() {
    let (service, _, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    let extended = service.extend("page-1", "alice", t0() + minutes(20)).unwrap();

    assert_eq!(extended.acquired_at, t0());
    assert_eq!(extended.last_activity_at, t0() + minutes(20));
    assert_eq!(extended.expires_at, t0() + minutes(50));
}

#[test]
fn extend_by_non_holder_is_rejected_and_lease_unmodified() {
    let (service, store, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    let err = service.extend("page-1", "bob", t0() + minutes(5)).unwrap_err();
    assert!(matches!(err, LockError::NotHolder(_)));
    assert!(err.to_string().contains("alice"));

    let stored = store.get("page-1").unwrap().unwrap();
    assert_eq!(stored.expires_at, t0() + minutes(30));
}

#[test]
fn extend_without_live_lease_is_not_found() {
    let (service, _, _) = test_service();

    let err = service.extend("page-1", "alice", t0()).unwrap_err();
    assert!(matches!(err, LockError::NotFound(_)));

    // An expired lease is no longer extendable, even by its old holder
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();
    let err = service
        .extend("page-1", "alice", t0() + minutes(31))
        .unwrap_err();
    assert!(matches!(err, LockError::NotFound(_)));
}

#[test]
fn release_by_holder_deletes_lease() {
    let (service, store, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    assert_eq!(
        service.release("page-1", "alice").unwrap(),
        Released::Released
    );
    assert!(store.get("page-1").unwrap().is_none());

    let status = service.check_status("page-1", "alice", t0()).unwrap();
    assert_eq!(status, LockStatus::Unlocked);
}

#[test]
fn release_by_non_holder_is_noop() {
    let (service, store, _) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    assert_eq!(service.release("page-1", "bob").unwrap(), Released::NoOp);
    assert!(store.get("page-1").unwrap().is_some());

    // Releasing something that was never held is equally harmless
    assert_eq!(service.release("page-9", "bob").unwrap(), Released::NoOp);
}

#[test]
fn force_release_by_admin_deletes_and_audits() {
    let (service, store, audit) = test_service();
    service.acquire("page-1", "bob", "Bob", t0()).unwrap();

    let outcome = service
        .force_release("page-1", "ada", "admin", t0() + minutes(5))
        .unwrap();

    assert_eq!(outcome.previous_holder, Some("bob".to_string()));
    assert!(store.get("page-1").unwrap().is_none());

    // Exactly one audit entry per successful force-release, stamped with
    // the request's clock reading
    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor, "ada");
    assert_eq!(entries[0].resource, "page-1");
    assert_eq!(entries[0].previous_holder, Some("bob".to_string()));
    assert_eq!(entries[0].ts, t0() + minutes(5));
}

#[test]
fn force_release_without_capability_is_forbidden_and_unaudited() {
    let (service, store, audit) = test_service();
    service.acquire("page-1", "bob", "Bob", t0()).unwrap();

    let err = service
        .force_release("page-1", "mallory", "editor", t0())
        .unwrap_err();
    assert!(matches!(err, LockError::Permission(_)));

    // Storage untouched, no audit entry for the refused attempt
    assert!(store.get("page-1").unwrap().is_some());
    assert!(audit.entries().is_empty());
}

#[test]
fn force_release_of_absent_lease_still_audits() {
    let (service, _, audit) = test_service();

    let outcome = service.force_release("page-1", "ada", "admin", t0()).unwrap();
    assert_eq!(outcome.previous_holder, None);

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].previous_holder.is_none());
}

#[test]
fn extend_cannot_resurrect_force_released_lease() {
    let (service, store, audit) = test_service();
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();
    service
        .force_release("page-1", "ada", "admin", t0() + minutes(5))
        .unwrap();

    // The displaced holder's heartbeat must not re-create the row and
    // silently undo the audited override
    let err = service.extend("page-1", "alice", t0() + minutes(6)).unwrap_err();
    assert!(matches!(err, LockError::NotFound(_)));
    assert!(store.get("page-1").unwrap().is_none());
    assert_eq!(audit.entries().len(), 1);
}

#[test]
fn check_status_reports_relative_to_requester() {
    let (service, _, _) = test_service();

    assert_eq!(
        service.check_status("page-1", "alice", t0()).unwrap(),
        LockStatus::Unlocked
    );

    service.acquire("page-1", "alice", "Alice", t0()).unwrap();

    match service.check_status("page-1", "alice", t0() + minutes(1)).unwrap() {
        LockStatus::LockedBySelf(lease) => assert_eq!(lease.holder_id, "alice"),
        other => panic!("expected LockedBySelf, got {:?}", other),
    }

    match service.check_status("page-1", "bob", t0() + minutes(1)).unwrap() {
        LockStatus::LockedByOther(info) => {
            assert_eq!(info.holder_id, "alice");
            assert_eq!(info.expires_at, t0() + minutes(30));
        }
        other => panic!("expected LockedByOther, got {:?}", other),
    }

    // Expired row reads as unlocked even though it is still in storage
    assert_eq!(
        service.check_status("page-1", "bob", t0() + minutes(30)).unwrap(),
        LockStatus::Unlocked
    );
}

#[test]
fn ttl_comes_from_config() {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let config = Config::from_yaml("lease_ttl_minutes: 5").unwrap();
    let service = LockService::new(store, RoleGate::new(["admin"]), audit, &config);

    assert_eq!(service.ttl(), minutes(5));

    let lease = service.acquire("page-1", "alice", "Alice", t0()).unwrap();
    assert_eq!(lease.expires_at, t0() + minutes(5));
}

#[test]
fn list_leases_includes_expired_rows() {
    let (service, _, _) = test_service();
    service.acquire("page-a", "alice", "Alice", t0()).unwrap();
    service.acquire("page-b", "bob", "Bob", t0()).unwrap();

    let leases = service.list_leases().unwrap();
    assert_eq!(leases.len(), 2);

    // No sweeper: rows stay listed past expiry
    let later = t0() + minutes(60);
    let leases = service.list_leases().unwrap();
    assert!(leases.iter().all(|l| !l.is_live(later)));
    assert_eq!(leases.len(), 2);
}

#[test]
fn racing_acquirers_grant_exactly_once() {
    let (service, _, _) = test_service();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = Arc::clone(&service);
        handles.push(std::thread::spawn(move || {
            let holder = format!("editor-{}", i);
            service.acquire("page-1", &holder, &holder, t0()).is_ok()
        }));
    }

    let wins: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();

    // Mutual exclusion: at most one live lease per resource id
    assert_eq!(wins, 1);
}

#[test]
fn end_to_end_editing_session() {
    let (service, _, audit) = test_service();

    // A edits, heartbeats twice, then finishes
    service.acquire("page-1", "alice", "Alice", t0()).unwrap();
    service.extend("page-1", "alice", t0() + minutes(10)).unwrap();
    let lease = service.extend("page-1", "alice", t0() + minutes(20)).unwrap();
    assert_eq!(lease.expires_at, t0() + minutes(50));

    // B is blocked meanwhile
    assert!(matches!(
        service.acquire("page-1", "bob", "Bob", t0() + minutes(25)),
        Err(LockError::Conflict(_))
    ));

    // A releases; B takes over; an admin later clears B's lease
    service.release("page-1", "alice").unwrap();
    service
        .acquire("page-1", "bob", "Bob", t0() + minutes(26))
        .unwrap();
    let outcome = service
        .force_release("page-1", "ada", "admin", t0() + minutes(27))
        .unwrap();
    assert_eq!(outcome.previous_holder, Some("bob".to_string()));
    assert_eq!(audit.entries().len(), 1);

    assert_eq!(
        service
            .check_status("page-1", "carol", t0() + minutes(27))
            .unwrap(),
        LockStatus::Unlocked
    );
}
