//! Command implementations for pagelock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Commands wire the file-backed store, audit log, and
//! configured authorization gate into the lock service, then print
//! human-readable results.

use crate::cli::{Cli, Command, ResourceArgs};
use chrono::{DateTime, Utc};
use pagelock::audit::FileAuditSink;
use pagelock::authz::RoleGate;
use pagelock::config::Config;
use pagelock::error::Result;
use pagelock::lease::Lease;
use pagelock::service::{LockService, LockStatus, Released};
use pagelock::store::FileStore;

type CliService = LockService<FileStore, RoleGate, FileAuditSink>;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("config.yaml"));
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    let store = FileStore::new(cli.data_dir.join("leases"))?;
    let audit = FileAuditSink::new(cli.data_dir.join("audit.ndjson"));
    let gate = RoleGate::from_config(&config);
    let service = LockService::new(store, gate, audit, &config);

    let editor = cli.editor.clone().unwrap_or_else(default_editor_id);
    let display_name = cli.display_name.clone().unwrap_or_else(|| editor.clone());
    let now = Utc::now();

    match cli.command {
        Command::Status(args) => cmd_status(&service, &args, &editor, now),
        Command::Acquire(args) => cmd_acquire(&service, &args, &editor, &display_name, now),
        Command::Extend(args) => cmd_extend(&service, &args, &editor, now),
        Command::Release(args) => cmd_release(&service, &args, &editor),
        Command::ForceRelease(args) => cmd_force_release(&service, &args, &editor, &cli.role, now),
        Command::List => cmd_list(&service, now),
    }
}

fn cmd_status(
    service: &CliService,
    args: &ResourceArgs,
    editor: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    match service.check_status(&args.resource_id, editor, now)? {
        LockStatus::Unlocked => {
            println!("'{}' is unlocked", args.resource_id);
        }
        LockStatus::LockedBySelf(lease) => {
            println!(
                "'{}' is locked by you (expires in {})",
                args.resource_id,
                lease.remaining_string(now)
            );
        }
        LockStatus::LockedByOther(info) => {
            println!("'{}' is locked by {}", args.resource_id, info);
        }
    }
    Ok(())
}

fn cmd_acquire(
    service: &CliService,
    args: &ResourceArgs,
    editor: &str,
    display_name: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let lease = service.acquire(&args.resource_id, editor, display_name, now)?;
    println!(
        "Acquired '{}' as {} (expires in {})",
        lease.resource_id,
        editor,
        lease.remaining_string(now)
    );
    Ok(())
}

fn cmd_extend(
    service: &CliService,
    args: &ResourceArgs,
    editor: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let lease = service.extend(&args.resource_id, editor, now)?;
    println!(
        "Extended '{}' (expires in {})",
        lease.resource_id,
        lease.remaining_string(now)
    );
    Ok(())
}

fn cmd_release(service: &CliService, args: &ResourceArgs, editor: &str) -> Result<()> {
    match service.release(&args.resource_id, editor)? {
        Released::Released => println!("Released '{}'", args.resource_id),
        Released::NoOp => println!("Nothing to release for '{}'", args.resource_id),
    }
    Ok(())
}

fn cmd_force_release(
    service: &CliService,
    args: &ResourceArgs,
    actor: &str,
    role: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let outcome = service.force_release(&args.resource_id, actor, role, now)?;
    match outcome.previous_holder {
        Some(holder) => println!(
            "Force-released '{}' (was held by {})",
            args.resource_id, holder
        ),
        None => println!("Force-released '{}' (no lease existed)", args.resource_id),
    }
    Ok(())
}

fn cmd_list(service: &CliService, now: DateTime<Utc>) -> Result<()> {
    let leases = service.list_leases()?;

    if leases.is_empty() {
        println!("No leases");
        return Ok(());
    }

    for lease in &leases {
        println!("{}", format_lease_line(lease, now));
    }
    Ok(())
}

fn format_lease_line(lease: &Lease, now: DateTime<Utc>) -> String {
    format!(
        "{} (holder: {}, expires: {}{})",
        lease.resource_id,
        lease.holder_id,
        lease.remaining_string(now),
        if lease.is_live(now) { "" } else { ", STALE" }
    )
}

/// Default editor identity: `user@host` from the environment and hostname.
pub(crate) fn default_editor_id() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_editor_id() {
        let editor = default_editor_id();
        assert!(editor.contains('@'));
        assert!(!editor.is_empty());
    }

    #[test]
    fn test_format_lease_line_marks_stale_rows() {
        let now = Utc::now();
        let lease = Lease::new("page-1", "alice@laptop", "Alice", now, Duration::minutes(30));

        let live = format_lease_line(&lease, now);
        assert!(live.contains("page-1"));
        assert!(live.contains("alice@laptop"));
        assert!(!live.contains("STALE"));

        let stale = format_lease_line(&lease, now + Duration::minutes(31));
        assert!(stale.contains("STALE"));
        assert!(stale.contains("expired"));
    }
}
