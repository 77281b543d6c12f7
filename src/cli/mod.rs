//! CLI argument parsing for pagelock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pagelock: collaborative edit-lock (lease) manager for shared page editing.
///
/// Exclusive editing rights over a resource are granted as time-bounded
/// leases: acquire before editing, extend as a heartbeat while editing,
/// release when done. Expired leases are reassigned lazily; privileged roles
/// can force-release with an audit trail.
#[derive(Parser, Debug)]
#[command(name = "pagelock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding lease state and the audit log.
    #[arg(long, global = true, default_value = ".pagelock")]
    pub data_dir: PathBuf,

    /// Path to config.yaml (defaults to <data-dir>/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Editor identity to act as (defaults to user@host).
    #[arg(long, global = true)]
    pub editor: Option<String>,

    /// Display name shown to other editors (defaults to the editor id).
    #[arg(long, global = true)]
    pub display_name: Option<String>,

    /// Role used for authorization checks.
    #[arg(long, global = true, default_value = "editor")]
    pub role: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for pagelock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the lock status of a resource.
    ///
    /// Reports whether the resource is unlocked, held by you, or held by
    /// another editor (and until when).
    Status(ResourceArgs),

    /// Acquire the edit lease for a resource.
    ///
    /// Succeeds when the resource is unlocked, its lease has expired, or
    /// you already hold it (refreshing the expiry).
    Acquire(ResourceArgs),

    /// Extend a lease you hold (heartbeat).
    ///
    /// Advances the expiry without changing the original grant time.
    Extend(ResourceArgs),

    /// Release a lease you hold.
    ///
    /// Releasing a lease you do not hold is a harmless no-op.
    Release(ResourceArgs),

    /// Forcibly remove a lease regardless of holder.
    ///
    /// Requires a role with the override capability; every success is
    /// recorded in the audit log.
    ForceRelease(ResourceArgs),

    /// List all lease rows, including expired ones awaiting replacement.
    List,
}

/// Arguments naming the resource a command operates on.
#[derive(Parser, Debug)]
pub struct ResourceArgs {
    /// The resource id (e.g., a page identifier).
    pub resource_id: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
