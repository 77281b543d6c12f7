//! Authorization gate for the privileged override path.
//!
//! Force-release bypasses holder identity, so the capability check is a
//! single injected predicate rather than ad hoc role comparisons inside the
//! lock service. The service consults the gate before any mutating call.

use crate::config::Config;

/// External capability check consulted before force-release.
///
/// Implementations must be pure and side-effect free: the service may call
/// this on every override attempt, authorized or not.
pub trait AuthorizationGate: Send + Sync {
    /// Whether `actor_role` carries the force-release capability.
    fn can_force_release(&self, actor_role: &str) -> bool;
}

/// Role-list gate: the override capability is granted to an explicit set of
/// roles, normally taken from `Config::force_release_roles`.
#[derive(Debug, Clone)]
pub struct RoleGate {
    roles: Vec<String>,
}

impl RoleGate {
    /// Create a gate from an explicit role list.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a gate from the configured override roles.
    pub fn from_config(config: &Config) -> Self {
        Self {
            roles: config.force_release_roles.clone(),
        }
    }
}

impl AuthorizationGate for RoleGate {
    fn can_force_release(&self, actor_role: &str) -> bool {
        self.roles.iter().any(|role| role == actor_role)
    }
}
