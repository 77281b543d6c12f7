//! Configuration model for pagelock.
//!
//! This module defines the Config struct that represents `config.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.

use crate::error::{LockError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the lock service.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lease time-to-live in minutes. Every acquire and extend sets
    /// `expires_at = now + lease_ttl_minutes`.
    #[serde(default = "default_lease_ttl_minutes")]
    pub lease_ttl_minutes: u32,

    /// Roles allowed to force-release a lease held by someone else.
    /// An empty list disables the override entirely.
    #[serde(default = "default_force_release_roles")]
    pub force_release_roles: Vec<String>,
}

// Default value functions for serde
fn default_lease_ttl_minutes() -> u32 {
    30
}
fn default_force_release_roles() -> Vec<String> {
    vec!["admin".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lease_ttl_minutes: default_lease_ttl_minutes(),
            force_release_roles: default_force_release_roles(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the config.yaml file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockError::Validation)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Validation(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Validation(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LockError::Validation(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lease_ttl_minutes` must be positive
    /// - `force_release_roles` entries must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.lease_ttl_minutes == 0 {
            return Err(LockError::Validation(
                "config validation failed: lease_ttl_minutes must be greater than 0".to_string(),
            ));
        }

        for role in &self.force_release_roles {
            if role.trim().is_empty() {
                return Err(LockError::Validation(
                    "config validation failed: force_release_roles entries must be non-empty"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}
