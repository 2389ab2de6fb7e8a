//! Bot configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::{AuthorizationPolicy, DEFAULT_ADMIN_ROLES};
use crate::error::ConfigError;

/// Data file path override.
pub const ENV_DATA_FILE: &str = "TK_DATA_FILE";
/// Comma-separated admin role names override.
pub const ENV_ADMIN_ROLES: &str = "TK_ADMIN_ROLES";

const DEFAULT_DATA_FILE: &str = "tk_data.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Where counter data is persisted.
    pub data_file: PathBuf,
    /// Role names allowed to run privileged commands.
    pub admin_roles: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            admin_roles: DEFAULT_ADMIN_ROLES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl BotConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATA_FILE) {
            self.data_file = PathBuf::from(path);
        }
        if let Some(roles) = lookup(ENV_ADMIN_ROLES) {
            self.admin_roles = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_file must not be empty".into()));
        }
        if self.admin_roles.is_empty() {
            // Only platform administrators could moderate. Allowed, but worth knowing.
            tracing::warn!("no admin roles configured");
        }
        Ok(())
    }

    pub fn policy(&self) -> AuthorizationPolicy {
        AuthorizationPolicy::new(self.admin_roles.iter().cloned())
    }
}
