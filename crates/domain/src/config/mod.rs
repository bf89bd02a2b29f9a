mod api;
mod auth;
mod database;
mod initial_admin;
mod kubernetes;
mod log;
mod session;

pub use api::*;
pub use auth::*;
pub use database::*;
pub use initial_admin::*;
pub use kubernetes::*;
pub use log::*;
pub use session::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub initial_admin: InitialAdminConfig,
}

impl Config {
    /// Load from a TOML file, then apply environment overrides for secrets.
    /// A missing file yields the defaults (dev mode).
    pub fn load(path: &std::path::Path) -> Result<Config, Error> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str::<Config>(&text)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(Error::Config(format!("{}: {e}", path.display()))),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets come from the environment when set, shadowing file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SSVIRT_DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = std::env::var("SSVIRT_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("SSVIRT_ADMIN_PASSWORD") {
            self.initial_admin.password = v;
        }
    }

    /// Validate the whole tree. The caller decides whether warnings are
    /// fatal; errors always are.
    pub fn validate(&self, production: bool) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.auth.jwt_secret.is_empty() {
            issues.push(ConfigIssue {
                severity: if production {
                    ConfigSeverity::Error
                } else {
                    ConfigSeverity::Warning
                },
                field: "auth.jwt_secret".into(),
                message: "not set; sessions will not survive a restart".into(),
            });
        }
        if self.database.max_connections == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "database.max_connections".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.api.tls_cert.is_empty() != self.api.tls_key.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "api.tls_cert/api.tls_key".into(),
                message: "both must be set to enable TLS".into(),
            });
        }
        if self.initial_admin.enabled && self.initial_admin.password.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "initial_admin.password".into(),
                message: "empty; the admin account will be created disabled".into(),
            });
        }
        if self.log.format != "text" && self.log.format != "json" {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "log.format".into(),
                message: format!("unknown format {:?} (expected text or json)", self.log.format),
            });
        }
        issues
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}
