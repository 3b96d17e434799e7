//! Configuration for the identity sync service.
//!
//! Configured via a TOML file, with `${VAR_NAME}` placeholders expanded from
//! the environment.
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 8080
//! admin_token = "${GROUPSYNC_ADMIN_TOKEN}"
//!
//! [database]
//! type = "sqlite"
//! path = "groupsync.db"
//!
//! [identity_sync.schedule]
//! enabled = true
//! interval_secs = 900
//! ```

mod database;
mod identity_sync;
mod observability;
mod secrets;
mod server;

use std::{path::Path, sync::LazyLock};

pub use database::*;
pub use identity_sync::*;
pub use observability::*;
use regex::Regex;
pub use secrets::*;
use serde::{Deserialize, Serialize};
pub use server::*;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub identity_sync: IdentitySyncSettings,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: AppConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.identity_sync.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

static ENV_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Expand `${VAR}` placeholders line by line, leaving anything after a `#` alone.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            result.push('\n');
        }

        let comment_pos = line.find('#').unwrap_or(line.len());
        let mut last_end = 0;

        for cap in ENV_VAR_REGEX.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };
            if whole.start() >= comment_pos {
                break;
            }

            result.push_str(&line[last_end..whole.start()]);
            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            result.push_str(&value);
            last_end = whole.end();
        }

        result.push_str(&line[last_end..]);
    }

    if input.ends_with('\n') {
        result.push('\n');
    }

    Ok(result)
}
