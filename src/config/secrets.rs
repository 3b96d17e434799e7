//! Secrets manager configuration.

use serde::{Deserialize, Serialize};

/// Where provider client secrets are kept.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum SecretsConfig {
    /// Process memory. Secrets are lost on restart (development only).
    #[default]
    Memory,

    /// Environment variables. Keys are upper-cased, non-alphanumerics become
    /// `_`, and the optional prefix is prepended.
    Env {
        #[serde(default)]
        prefix: Option<String>,
    },
}
