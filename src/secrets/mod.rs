//! Storage for provider client secrets.
//!
//! Backends:
//! - In-memory (default; development and tests)
//! - Environment variables (read-only)

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::config::SecretsConfig;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SecretResult<T> = Result<T, SecretError>;

#[async_trait]
pub trait SecretManager: Send + Sync {
    /// Get a secret by key. Returns None if not found.
    async fn get(&self, key: &str) -> SecretResult<Option<String>>;

    /// Set a secret. Not all backends support this.
    async fn set(&self, key: &str, value: &str) -> SecretResult<()>;

    /// Delete a secret. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> SecretResult<()>;
}

/// Build the configured secret manager.
pub fn from_config(config: &SecretsConfig) -> Arc<dyn SecretManager> {
    match config {
        SecretsConfig::Memory => {
            tracing::warn!("Using in-memory secret storage; provider secrets are lost on restart");
            Arc::new(MemorySecretManager::new())
        }
        SecretsConfig::Env { prefix } => Arc::new(EnvSecretManager::new(prefix.clone())),
    }
}

/// In-memory secret manager.
#[derive(Default)]
pub struct MemorySecretManager {
    secrets: DashMap<String, String>,
}

impl MemorySecretManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretManager for MemorySecretManager {
    async fn get(&self, key: &str) -> SecretResult<Option<String>> {
        Ok(self.secrets.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> SecretResult<()> {
        self.secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> SecretResult<()> {
        self.secrets.remove(key);
        Ok(())
    }
}

/// Read-only secret manager backed by environment variables.
///
/// `identity-sync/{org}/client-secret` with prefix `GS_` is read from
/// `GS_IDENTITY_SYNC_{ORG}_CLIENT_SECRET`.
pub struct EnvSecretManager {
    prefix: String,
}

impl EnvSecretManager {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.unwrap_or_default(),
        }
    }

    pub fn var_name(&self, key: &str) -> String {
        let normalized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, normalized)
    }
}

#[async_trait]
impl SecretManager for EnvSecretManager {
    async fn get(&self, key: &str) -> SecretResult<Option<String>> {
        Ok(std::env::var(self.var_name(key)).ok())
    }

    async fn set(&self, _key: &str, _value: &str) -> SecretResult<()> {
        Err(SecretError::Unsupported(
            "Cannot set secrets in environment manager".to_string(),
        ))
    }

    async fn delete(&self, _key: &str) -> SecretResult<()> {
        Err(SecretError::Unsupported(
            "Cannot delete secrets from environment manager".to_string(),
        ))
    }
}
