use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Identity sync engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySyncSettings {
    /// Credential-store key for provider configs.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Timeout for each request to the identity provider.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Page size when listing provider groups and members.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Default for IdentitySyncSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            request_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
            schedule: ScheduleConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl IdentitySyncSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Validation(
                "identity_sync.provider cannot be empty".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "identity_sync.request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Validation(
                "identity_sync.page_size must be greater than zero".into(),
            ));
        }
        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "identity_sync.schedule.interval_secs must be greater than zero".into(),
            ));
        }
        if self.webhook.signature_header.trim().is_empty() {
            return Err(ConfigError::Validation(
                "identity_sync.webhook.signature_header cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Periodic full sync of every organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Inbound provider event webhook.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// HMAC-SHA256 key. When set, requests must carry a valid signature.
    #[serde(default)]
    pub secret: Option<String>,

    /// Header holding the hex-encoded signature.
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            signature_header: default_signature_header(),
        }
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| "****"))
            .field("signature_header", &self.signature_header)
            .finish()
    }
}

fn default_provider() -> String {
    "identity-sync".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    250
}

fn default_interval() -> u64 {
    3600
}

fn default_signature_header() -> String {
    "x-sailpoint-signature".to_string()
}
