use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::email::EmailError;
use crate::email::catalog::{MessageCatalog, TomlCatalog};

pub const DEFAULT_ENDPOINT: &str = "https://mail.apigw.ntruss.com";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub from_address: String,
    pub from_name: Option<String>,
    #[serde(flatten)]
    pub provider: EmailProviderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmailProviderConfig {
    Ncloud(NcloudConfig),
    Null,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct NcloudConfig {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub debug: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for NcloudConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            debug: false,
        }
    }
}

impl fmt::Debug for NcloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NcloudConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("retries", &self.retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("debug", &self.debug)
            .finish()
    }
}

impl NcloudConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn credentials(&self) -> Result<Credentials, EmailError> {
        Credentials::new(&self.access_key, &self.secret_key)
    }

    /// Checks everything except credentials, which are validated when a
    /// provider is built from this config.
    pub fn validate(&self) -> Result<(), EmailError> {
        let endpoint = url::Url::parse(&self.endpoint).map_err(|e| {
            EmailError::ConfigError(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(EmailError::ConfigError(format!(
                "endpoint must be http or https, got '{}'",
                endpoint.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(EmailError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), EmailError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), EmailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("NCLOUD_AUTH_KEY") {
            self.access_key = value;
        }
        if let Some(value) = lookup("NCLOUD_SERVICE_SECRET") {
            self.secret_key = value;
        }
        if let Some(value) = lookup("NCLOUD_MAIL_ENDPOINT") {
            self.endpoint = value;
        }
        if let Some(value) = lookup("NCLOUD_MAIL_TIMEOUT") {
            self.timeout_secs = parse_env("NCLOUD_MAIL_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("NCLOUD_MAIL_RETRIES") {
            self.retries = parse_env("NCLOUD_MAIL_RETRIES", &value)?;
        }
        if let Some(value) = lookup("NCLOUD_MAIL_DEBUG") {
            self.debug = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(EmailError::ConfigError(format!(
                        "NCLOUD_MAIL_DEBUG must be a boolean, got '{}'",
                        other
                    )));
                }
            };
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, EmailError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("{} is invalid: {}", key, e)))
}

/// API key pair. Both halves are required and never change once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, EmailError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        let missing = if access_key.trim().is_empty() {
            Some("messages.auth_key_required")
        } else if secret_key.trim().is_empty() {
            Some("messages.service_secret_required")
        } else {
            None
        };
        if let Some(key) = missing {
            let text = TomlCatalog::english().message(key, &[]);
            return Err(EmailError::ConfigError(text));
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl EmailConfig {
    pub fn sender(&self) -> crate::email::Mailbox {
        let mailbox = crate::email::Mailbox::new(&self.from_address);
        match &self.from_name {
            Some(name) => mailbox.with_name(name),
            None => mailbox,
        }
    }
}
