use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub mod compose;
pub mod email;

use email::catalog::TomlCatalog;
use email::providers::ncloud::NcloudProvider;
use email::{DynEmailProvider, EmailConfig, EmailError, EmailProviderConfig, NcloudConfig};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Optional message catalog overriding the built-in English texts.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            catalog: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            email: EmailConfig {
                from_address: String::new(),
                from_name: None,
                provider: EmailProviderConfig::Ncloud(NcloudConfig::default()),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml_edit::de::Error),

    #[error("{0}")]
    Invalid(#[from] EmailError),
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml_edit::de::from_str::<Config>(content)?)
    }

    /// Reads the file when it exists, otherwise starts from defaults, then
    /// applies `NCLOUD_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)?
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };

        if let EmailProviderConfig::Ncloud(ncloud) = &mut config.email.provider {
            ncloud.apply_env_overrides()?;
        }

        Ok(config)
    }

    /// Builds the configured provider, wiring in the custom catalog if set.
    pub fn build_provider(&self) -> Result<DynEmailProvider, EmailError> {
        match (&self.email.provider, &self.app.catalog) {
            (EmailProviderConfig::Ncloud(ncloud), Some(catalog_path)) => {
                let catalog = TomlCatalog::load_from_file(catalog_path)?;
                Ok(Arc::new(
                    NcloudProvider::new(ncloud)?.with_catalog(Arc::new(catalog)),
                ))
            }
            (provider, _) => email::create_provider(provider),
        }
    }
}
