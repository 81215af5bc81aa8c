pub mod catalog;
pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, message: OutboundMessage) -> Result<SendResult, EmailError>;
    fn name(&self) -> &str;
}

pub type DynEmailProvider = Arc<dyn EmailProvider>;

pub fn create_provider(config: &EmailProviderConfig) -> Result<DynEmailProvider, EmailError> {
    match config {
        EmailProviderConfig::Ncloud(ncloud_config) => Ok(Arc::new(
            providers::ncloud::NcloudProvider::new(ncloud_config)?,
        )),
        EmailProviderConfig::Null => Ok(Arc::new(providers::null::NullProvider::new())),
    }
}
