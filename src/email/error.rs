use thiserror::Error;

use crate::email::providers::ncloud::transport::TransportError;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid email message: {0}")]
    ValidationError(String),

    #[error("Attachment '{filename}' is {size} bytes, exceeding the {limit} byte limit")]
    AttachmentTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    #[error("Attachments total {total} bytes, exceeding the {limit} byte limit")]
    AttachmentBatchTooLarge { total: usize, limit: usize },

    #[error("Failed to upload attachment '{filename}': {cause}")]
    AttachmentUploadFailed { filename: String, cause: String },

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("{message} (after {attempts} attempts)")]
    RetriesExhausted {
        attempts: u32,
        message: String,
        #[source]
        last: TransportError,
    },

    #[error("Email provider rejected the request: {0}")]
    ApiError(#[from] ApiError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EmailError {
    /// Only transport failures are worth resubmitting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmailError::TransportError(_))
    }
}

/// A well-formed rejection returned by the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub provider_code: Option<String>,
    pub message: String,
}
