//! NAVER Cloud Platform Cloud Outbound Mailer provider.
//!
//! A send runs as a single [`Delivery`]: validate, upload attachments one by
//! one, then post the mail request. Only transport failures on the final
//! post are retried; a response with a non-success status is classified and
//! returned immediately.

pub mod classify;
pub mod payload;
pub mod signer;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod test_support;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::email::catalog::{MessageCatalog, TomlCatalog};
use crate::email::{
    Credentials, EmailError, EmailProvider, NcloudConfig, OutboundMessage, SendResult,
};
use signer::SignedRequest;
use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, RequestBody};
use upload::AttachmentUploader;

pub const MAILS_PATH: &str = "/api/v1/mails";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts for the send call, at least one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    UploadingAttachments,
    Sending { attempt: u32 },
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    request_id: Option<String>,
    count: Option<u32>,
}

pub struct NcloudProvider {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
    catalog: Arc<dyn MessageCatalog>,
    retry: RetryPolicy,
    debug: bool,
}

impl NcloudProvider {
    pub fn new(config: &NcloudConfig) -> Result<Self, EmailError> {
        let credentials = config.credentials()?;
        config.validate()?;

        let transport = ReqwestTransport::new(&config.endpoint, config.timeout())?;

        Ok(Self::with_transport(credentials, Arc::new(transport))
            .with_retry_policy(RetryPolicy::new(config.retries, config.retry_delay()))
            .with_debug(config.debug))
    }

    pub fn with_transport(credentials: Credentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials,
            transport,
            catalog: Arc::new(TomlCatalog::english()),
            retry: RetryPolicy::default(),
            debug: false,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // Bodies can carry recipient addresses, so they only reach info when asked.
    fn log_body(&self, label: &str, body: &str) {
        if self.debug {
            info!("{}: {}", label, body);
        } else {
            trace!("{}: {}", label, body);
        }
    }
}

#[async_trait]
impl EmailProvider for NcloudProvider {
    async fn send_email(&self, message: OutboundMessage) -> Result<SendResult, EmailError> {
        Delivery::new(self, message).run().await
    }

    fn name(&self) -> &str {
        "NAVER Cloud Outbound Mailer"
    }
}

/// One message's trip through the pipeline. Consumed by [`Delivery::run`].
struct Delivery<'a> {
    provider: &'a NcloudProvider,
    message: OutboundMessage,
    state: DeliveryState,
}

impl<'a> Delivery<'a> {
    fn new(provider: &'a NcloudProvider, message: OutboundMessage) -> Self {
        Self {
            provider,
            message,
            state: DeliveryState::Idle,
        }
    }

    fn transition(&mut self, next: DeliveryState) {
        debug!(
            subject = %self.message.subject,
            from = ?self.state,
            to = ?next,
            "Delivery state changed"
        );
        self.state = next;
    }

    async fn run(mut self) -> Result<SendResult, EmailError> {
        let catalog = self.provider.catalog.clone();
        let subject = self.message.subject.clone();
        let attachment_count = self.message.attachments.len();

        info!(
            subject = %subject,
            recipients = self.message.recipients.len(),
            attachments = attachment_count,
            "{}",
            catalog.message("messages.sending", &[])
        );

        match self.execute().await {
            Ok(result) => {
                self.transition(DeliveryState::Succeeded);
                info!(
                    subject = %subject,
                    request_id = %result.request_id,
                    accepted = result.accepted_count,
                    "{}",
                    catalog.message("messages.sent_success", &[])
                );
                Ok(result)
            }
            Err(e) => {
                self.transition(DeliveryState::Failed);
                match &e {
                    EmailError::AttachmentTooLarge { filename, .. }
                    | EmailError::AttachmentUploadFailed { filename, .. } => error!(
                        subject = %subject,
                        filename = %filename,
                        error = %e,
                        "{}",
                        catalog.message("messages.send_failed", &[])
                    ),
                    EmailError::AttachmentBatchTooLarge { total, limit } => error!(
                        subject = %subject,
                        attachments = attachment_count,
                        total = total,
                        limit = limit,
                        error = %e,
                        "{}",
                        catalog.message("messages.send_failed", &[])
                    ),
                    EmailError::RetriesExhausted { attempts, .. } => error!(
                        subject = %subject,
                        attempts = attempts,
                        error = %e,
                        "{}",
                        catalog.message("messages.send_failed", &[])
                    ),
                    EmailError::ApiError(api) => error!(
                        subject = %subject,
                        status = api.status,
                        provider_code = api.provider_code.as_deref().unwrap_or("-"),
                        error = %e,
                        "{}",
                        catalog.message("messages.send_failed", &[])
                    ),
                    _ => error!(
                        subject = %subject,
                        error = %e,
                        "{}",
                        catalog.message("messages.send_failed", &[])
                    ),
                }
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<SendResult, EmailError> {
        self.message.validate()?;

        let provider = self.provider;
        self.transition(DeliveryState::UploadingAttachments);
        let attachments = std::mem::take(&mut self.message.attachments);
        let file_ids = AttachmentUploader::new(
            &provider.credentials,
            provider.transport.as_ref(),
            provider.catalog.as_ref(),
        )
        .upload_all(attachments)
        .await?;

        let payload = payload::format(&self.message, file_ids);
        let body = serde_json::to_value(&payload)
            .map_err(|e| EmailError::ValidationError(format!("unserializable payload: {}", e)))?;
        provider.log_body("Send payload", &body.to_string());

        self.send_with_retry(body).await
    }

    async fn send_with_retry(&mut self, body: serde_json::Value) -> Result<SendResult, EmailError> {
        let provider = self.provider;
        let policy = provider.retry;
        let mut attempt = 1;

        loop {
            self.transition(DeliveryState::Sending { attempt });

            // Signed right before the call so the header timestamp matches.
            let signed = SignedRequest::new("POST", MAILS_PATH, &provider.credentials);
            let request = ApiRequest::new(
                signed,
                &provider.credentials,
                RequestBody::Json(body.clone()),
            );

            let outcome = provider.transport.execute(request).await.map_err(EmailError::from);
            match outcome {
                Ok(response) => return self.handle_response(response),
                Err(e) if e.is_retryable() && attempt < policy.attempts => {
                    attempt += 1;
                    warn!(
                        subject = %self.message.subject,
                        attempt = attempt,
                        error = %e,
                        "{}",
                        provider.catalog.message(
                            "messages.retry_attempt",
                            &[("attempt", attempt.to_string().as_str())],
                        )
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                Err(EmailError::TransportError(last)) => {
                    return Err(EmailError::RetriesExhausted {
                        attempts: attempt,
                        message: provider.catalog.message(
                            "messages.max_retries_exceeded",
                            &[("max_retries", policy.attempts.to_string().as_str())],
                        ),
                        last,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn handle_response(&self, response: ApiResponse) -> Result<SendResult, EmailError> {
        let provider = self.provider;
        provider.log_body("Send response", &response.body);

        if !response.is_success() {
            let rejection =
                classify::classify(response.status, &response.body, provider.catalog.as_ref());
            return Err(rejection.into());
        }

        // The mail was accepted; a body we can't read doesn't change that.
        let parsed = match serde_json::from_str::<SendResponse>(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    status = response.status,
                    "Could not parse send response body: {}", e
                );
                SendResponse {
                    request_id: None,
                    count: None,
                }
            }
        };

        Ok(SendResult {
            request_id: parsed.request_id.unwrap_or_default(),
            accepted_count: parsed
                .count
                .unwrap_or(self.message.recipients.len() as u32),
        })
    }
}
