//! The HTTP capability the mailer needs: send one signed request, get back a
//! status and body.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

use super::signer::SignedRequest;
use crate::email::{Credentials, EmailError};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connection(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    File {
        field: &'static str,
        filename: String,
        content: Vec<u8>,
    },
}

#[derive(Debug)]
pub struct ApiRequest {
    pub signed: SignedRequest,
    pub access_key: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(signed: SignedRequest, credentials: &Credentials, body: RequestBody) -> Self {
        Self {
            signed,
            access_key: credentials.access_key().to_string(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmailError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let ApiRequest {
            signed,
            access_key,
            body,
        } = request;

        let url = format!("{}{}", self.base_url, signed.path);
        let method = reqwest::Method::from_bytes(signed.method.as_bytes())
            .map_err(|e| TransportError::Request(e.to_string()))?;

        trace!("{} {}", signed.method, url);

        let builder = signed
            .headers(&access_key)
            .into_iter()
            .fold(self.client.request(method, &url), |builder, (name, value)| {
                builder.header(name, value)
            });

        let builder = match body {
            RequestBody::Json(json) => builder.json(&json),
            RequestBody::File {
                field,
                filename,
                content,
            } => {
                let mime = mime_guess::from_path(&filename).first_or_octet_stream();
                let part = reqwest::multipart::Part::bytes(content)
                    .file_name(filename)
                    .mime_str(mime.as_ref())
                    .map_err(|e| TransportError::Request(e.to_string()))?;
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
