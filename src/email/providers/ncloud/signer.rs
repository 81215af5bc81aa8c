use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::email::Credentials;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_TIMESTAMP: &str = "x-ncp-apigw-timestamp";
pub const HEADER_ACCESS_KEY: &str = "x-ncp-iam-access-key";
pub const HEADER_SIGNATURE: &str = "x-ncp-apigw-signature-v2";

/// Computes the `x-ncp-apigw-signature-v2` value for one request.
pub fn sign(
    method: &str,
    path: &str,
    timestamp: i64,
    access_key: &str,
    secret_key: &str,
) -> String {
    let message = format!("{} {}\n{}\n{}", method, path, timestamp, access_key);

    let mut mac = match HmacSha256::new_from_slice(secret_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(message.as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Timestamp and signature for a single HTTP call. Build one per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub timestamp: i64,
    pub signature: String,
    pub method: &'static str,
    pub path: &'static str,
}

impl SignedRequest {
    pub fn new(method: &'static str, path: &'static str, credentials: &Credentials) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self::at(method, path, timestamp, credentials)
    }

    pub fn at(
        method: &'static str,
        path: &'static str,
        timestamp: i64,
        credentials: &Credentials,
    ) -> Self {
        let signature = sign(
            method,
            path,
            timestamp,
            credentials.access_key(),
            credentials.secret_key(),
        );
        Self {
            timestamp,
            signature,
            method,
            path,
        }
    }

    /// The three authentication headers, in the order they are sent.
    pub fn headers(&self, access_key: &str) -> [(&'static str, String); 3] {
        [
            (HEADER_TIMESTAMP, self.timestamp.to_string()),
            (HEADER_ACCESS_KEY, access_key.to_string()),
            (HEADER_SIGNATURE, self.signature.clone()),
        ]
    }
}
