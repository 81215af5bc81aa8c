use serde_json::Value;

use crate::email::ApiError;
use crate::email::catalog::MessageCatalog;

/// Error codes documented for the Cloud Outbound Mailer API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    MethodNotAllowed,
    UnsupportedMediaType,
    LoginInformation,
    BadRequest,
    ResourceNotFound,
    PermissionDenied,
    SubscriptionRequired,
    DefaultProjectMissing,
    ExternalSystemError,
    InternalServerError,
}

const CODES: &[(ProviderErrorCode, &str)] = &[
    (ProviderErrorCode::MethodNotAllowed, "77001"),
    (ProviderErrorCode::UnsupportedMediaType, "77002"),
    (ProviderErrorCode::LoginInformation, "77101"),
    (ProviderErrorCode::BadRequest, "77102"),
    (ProviderErrorCode::ResourceNotFound, "77103"),
    (ProviderErrorCode::PermissionDenied, "77201"),
    (ProviderErrorCode::SubscriptionRequired, "77202"),
    (ProviderErrorCode::DefaultProjectMissing, "77301"),
    (ProviderErrorCode::ExternalSystemError, "77302"),
    (ProviderErrorCode::InternalServerError, "77303"),
];

impl ProviderErrorCode {
    pub fn from_code(code: &str) -> Option<Self> {
        CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(variant, _)| *variant)
    }

    pub fn code(self) -> &'static str {
        CODES
            .iter()
            .find(|(variant, _)| *variant == self)
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    pub fn catalog_key(self) -> String {
        format!("errors.{}", self.code())
    }
}

/// Pulls the provider error code out of a response body, if there is one.
pub fn extract_error_code(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        json.pointer("/error/errorCode"),
        json.get("errorCode"),
        json.get("code"),
    ];
    candidates.into_iter().flatten().find_map(|value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn status_label(status: u16, catalog: &dyn MessageCatalog) -> String {
    catalog
        .lookup(&format!("status.{}", status))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

pub fn classify(status: u16, body: &str, catalog: &dyn MessageCatalog) -> ApiError {
    let provider_code = extract_error_code(body);

    let detail = match &provider_code {
        None => catalog.message("messages.unknown_error", &[]),
        Some(code) => match ProviderErrorCode::from_code(code) {
            Some(known) => catalog.message(&known.catalog_key(), &[]),
            None => catalog.message("messages.unknown_error_code", &[("code", code.as_str())]),
        },
    };

    ApiError {
        status,
        provider_code,
        message: format!("{}: {}", status_label(status, catalog), detail),
    }
}
