//! NCloud provider against a WireMock server, using the real reqwest transport.

use ncloud_mailer::email::providers::ncloud::signer::{
    HEADER_ACCESS_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, SignedRequest, sign,
};
use ncloud_mailer::email::providers::ncloud::transport::{
    ApiRequest, HttpTransport, ReqwestTransport, RequestBody,
};
use ncloud_mailer::email::providers::ncloud::{NcloudProvider, RetryPolicy};
use ncloud_mailer::email::{
    Attachment, Credentials, EmailError, EmailProvider, Mailbox, NcloudConfig, OutboundMessage,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn test_config(base_url: &str) -> NcloudConfig {
    NcloudConfig {
        access_key: "test-key".to_string(),
        secret_key: "test-secret".to_string(),
        endpoint: base_url.to_string(),
        timeout_secs: 5,
        retries: 3,
        retry_delay_ms: 10,
        debug: true,
    }
}

fn message() -> OutboundMessage {
    OutboundMessage::new(
        Mailbox::new("sender@example.com").with_name("Sender"),
        Mailbox::new("recipient@example.com").with_name("Recipient"),
        "Test Email",
    )
    .with_text("Hello World")
}

/// Checks the signature header against the timestamp header of the same request.
fn signed_for(api_path: &'static str) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |request: &Request| {
        let get = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let (Some(timestamp), Some(access_key), Some(signature)) = (
            get(HEADER_TIMESTAMP),
            get(HEADER_ACCESS_KEY),
            get(HEADER_SIGNATURE),
        ) else {
            return false;
        };
        let Ok(timestamp) = timestamp.parse::<i64>() else {
            return false;
        };
        signature == sign("POST", api_path, timestamp, &access_key, "test-secret")
    }
}

#[tokio::test]
async fn test_send_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .and(header(HEADER_ACCESS_KEY, "test-key"))
        .and(header("content-type", "application/json"))
        .and(signed_for("/api/v1/mails"))
        .and(body_partial_json(json!({
            "senderAddress": "sender@example.com",
            "senderName": "Sender",
            "title": "Test Email",
            "body": "Hello World",
            "recipients": [
                {"address": "recipient@example.com", "name": "Recipient", "type": "R"}
            ],
            "individual": false,
            "advertising": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "requestId": "20181203000000000001",
            "count": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = NcloudProvider::new(&test_config(&mock_server.uri())).unwrap();
    let result = provider.send_email(message()).await.unwrap();

    assert_eq!(result.request_id, "20181203000000000001");
    assert_eq!(result.accepted_count, 1);
}

#[tokio::test]
async fn test_send_with_attachment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files"))
        .and(signed_for("/api/v1/files"))
        .and(body_string_contains("name=\"fileList\""))
        .and(body_string_contains("filename=\"report.txt\""))
        .and(body_string_contains("quarterly numbers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "tempRequestId": "temp-1",
            "files": [{"fileName": "report.txt", "fileSize": 17, "fileId": "file-123"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .and(signed_for("/api/v1/mails"))
        .and(body_partial_json(json!({"attachFileIds": ["file-123"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "requestId": "req-with-file",
            "count": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = NcloudProvider::new(&test_config(&mock_server.uri())).unwrap();
    let msg = message().with_attachment(Attachment::new("report.txt", "quarterly numbers"));
    let result = provider.send_email(msg).await.unwrap();

    assert_eq!(result.request_id, "req-with-file");
}

#[tokio::test]
async fn test_multiple_recipients() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .and(body_partial_json(json!({
            "recipients": [
                {"address": "recipient1@example.com", "type": "R"},
                {"address": "recipient2@example.com", "type": "R"},
                {"address": "cc@example.com", "type": "C"},
                {"address": "bcc@example.com", "type": "B"}
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "requestId": "req-multi",
            "count": 4
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let msg = OutboundMessage::new(
        Mailbox::new("sender@example.com"),
        Mailbox::new("recipient1@example.com"),
        "Test Email",
    )
    .with_to(Mailbox::new("recipient2@example.com"))
    .with_cc(Mailbox::new("cc@example.com"))
    .with_bcc(Mailbox::new("bcc@example.com"))
    .with_text("Hello World");

    let provider = NcloudProvider::new(&test_config(&mock_server.uri())).unwrap();
    let result = provider.send_email(msg).await.unwrap();
    assert_eq!(result.accepted_count, 4);
}

#[tokio::test]
async fn test_rejected_send_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "errorCode": "77102",
                "message": "Bad Request",
                "details": "recipients is required"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = NcloudProvider::new(&test_config(&mock_server.uri())).unwrap();
    let err = provider.send_email(message()).await.unwrap_err();

    match err {
        EmailError::ApiError(api) => {
            assert_eq!(api.status, 400);
            assert_eq!(api.message, "Bad Request: Bad request error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "requestId": "after-timeout",
            "count": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport =
        ReqwestTransport::new(mock_server.uri(), Duration::from_millis(300)).unwrap();
    let provider = NcloudProvider::with_transport(
        Credentials::new("test-key", "test-secret").unwrap(),
        Arc::new(transport),
    )
    .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)));

    let result = provider.send_email(message()).await.unwrap();
    assert_eq!(result.request_id, "after-timeout");
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = NcloudConfig {
        retries: 2,
        ..test_config(&format!("http://127.0.0.1:{}", port))
    };
    let provider = NcloudProvider::new(&config).unwrap();
    let err = provider.send_email(message()).await.unwrap_err();

    match err {
        EmailError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_rejection_aborts_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"errorCode": "77101", "message": "Login information error"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = NcloudProvider::new(&test_config(&mock_server.uri())).unwrap();
    let msg = message().with_attachment(Attachment::new("a.txt", "a"));
    let err = provider.send_email(msg).await.unwrap_err();

    match err {
        EmailError::AttachmentUploadFailed { filename, cause } => {
            assert_eq!(filename, "a.txt");
            assert_eq!(cause, "Forbidden: Login information error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_attachment_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = NcloudProvider::new(&test_config(&mock_server.uri())).unwrap();
    let msg = message().with_attachment(Attachment::new(
        "huge.bin",
        vec![0u8; 10 * 1024 * 1024 + 1],
    ));
    let err = provider.send_email(msg).await.unwrap_err();
    assert!(matches!(err, EmailError::AttachmentTooLarge { .. }));
}

#[test]
fn test_constructor_validation() {
    let config = NcloudConfig {
        access_key: String::new(),
        secret_key: String::new(),
        ..NcloudConfig::default()
    };
    assert!(matches!(
        NcloudProvider::new(&config),
        Err(EmailError::ConfigError(_))
    ));
}

#[tokio::test]
async fn test_transport_sends_signed_headers() {
    let mock_server = MockServer::start().await;
    let credentials = Credentials::new("test-key", "test-secret").unwrap();
    let signed = SignedRequest::at("POST", "/api/v1/mails", 1_700_000_000_000, &credentials);
    let expected = sign(
        "POST",
        "/api/v1/mails",
        1_700_000_000_000,
        "test-key",
        "test-secret",
    );

    Mock::given(method("POST"))
        .and(path("/api/v1/mails"))
        .and(header(HEADER_TIMESTAMP, "1700000000000"))
        .and(header(HEADER_ACCESS_KEY, "test-key"))
        .and(header(HEADER_SIGNATURE, expected.as_str()))
        .respond_with(ResponseTemplate::new(202).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(mock_server.uri(), Duration::from_secs(5)).unwrap();
    let request = ApiRequest::new(signed, &credentials, RequestBody::Json(json!({})));
    let response = transport.execute(request).await.unwrap();

    assert_eq!(response.status, 202);
    assert_eq!(response.body, "ok");
}
