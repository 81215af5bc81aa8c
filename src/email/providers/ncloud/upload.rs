use serde::Deserialize;
use tracing::{debug, info, warn};

use super::classify::classify;
use super::signer::SignedRequest;
use super::transport::{ApiRequest, HttpTransport, RequestBody};
use crate::email::catalog::MessageCatalog;
use crate::email::{Attachment, Credentials, EmailError, FileId};

pub const FILES_PATH: &str = "/api/v1/files";
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_TOTAL_SIZE: usize = 20 * 1024 * 1024;

const UPLOAD_FIELD: &str = "fileList";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    file_id: Option<String>,
}

fn check_file_size(attachment: &Attachment) -> Result<(), EmailError> {
    if attachment.size() > MAX_FILE_SIZE {
        return Err(EmailError::AttachmentTooLarge {
            filename: attachment.filename.clone(),
            size: attachment.size(),
            limit: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

/// Validates the whole batch before anything is uploaded: each file in order,
/// then the combined size.
pub fn check_limits(attachments: &[Attachment]) -> Result<(), EmailError> {
    attachments.iter().try_for_each(check_file_size)?;

    let total: usize = attachments.iter().map(Attachment::size).sum();
    if total > MAX_TOTAL_SIZE {
        return Err(EmailError::AttachmentBatchTooLarge {
            total,
            limit: MAX_TOTAL_SIZE,
        });
    }
    Ok(())
}

pub struct AttachmentUploader<'a> {
    credentials: &'a Credentials,
    transport: &'a dyn HttpTransport,
    catalog: &'a dyn MessageCatalog,
}

impl<'a> AttachmentUploader<'a> {
    pub fn new(
        credentials: &'a Credentials,
        transport: &'a dyn HttpTransport,
        catalog: &'a dyn MessageCatalog,
    ) -> Self {
        Self {
            credentials,
            transport,
            catalog,
        }
    }

    /// Uploads every attachment one at a time, stopping at the first failure.
    pub async fn upload_all(
        &self,
        attachments: Vec<Attachment>,
    ) -> Result<Vec<FileId>, EmailError> {
        check_limits(&attachments)?;

        let mut file_ids = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            file_ids.push(self.upload(attachment).await?);
        }
        Ok(file_ids)
    }

    /// Uploads one attachment. The bytes are moved into the request and are
    /// gone once this returns.
    pub async fn upload(&self, attachment: Attachment) -> Result<FileId, EmailError> {
        check_file_size(&attachment)?;

        let Attachment { filename, content } = attachment;
        info!(
            filename = %filename,
            size = content.len(),
            "{}",
            self.catalog.message(
                "messages.attachment_upload_start",
                &[("filename", filename.as_str())],
            )
        );

        let signed = SignedRequest::new("POST", FILES_PATH, self.credentials);
        let request = ApiRequest::new(
            signed,
            self.credentials,
            RequestBody::File {
                field: UPLOAD_FIELD,
                filename: filename.clone(),
                content,
            },
        );

        let failed = |cause: String| {
            warn!(
                filename = %filename,
                cause = %cause,
                "{}",
                self.catalog.message(
                    "messages.attachment_upload_failed",
                    &[("filename", filename.as_str())],
                )
            );
            EmailError::AttachmentUploadFailed {
                filename: filename.clone(),
                cause,
            }
        };

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => return Err(failed(e.to_string())),
        };
        debug!(status = response.status, body = %response.body, "File upload response");

        if !response.is_success() {
            let rejection = classify(response.status, &response.body, self.catalog);
            return Err(failed(rejection.message));
        }

        let file_id = serde_json::from_str::<UploadResponse>(&response.body)
            .ok()
            .and_then(|parsed| parsed.files.into_iter().next())
            .and_then(|file| file.file_id)
            .filter(|id| !id.trim().is_empty());

        match file_id {
            Some(id) => {
                info!(
                    filename = %filename,
                    file_id = %id,
                    "{}",
                    self.catalog.message(
                        "messages.attachment_upload_success",
                        &[("filename", filename.as_str())],
                    )
                );
                Ok(FileId::new(id))
            }
            None => Err(failed("response did not contain a file id".to_string())),
        }
    }
}
