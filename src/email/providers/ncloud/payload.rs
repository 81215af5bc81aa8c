use serde::Serialize;

use crate::email::{FileId, OutboundMessage, RecipientRole};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMailRequest {
    pub sender_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub title: String,
    pub body: String,
    pub recipients: Vec<RecipientPayload>,
    pub individual: bool,
    pub advertising: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attach_file_ids: Vec<FileId>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipientPayload {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

pub fn role_code(role: RecipientRole) -> &'static str {
    match role {
        RecipientRole::To => "R",
        RecipientRole::Cc => "C",
        RecipientRole::Bcc => "B",
    }
}

/// Builds the send request body. The message must already be validated.
pub fn format(message: &OutboundMessage, file_ids: Vec<FileId>) -> SendMailRequest {
    let recipients = message
        .recipients
        .iter()
        .map(|recipient| RecipientPayload {
            address: recipient.mailbox.address.clone(),
            name: recipient.mailbox.name.clone(),
            kind: role_code(recipient.role),
        })
        .collect();

    SendMailRequest {
        sender_address: message.from.address.clone(),
        sender_name: message.from.name.clone(),
        title: message.subject.clone(),
        body: message.body.preferred().to_string(),
        recipients,
        individual: false,
        advertising: false,
        attach_file_ids: file_ids,
    }
}
