use serde::{Deserialize, Serialize};
use std::fmt;

use crate::email::EmailError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub address: String,
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientRole {
    To,
    Cc,
    Bcc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub mailbox: Mailbox,
    pub role: RecipientRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailBody {
    Text(String),
    Html(String),
    Both { text: String, html: String },
}

impl EmailBody {
    /// The single body sent over the wire: HTML when there is one.
    pub fn preferred(&self) -> &str {
        match self {
            EmailBody::Text(text) => text,
            EmailBody::Html(html) => html,
            EmailBody::Both { html, .. } => html,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

// Attachment bytes can be large, keep them out of debug output.
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("size", &self.content.len())
            .finish()
    }
}

/// Identifier assigned by the provider to an uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub from: Mailbox,
    pub recipients: Vec<Recipient>,
    pub subject: String,
    pub body: EmailBody,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn new(from: Mailbox, to: Mailbox, subject: impl Into<String>) -> Self {
        Self {
            from,
            recipients: vec![Recipient {
                mailbox: to,
                role: RecipientRole::To,
            }],
            subject: subject.into(),
            body: EmailBody::Text(String::new()),
            attachments: Vec::new(),
        }
    }

    pub fn with_to(self, mailbox: Mailbox) -> Self {
        self.with_recipient(mailbox, RecipientRole::To)
    }

    pub fn with_cc(self, mailbox: Mailbox) -> Self {
        self.with_recipient(mailbox, RecipientRole::Cc)
    }

    pub fn with_bcc(self, mailbox: Mailbox) -> Self {
        self.with_recipient(mailbox, RecipientRole::Bcc)
    }

    pub fn with_recipient(mut self, mailbox: Mailbox, role: RecipientRole) -> Self {
        self.recipients.push(Recipient { mailbox, role });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = EmailBody::Text(text.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.body = EmailBody::Html(html.into());
        self
    }

    pub fn with_both(mut self, text: impl Into<String>, html: impl Into<String>) -> Self {
        self.body = EmailBody::Both {
            text: text.into(),
            html: html.into(),
        };
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn recipients_with_role(&self, role: RecipientRole) -> impl Iterator<Item = &Mailbox> {
        self.recipients
            .iter()
            .filter(move |r| r.role == role)
            .map(|r| &r.mailbox)
    }

    /// Checks the caller contract: a sender and at least one To recipient.
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.from.address.trim().is_empty() {
            return Err(EmailError::ValidationError(
                "sender address is required".to_string(),
            ));
        }

        if let Some(blank) = self
            .recipients
            .iter()
            .find(|r| r.mailbox.address.trim().is_empty())
        {
            return Err(EmailError::ValidationError(format!(
                "{:?} recipient has an empty address",
                blank.role
            )));
        }

        if self.recipients_with_role(RecipientRole::To).next().is_none() {
            return Err(EmailError::ValidationError(
                "at least one To recipient is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub request_id: String,
    pub accepted_count: u32,
}
