//! Turns command-line inputs into an [`OutboundMessage`].

use std::path::{Path, PathBuf};

use crate::email::{
    Attachment, EmailBody, EmailConfig, EmailError, Mailbox, OutboundMessage, RecipientRole,
};

/// Message fields as given on the command line, before any files are read.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    /// Overrides `email.from_address`
    pub from: Option<String>,
    /// Overrides `email.from_name`
    pub from_name: Option<String>,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    /// Read in place of `html` when set
    pub html_file: Option<PathBuf>,
    pub attach: Vec<PathBuf>,
}

impl Draft {
    /// Reads the HTML file and attachments, then assembles the message.
    pub async fn into_message(self, email: &EmailConfig) -> Result<OutboundMessage, EmailError> {
        let html = match self.html_file {
            Some(path) => Some(tokio::fs::read_to_string(&path).await?),
            None => self.html,
        };

        let mut sender = email.sender();
        if let Some(address) = self.from {
            sender = Mailbox::new(address);
        }
        if let Some(name) = self.from_name {
            sender.name = Some(name);
        }

        let mut message = OutboundMessage {
            from: sender,
            recipients: Vec::new(),
            subject: self.subject,
            body: select_body(self.text, html),
            attachments: Vec::new(),
        };
        for (addresses, role) in [
            (self.to, RecipientRole::To),
            (self.cc, RecipientRole::Cc),
            (self.bcc, RecipientRole::Bcc),
        ] {
            for address in addresses {
                message = message.with_recipient(Mailbox::new(address), role);
            }
        }
        for path in &self.attach {
            message = message.with_attachment(load_attachment(path).await?);
        }

        Ok(message)
    }
}

pub fn select_body(text: Option<String>, html: Option<String>) -> EmailBody {
    match (text, html) {
        (Some(text), Some(html)) => EmailBody::Both { text, html },
        (None, Some(html)) => EmailBody::Html(html),
        (Some(text), None) => EmailBody::Text(text),
        (None, None) => EmailBody::Text(String::new()),
    }
}

/// Reads a file into an attachment named after the file.
pub async fn load_attachment(path: &Path) -> Result<Attachment, EmailError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            EmailError::ValidationError(format!("invalid attachment path: {:?}", path))
        })?;
    let content = tokio::fs::read(path).await?;
    Ok(Attachment::new(filename, content))
}
