use crate::email::{
    EmailBody, EmailError, EmailProvider, OutboundMessage, RecipientRole, SendResult,
};
use async_trait::async_trait;
use tracing::info;

pub struct NullProvider;

impl NullProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn join_role(message: &OutboundMessage, role: RecipientRole) -> String {
    let joined = message
        .recipients_with_role(role)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

#[async_trait]
impl EmailProvider for NullProvider {
    async fn send_email(&self, message: OutboundMessage) -> Result<SendResult, EmailError> {
        // Same caller contract as a real provider
        message.validate()?;

        let body_preview = message.body.preferred().chars().take(200).collect::<String>();
        let attachments = message
            .attachments
            .iter()
            .map(|a| format!("{} ({} bytes)", a.filename, a.size()))
            .collect::<Vec<_>>()
            .join(", ");

        // Log the email that would have been sent
        info!(
            "NULL EMAIL PROVIDER - Would send email:\n\
             From: {}\n\
             To: {}\n\
             Cc: {}\n\
             Bcc: {}\n\
             Subject: {}\n\
             Attachments: {}\n\
             Body (first 200 chars): {}{}",
            message.from,
            join_role(&message, RecipientRole::To),
            join_role(&message, RecipientRole::Cc),
            join_role(&message, RecipientRole::Bcc),
            message.subject,
            if attachments.is_empty() { "(none)" } else { attachments.as_str() },
            body_preview,
            if body_preview.chars().count() >= 200 { "..." } else { "" }
        );

        // For debugging, also log the full message at debug level
        let full_body = match &message.body {
            EmailBody::Text(text) => format!("Text:\n{}", text),
            EmailBody::Html(html) => format!("HTML:\n{}", html),
            EmailBody::Both { text, html } => format!("Text:\n{}\n\nHTML:\n{}", text, html),
        };

        tracing::debug!(
            "NULL EMAIL PROVIDER - Full email message:\n\
             From: {}\n\
             Recipients: {:?}\n\
             Subject: {}\n\
             Body:\n{}",
            message.from,
            message.recipients,
            message.subject,
            full_body
        );

        Ok(SendResult {
            request_id: format!("null-{}", uuid::Uuid::new_v4()),
            accepted_count: message.recipients.len() as u32,
        })
    }

    fn name(&self) -> &str {
        "Null Email Provider (Logging Only)"
    }
}
