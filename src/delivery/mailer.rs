//! Outbound mail.
//!
//! [`SmtpMailer`] sends through an authenticated SMTP relay with `lettre`.
//! Each message gets a `Message-ID` of the form `<uuid@sender-domain>`; that
//! id is what the audit record stores.

use crate::delivery::Envelope;
use crate::error::DeliveryError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use once_cell::sync::Lazy;
use tracing::{info, instrument};
use uuid::Uuid;

static PDF_CONTENT_TYPE: Lazy<ContentType> =
    Lazy::new(|| ContentType::parse("application/pdf").expect("static MIME type is valid"));

/// Sends one envelope and returns the provider message id.
pub trait Mailer {
    async fn send(&self, envelope: &Envelope) -> Result<String, DeliveryError>;
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub relay: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sender_name: String,
}

struct Configured {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

/// Mailer backed by an authenticated SMTP relay.
///
/// Without credentials the mailer still constructs, but every send fails with
/// [`DeliveryError::NotConfigured`].
pub struct SmtpMailer {
    configured: Option<Configured>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("sender", &self.configured.as_ref().map(|c| c.sender.to_string()))
            .finish()
    }
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let (Some(user), Some(password)) = (&settings.user, &settings.password) else {
            return Ok(Self { configured: None });
        };
        let sender = Mailbox::new(Some(settings.sender_name.clone()), user.parse()?);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.relay)?
            .credentials(Credentials::new(user.clone(), password.clone()))
            .build();
        info!(relay = %settings.relay, sender = %sender, "SMTP transport configured");
        Ok(Self {
            configured: Some(Configured { sender, transport }),
        })
    }
}

impl Mailer for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(to = %envelope.to))]
    async fn send(&self, envelope: &Envelope) -> Result<String, DeliveryError> {
        let Some(configured) = &self.configured else {
            return Err(DeliveryError::NotConfigured(envelope.to.clone()));
        };
        let message_id = new_message_id(&configured.sender);
        let message = build_message(&configured.sender, envelope, &message_id)?;
        configured.transport.send(message).await?;
        info!(%message_id, "PDF sent");
        Ok(message_id)
    }
}

fn new_message_id(sender: &Mailbox) -> String {
    format!("<{}@{}>", Uuid::new_v4(), sender.email.domain())
}

/// Assemble the MIME message: a plain-text body plus the PDF attachment.
pub fn build_message(
    sender: &Mailbox,
    envelope: &Envelope,
    message_id: &str,
) -> Result<Message, DeliveryError> {
    let attachment = Attachment::new(envelope.attachment_name.to_string())
        .body(envelope.attachment.clone(), PDF_CONTENT_TYPE.clone());
    let message = Message::builder()
        .from(sender.clone())
        .to(envelope.to.parse::<Mailbox>()?)
        .subject(envelope.subject)
        .message_id(Some(message_id.to_string()))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(envelope.body.to_string()))
                .singlepart(attachment),
        )?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Mailbox {
        Mailbox::new(
            Some("Dawn News Bot".to_string()),
            "bot@example.com".parse().unwrap(),
        )
    }

    #[test]
    fn test_build_message_carries_subject_and_attachment() {
        let envelope = Envelope::new("reader@example.com", b"%PDF-1.3".to_vec());
        let message = build_message(&sender(), &envelope, "<id-1@example.com>").unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("Subject: Your Daily Dawn News Editorial Vocabulary & Phrases"));
        assert!(raw.contains("<id-1@example.com>"));
        assert!(raw.contains("reader@example.com"));
        assert!(raw.contains("DawnEditorialVocabulary.pdf"));
        assert!(raw.contains("application/pdf"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let envelope = Envelope::new("not an address", Vec::new());
        let err = build_message(&sender(), &envelope, "<id@example.com>").unwrap_err();
        assert!(matches!(err, DeliveryError::Address(_)));
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let id = new_message_id(&sender());
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[tokio::test]
    async fn test_send_without_credentials_fails() {
        let mailer = SmtpMailer::new(&SmtpSettings {
            relay: "smtp.gmail.com".to_string(),
            user: None,
            password: None,
            sender_name: "Dawn News Bot".to_string(),
        })
        .unwrap();
        let envelope = Envelope::new("reader@example.com", Vec::new());
        let err = mailer.send(&envelope).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured(to) if to == "reader@example.com"));
    }
}
