//! Emailing the rendered document and auditing the send.
//!
//! [`DeliveryService`] reads the document, hands an [`Envelope`] to a
//! [`Mailer`], and on success appends a [`DeliveryRecord`] to an
//! [`AuditStore`]. A failed send is returned to the caller untouched and no
//! record is written.

use crate::error::DeliveryError;
use crate::models::DeliveryRecord;
use crate::outputs::pdf::RenderedDocument;
use chrono::Utc;
use tracing::{error, info, instrument};

pub mod mailer;
pub mod store;

pub use mailer::{Mailer, SmtpMailer, SmtpSettings};
pub use store::{AuditStore, SqliteAuditStore};

pub const SUBJECT: &str = "Your Daily Dawn News Editorial Vocabulary & Phrases";
pub const BODY: &str = "Attached is your requested PDF document containing vocabulary and phrases from recent Dawn editorials.";
pub const ATTACHMENT_NAME: &str = "DawnEditorialVocabulary.pdf";
pub const DEFAULT_SENDER_NAME: &str = "Dawn News Bot";

/// One outgoing message with its single PDF attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: String,
    pub subject: &'static str,
    pub body: &'static str,
    pub attachment_name: &'static str,
    pub attachment: Vec<u8>,
}

impl Envelope {
    pub fn new(to: &str, attachment: Vec<u8>) -> Self {
        Self {
            to: to.to_string(),
            subject: SUBJECT,
            body: BODY,
            attachment_name: ATTACHMENT_NAME,
            attachment,
        }
    }
}

/// Sends documents and records each successful send.
#[derive(Debug)]
pub struct DeliveryService<M, S> {
    mailer: M,
    store: S,
    sender_name: String,
}

impl<M, S> DeliveryService<M, S>
where
    M: Mailer,
    S: AuditStore,
{
    pub fn new(mailer: M, store: S, sender_name: impl Into<String>) -> Self {
        Self {
            mailer,
            store,
            sender_name: sender_name.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Email `document` to `recipient`.
    ///
    /// The audit write happens only after the mailer reports success. If that
    /// write fails the error is logged; the mail has already gone out.
    ///
    /// # Arguments
    ///
    /// * `document` - Rendered PDF, on disk or in memory
    /// * `recipient` - Destination address
    ///
    /// # Returns
    ///
    /// The [`DeliveryRecord`] for the sent message, or the mailer's error
    /// unchanged.
    #[instrument(level = "info", skip(self, document))]
    pub async fn deliver(
        &self,
        document: &RenderedDocument,
        recipient: &str,
    ) -> Result<DeliveryRecord, DeliveryError> {
        let attachment = document.bytes().await?;
        let envelope = Envelope::new(recipient, attachment);
        let message_id = self.mailer.send(&envelope).await?;
        info!(%message_id, "Document delivered");

        let record = DeliveryRecord {
            recipient_email: recipient.to_string(),
            sender_name: self.sender_name.clone(),
            pdf_file_name: ATTACHMENT_NAME.to_string(),
            timestamp: Utc::now(),
            message_id,
        };
        if let Err(e) = self.store.record(&record).await {
            error!(error = %e, message_id = %record.message_id, "Failed to record delivery");
        }
        Ok(record)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Mailer that keeps every envelope and hands out sequential ids.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        pub sent: RefCell<Vec<Envelope>>,
        pub fail: bool,
        counter: Cell<usize>,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, envelope: &Envelope) -> Result<String, DeliveryError> {
            if self.fail {
                return Err(DeliveryError::NotConfigured(envelope.to.clone()));
            }
            self.sent.borrow_mut().push(envelope.clone());
            self.counter.set(self.counter.get() + 1);
            Ok(format!("<msg-{}@example.com>", self.counter.get()))
        }
    }

    fn service(mailer: RecordingMailer) -> DeliveryService<RecordingMailer, SqliteAuditStore> {
        DeliveryService::new(
            mailer,
            SqliteAuditStore::new("sqlite::memory:"),
            DEFAULT_SENDER_NAME,
        )
    }

    #[tokio::test]
    async fn test_deliver_sends_and_records() {
        let service = service(RecordingMailer::default());
        let document = RenderedDocument::Buffer(b"%PDF-1.3".to_vec());

        let record = service.deliver(&document, "reader@example.com").await.unwrap();
        assert_eq!(record.message_id, "<msg-1@example.com>");
        assert_eq!(record.sender_name, DEFAULT_SENDER_NAME);
        assert_eq!(record.pdf_file_name, ATTACHMENT_NAME);

        let sent = service.mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, SUBJECT);
        assert_eq!(sent[0].body, BODY);
        assert_eq!(sent[0].attachment, b"%PDF-1.3".to_vec());

        let records = service.store().records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recipient_email, "reader@example.com");
    }

    #[tokio::test]
    async fn test_deliver_reads_file_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-file").unwrap();

        let service = service(RecordingMailer::default());
        service
            .deliver(&RenderedDocument::File(path), "reader@example.com")
            .await
            .unwrap();
        assert_eq!(service.mailer.sent.borrow()[0].attachment, b"%PDF-file".to_vec());
    }

    #[tokio::test]
    async fn test_failed_send_writes_no_record() {
        let service = service(RecordingMailer::failing());
        let document = RenderedDocument::Buffer(Vec::new());

        let err = service.deliver(&document, "reader@example.com").await.unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured(_)));
        assert!(service.store().records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_delivery() {
        let tmp = tempfile::tempdir().unwrap();
        let unreachable = tmp.path().join("missing").join("audit.db");
        let service = DeliveryService::new(
            RecordingMailer::default(),
            SqliteAuditStore::new(format!("sqlite://{}", unreachable.display())),
            DEFAULT_SENDER_NAME,
        );

        let record = service
            .deliver(&RenderedDocument::Buffer(Vec::new()), "reader@example.com")
            .await
            .unwrap();
        assert!(!record.message_id.is_empty());
        assert_eq!(service.mailer.sent.borrow().len(), 1);
    }
}
