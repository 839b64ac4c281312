//! Append-only audit log of sent documents.
//!
//! [`SqliteAuditStore`] is the persistence handle. The entry point builds one
//! and passes it down. The pool behind it opens on the first write and stays
//! open until [`AuditStore::close`] is called; the next write after a close
//! opens a fresh pool, so a long-lived process can release the handle between
//! runs and keep using it.

use crate::models::DeliveryRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument};

const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS sent_emails (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipient_email TEXT NOT NULL,
        sender_name TEXT NOT NULL,
        pdf_file_name TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        message_id TEXT NOT NULL
    )
    "#];

/// Where delivery records are persisted.
pub trait AuditStore {
    async fn record(&self, record: &DeliveryRecord) -> Result<(), sqlx::Error>;

    /// Release the underlying connection. The next write reconnects.
    async fn close(&self);
}

/// SQLite-backed [`AuditStore`].
#[derive(Debug)]
pub struct SqliteAuditStore {
    url: String,
    pool: Mutex<Option<SqlitePool>>,
}

impl SqliteAuditStore {
    /// Create a handle for `url` (e.g. `sqlite://editorial_vocab.db`).
    /// Nothing is opened until the first write.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: Mutex::new(None),
        }
    }

    /// The open pool, connecting and migrating first if there is none.
    async fn pool(&self) -> Result<SqlitePool, sqlx::Error> {
        let mut slot = self.pool.lock().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let options = SqliteConnectOptions::from_str(&self.url)?.create_if_missing(true);
        // One long-lived connection; an in-memory database lives only as long as it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(Option::<Duration>::None)
            .max_lifetime(Option::<Duration>::None)
            .connect_with(options)
            .await?;
        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&pool).await?;
        }
        info!(url = %self.url, "Audit store connected");
        *slot = Some(pool.clone());
        Ok(pool)
    }
}

impl AuditStore for SqliteAuditStore {
    #[instrument(level = "info", skip_all, fields(message_id = %record.message_id))]
    async fn record(&self, record: &DeliveryRecord) -> Result<(), sqlx::Error> {
        let pool = self.pool().await?;
        sqlx::query(
            r#"
            INSERT INTO sent_emails
            (recipient_email, sender_name, pdf_file_name, timestamp, message_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.recipient_email)
        .bind(&record.sender_name)
        .bind(&record.pdf_file_name)
        .bind(record.timestamp.to_rfc3339())
        .bind(&record.message_id)
        .execute(&pool)
        .await?;
        info!("Delivery recorded");
        Ok(())
    }

    async fn close(&self) {
        let pool = self.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            info!(url = %self.url, "Audit store closed");
        }
    }
}

#[cfg(test)]
impl SqliteAuditStore {
    pub async fn records(&self) -> Result<Vec<DeliveryRecord>, sqlx::Error> {
        use chrono::{DateTime, Utc};
        use sqlx::Row;

        let rows = sqlx::query("SELECT * FROM sent_emails ORDER BY id")
            .fetch_all(&self.pool().await?)
            .await?;
        rows.into_iter()
            .map(|row| {
                let timestamp: String = row.get("timestamp");
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| sqlx::Error::Decode(e.into()))?
                    .with_timezone(&Utc);
                Ok(DeliveryRecord {
                    recipient_email: row.get("recipient_email"),
                    sender_name: row.get("sender_name"),
                    pdf_file_name: row.get("pdf_file_name"),
                    timestamp,
                    message_id: row.get("message_id"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str) -> DeliveryRecord {
        DeliveryRecord {
            recipient_email: "reader@example.com".to_string(),
            sender_name: "Dawn News Bot".to_string(),
            pdf_file_name: "DawnEditorialVocabulary.pdf".to_string(),
            timestamp: Utc::now(),
            message_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_are_appended() {
        let store = SqliteAuditStore::new("sqlite::memory:");
        store.record(&record("<a@example.com>")).await.unwrap();
        store.record(&record("<b@example.com>")).await.unwrap();

        let records = store.records().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.message_id.as_str()).collect();
        assert_eq!(ids, vec!["<a@example.com>", "<b@example.com>"]);
        assert_eq!(records[0].pdf_file_name, "DawnEditorialVocabulary.pdf");
    }

    #[tokio::test]
    async fn test_file_database_persists_across_handles() {
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", tmp.path().join("audit.db").display());

        let first = SqliteAuditStore::new(url.clone());
        first.record(&record("<a@example.com>")).await.unwrap();
        first.close().await;

        let second = SqliteAuditStore::new(url);
        assert_eq!(second.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_after_close_reopens() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteAuditStore::new(format!(
            "sqlite://{}",
            tmp.path().join("audit.db").display()
        ));
        store.record(&record("<a@example.com>")).await.unwrap();
        store.close().await;

        store.record(&record("<b@example.com>")).await.unwrap();
        let ids: Vec<String> = store
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.message_id)
            .collect();
        assert_eq!(ids, vec!["<a@example.com>", "<b@example.com>"]);
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let store = SqliteAuditStore::new("sqlite::memory:");
        store.record(&record("<a@example.com>")).await.unwrap();
        store.close().await;
        store.close().await;
        assert!(store.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_before_use_is_noop() {
        let store = SqliteAuditStore::new("sqlite::memory:");
        store.close().await;
        store.record(&record("<a@example.com>")).await.unwrap();
    }
}
