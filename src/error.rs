//! Error types for each fallible stage of the pipeline.
//!
//! Fetch, extraction and generation failures never surface here as run
//! failures: the scrapers and the generator log them and drop the affected
//! date or article. What remains are the errors that abort a run.

use thiserror::Error;

/// Failure while fetching or parsing a page from the editorial source.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Failure while assembling or writing the PDF document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while sending the document.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("no SMTP credentials configured; cannot send to {0}")]
    NotConfigured(String),

    #[error("invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error returned by a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
