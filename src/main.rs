//! # Editorial Vocab
//!
//! Turns a range of daily newspaper editorials into a PDF of vocabulary words
//! and idioms, and emails it.
//!
//! ## Usage
//!
//! ```sh
//! editorial_vocab --start-date 2025-05-30 --end-date 2025-05-31 --email reader@example.com
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: Discover up to three editorial URLs per day
//! 2. **Fetching**: Extract title and body text from each article
//! 3. **Processing**: Ask an LLM for word and phrase lists, one request per article
//! 4. **Output**: Render a paginated PDF (to disk or in memory)
//! 5. **Delivery**: Email the PDF and record the send in an audit log

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod delivery;
mod error;
mod models;
mod outputs;
mod parser;
mod pipeline;
mod scrapers;
mod utils;

use api::{AwfulAskClient, Offline, VocabularyGenerator};
use cli::Cli;
use delivery::{AuditStore, DeliveryService, SmtpMailer, SmtpSettings, SqliteAuditStore};
use error::PipelineError;
use models::DateRange;
use pipeline::{Pipeline, RenderMode, RunRequest};
use scrapers::{EditorialSource, http_client};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env first so RUST_LOG from it reaches the filter.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(local_time = %Local::now(), "editorial_vocab starting up");

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env"),
    }
    let args = Cli::parse();
    debug!(start = %args.start_date, end = %args.end_date, in_memory = args.in_memory, "Parsed CLI arguments");

    let range = DateRange::parse(&args.start_date, &args.end_date).map_err(|e| {
        PipelineError::Config(format!(
            "dates must be YYYY-MM-DD (got {} and {}): {e}",
            args.start_date, args.end_date
        ))
    })?;

    let mode = if args.in_memory {
        RenderMode::Buffer
    } else {
        RenderMode::File
    };
    let output_dir = PathBuf::from(&args.output_dir);
    if mode == RenderMode::File {
        if let Err(e) = ensure_writable_dir(&output_dir).await {
            error!(
                path = %output_dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let mailer = SmtpMailer::new(&SmtpSettings {
        relay: args.smtp_relay.clone(),
        user: args.smtp_user.clone(),
        password: args.smtp_password.clone(),
        sender_name: args.sender_name.clone(),
    })?;
    let store = SqliteAuditStore::new(args.database_url.clone());
    let delivery = DeliveryService::new(mailer, store, args.sender_name.clone());

    let request = RunRequest {
        range,
        recipient: args.email.clone(),
        mode,
        // Shutdown below closes the store on every exit path.
        release_store: false,
    };

    let outcome = match args.from_snapshot.as_deref() {
        None => {
            let model = AwfulAskClient::load(args.config.as_deref(), args.template.as_deref()).await?;
            let pipeline = Pipeline::new(
                http_client()?,
                EditorialSource::dawn(),
                VocabularyGenerator::new(model),
                delivery,
                output_dir,
            )
            .with_concurrency(args.concurrency);
            let outcome = run_until_interrupted(pipeline.run(&request)).await;
            shutdown(pipeline.delivery().store()).await;
            outcome
        }
        Some(snapshot) => {
            info!(snapshot, "Re-rendering saved results");
            let pipeline = Pipeline::new(
                http_client()?,
                EditorialSource::dawn(),
                VocabularyGenerator::new(Offline),
                delivery,
                output_dir,
            );
            let outcome =
                run_until_interrupted(pipeline.rerender(Path::new(snapshot), &request)).await;
            shutdown(pipeline.delivery().store()).await;
            outcome
        }
    };

    let elapsed = start_time.elapsed();
    match outcome {
        Some(Ok(report)) => {
            info!(
                ?elapsed,
                articles = report.results.len(),
                delivered_to = report.delivery.as_ref().map(|d| d.recipient_email.as_str()),
                message_id = report.delivery.as_ref().map(|d| d.message_id.as_str()),
                "Execution complete"
            );
            Ok(())
        }
        Some(Err(e)) => {
            error!(?elapsed, error = %e, "Run failed");
            Err(e.into())
        }
        None => {
            warn!(?elapsed, "Interrupted; run abandoned");
            Ok(())
        }
    }
}

/// Drive `run` to completion unless Ctrl-C arrives first.
async fn run_until_interrupted<F, T>(run: F) -> Option<T>
where
    F: std::future::Future<Output = T>,
{
    tokio::select! {
        outcome = run => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    }
}

/// Release the audit store before the process exits.
async fn shutdown<S: AuditStore>(store: &S) {
    info!("Shutting down");
    store.close().await;
}
