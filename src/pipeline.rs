//! One end-to-end run: scrape, extract, generate, render, deliver.
//!
//! ```text
//! DateRange ─► index_editorials ─► fetch_article ─► generate ─► render ─► deliver
//!                 (per day)          (per link)     (per article)  (once)   (if recipient)
//! ```
//!
//! Links whose article cannot be fetched or whose generation fails are
//! dropped; the run continues with the rest. Rendering, snapshot and
//! delivery failures abort the run with a [`PipelineError`].
//!
//! Extraction and generation may run for several links at once
//! ([`Pipeline::with_concurrency`]); results always come back in link order.

use crate::api::{AskAsync, VocabularyGenerator};
use crate::delivery::{AuditStore, DeliveryService, Mailer};
use crate::error::PipelineError;
use crate::models::{DateRange, DeliveryRecord, EditorialLink, VocabularyResult};
use crate::outputs::pdf::{RenderedDocument, render_to_bytes, render_to_file};
use crate::outputs::{DOCUMENT_FILE_NAME, SNAPSHOT_FILE_NAME, json};
use crate::scrapers::EditorialSource;
use crate::scrapers::dawn::{fetch_article, index_editorials};
use futures::future;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

/// Where the document is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Write the JSON snapshot and the PDF into the output directory.
    File,
    /// Keep the PDF in memory; nothing touches the disk.
    Buffer,
}

/// Parameters of one invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub range: DateRange,
    /// Delivery is skipped when absent or blank.
    pub recipient: Option<String>,
    pub mode: RenderMode,
    /// Close the audit store once the run ends.
    pub release_store: bool,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub results: Vec<VocabularyResult>,
    pub document: RenderedDocument,
    pub delivery: Option<DeliveryRecord>,
}

/// Sequences scraping, generation, rendering and delivery.
pub struct Pipeline<A, M, S> {
    http: Client,
    source: EditorialSource,
    generator: VocabularyGenerator<A>,
    delivery: DeliveryService<M, S>,
    output_dir: PathBuf,
    concurrency: usize,
}

impl<A, M, S> Pipeline<A, M, S>
where
    A: AskAsync<Response = String>,
    M: Mailer,
    S: AuditStore,
{
    pub fn new(
        http: Client,
        source: EditorialSource,
        generator: VocabularyGenerator<A>,
        delivery: DeliveryService<M, S>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http,
            source,
            generator,
            delivery,
            output_dir: output_dir.into(),
            concurrency: 1,
        }
    }

    /// Process up to `concurrency` links at a time (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn delivery(&self) -> &DeliveryService<M, S> {
        &self.delivery
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join(SNAPSHOT_FILE_NAME)
    }

    pub fn document_path(&self) -> PathBuf {
        self.output_dir.join(DOCUMENT_FILE_NAME)
    }

    /// Run the whole pipeline for `request`.
    ///
    /// # Arguments
    ///
    /// * `request` - Date range, render mode, optional recipient and whether
    ///   to release the audit store afterwards
    ///
    /// # Returns
    ///
    /// A [`RunReport`] once the document is produced (and delivered, when a
    /// recipient is given). Render, snapshot and delivery failures abort the
    /// run with a [`PipelineError`]; the store is released either way when
    /// requested.
    #[instrument(level = "info", skip_all, fields(range = %request.range.caption(), mode = ?request.mode))]
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        info!("Starting run");

        let links = index_editorials(&self.http, &self.source, &request.range).await;
        let results = self.collect_vocabulary(&links).await;
        info!(
            links = links.len(),
            successful = results.len(),
            failed = links.len() - results.len(),
            "Completed article processing"
        );

        let report = self.finish(results, request).await;
        self.release_if_requested(request).await;
        info!(elapsed_ms = start.elapsed().as_millis() as u128, ok = report.is_ok(), "Run finished");
        report
    }

    /// Render and deliver an existing snapshot without scraping or generating.
    #[instrument(level = "info", skip_all, fields(snapshot = %snapshot.display()))]
    pub async fn rerender(
        &self,
        snapshot: &Path,
        request: &RunRequest,
    ) -> Result<RunReport, PipelineError> {
        let report = match json::load_snapshot(snapshot).await {
            Ok(results) => self.finish(results, request).await,
            Err(e) => Err(e),
        };
        self.release_if_requested(request).await;
        report
    }

    async fn collect_vocabulary(&self, links: &[EditorialLink]) -> Vec<VocabularyResult> {
        let total = links.len();
        stream::iter(links.iter().enumerate())
            .map(|(index, link)| self.process_link(index, total, link))
            .buffered(self.concurrency)
            .filter_map(future::ready)
            .collect()
            .await
    }

    async fn process_link(
        &self,
        index: usize,
        total: usize,
        link: &EditorialLink,
    ) -> Option<VocabularyResult> {
        info!(position = index + 1, total, url = %link.url, "Processing");
        let article = fetch_article(&self.http, link).await?;
        self.generator.generate(&article).await
    }

    async fn finish(
        &self,
        results: Vec<VocabularyResult>,
        request: &RunRequest,
    ) -> Result<RunReport, PipelineError> {
        let document = match request.mode {
            RenderMode::File => {
                json::write_snapshot(&results, &self.snapshot_path()).await?;
                let path = self.document_path();
                render_to_file(&results, &request.range, &path)?;
                RenderedDocument::File(path)
            }
            RenderMode::Buffer => {
                let (bytes, _) = render_to_bytes(&results, &request.range)?;
                RenderedDocument::Buffer(bytes)
            }
        };

        let recipient = request
            .recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let delivery = match recipient {
            Some(recipient) => Some(self.delivery.deliver(&document, recipient).await?),
            None => {
                info!("No recipient given; skipping delivery");
                None
            }
        };

        Ok(RunReport {
            results,
            document,
            delivery,
        })
    }

    async fn release_if_requested(&self, request: &RunRequest) {
        if request.release_store {
            self.delivery.store().close().await;
        }
    }
}
