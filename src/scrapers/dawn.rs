//! Dawn editorial scraper.
//!
//! Each day's editorials are listed at
//! `https://www.dawn.com/newspaper/editorial/YYYY-MM-DD`, with one
//! `article.story` card per piece. Article pages carry the headline in
//! `.story__title` and the text in `.story__content` paragraphs.

use crate::error::ScrapeError;
use crate::models::{ArticleContent, DATE_FORMAT, DateRange, EditorialLink};
use crate::scrapers::{EditorialSource, MAX_LINKS_PER_DAY};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static LISTING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.story h2 a").unwrap());
static PRIMARY_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.story__title").unwrap());
static SECONDARY_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1.story__title").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".story__content p").unwrap());

/// Index URL for one day.
pub fn index_url(source: &EditorialSource, date: NaiveDate) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}{}", source.index_base, date.format(DATE_FORMAT)))
}

/// Collect editorial links for every day in `range`.
///
/// Days are visited in order, one request at a time. A day whose index page
/// cannot be fetched contributes nothing. Links repeated across days are kept.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `source` - Index location and article URL shape
/// * `range` - Inclusive span of days to visit
///
/// # Returns
///
/// Accepted [`EditorialLink`]s in date order, then in page order within a day.
#[instrument(level = "info", skip(client, source), fields(range = %range.caption()))]
pub async fn index_editorials(
    client: &Client,
    source: &EditorialSource,
    range: &DateRange,
) -> Vec<EditorialLink> {
    let mut links = Vec::new();
    for date in range.days() {
        match index_day(client, source, date).await {
            Ok(day_links) => {
                info!(%date, count = day_links.len(), "Indexed editorials");
                links.extend(day_links);
            }
            Err(e) => warn!(%date, error = %e, "Skipping day; index fetch failed"),
        }
    }
    info!(count = links.len(), "Total editorial links found");
    links
}

async fn index_day(
    client: &Client,
    source: &EditorialSource,
    date: NaiveDate,
) -> Result<Vec<EditorialLink>, ScrapeError> {
    let url = index_url(source, date)?;
    debug!(%url, "Fetching editorial index");
    let html = fetch_html(client, url.as_str()).await?;
    Ok(extract_editorial_links(&html, source, date))
}

/// Pick up to [`MAX_LINKS_PER_DAY`] article links from an index page.
///
/// Anchors are taken in document order; ones whose `href` does not match the
/// article shape are skipped without counting toward the limit.
pub fn extract_editorial_links(
    html: &str,
    source: &EditorialSource,
    date: NaiveDate,
) -> Vec<EditorialLink> {
    let document = Html::parse_document(html);
    document
        .select(&LISTING_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| source.is_article_url(href))
        .take(MAX_LINKS_PER_DAY)
        .map(|href| EditorialLink {
            url: href.to_string(),
            date,
        })
        .collect()
}

/// Fetch and parse one article.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `link` - Article to fetch
///
/// # Returns
///
/// The parsed [`ArticleContent`], or `None` when the page cannot be fetched
/// or has no body text.
#[instrument(level = "info", skip_all, fields(url = %link.url))]
pub async fn fetch_article(client: &Client, link: &EditorialLink) -> Option<ArticleContent> {
    let html = match fetch_html(client, &link.url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Article fetch failed");
            return None;
        }
    };

    let article = parse_article(&html, &link.url);
    match &article {
        Some(a) => info!(title = %a.title, bytes = a.body.len(), "Parsed article"),
        None => warn!("Article page had no body text"),
    }
    article
}

/// Pull the headline and paragraph text out of an article page.
pub fn parse_article(html: &str, url: &str) -> Option<ArticleContent> {
    let document = Html::parse_document(html);

    let mut body = String::new();
    for paragraph in document.select(&PARAGRAPH_SELECTOR) {
        body.extend(paragraph.text());
        body.push('\n');
    }
    if body.trim().is_empty() {
        return None;
    }

    let title = document
        .select(&PRIMARY_TITLE_SELECTOR)
        .next()
        .or_else(|| document.select(&SECONDARY_TITLE_SELECTOR).next())
        .map(|heading| heading.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| url.to_string());

    Some(ArticleContent {
        url: url.to_string(),
        title,
        body,
    })
}

async fn fetch_html(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response.text().await?)
}
