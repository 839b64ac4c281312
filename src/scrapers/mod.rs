//! Editorial source scraping.
//!
//! Scraping follows the same two-phase pattern for every run:
//!
//! 1. **Indexing**: fetch one index page per day and collect up to
//!    [`MAX_LINKS_PER_DAY`] article URLs that match the source's article shape
//! 2. **Fetching**: download each article and pull out its title and body
//!
//! Both phases are best-effort. A day whose index cannot be fetched, or an
//! article that cannot be fetched or parsed, is logged and skipped.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use reqwest::Client;
use url::Url;

pub mod dawn;

/// Upper bound on accepted links for a single index page.
pub const MAX_LINKS_PER_DAY: usize = 3;

const USER_AGENT: &str = concat!("editorial_vocab/", env!("CARGO_PKG_VERSION"));

static DEFAULT_INDEX_BASE: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://www.dawn.com/newspaper/editorial/").expect("static URL is valid")
});

/// Where editorials are discovered and what an article URL looks like.
#[derive(Debug, Clone)]
pub struct EditorialSource {
    /// Index page base; the `YYYY-MM-DD` date is appended to it.
    pub index_base: Url,
    /// Scheme and host every accepted article URL must start with.
    pub article_origin: String,
    article_pattern: Regex,
}

impl EditorialSource {
    pub fn new(index_base: Url, article_origin: &str) -> Self {
        let origin = article_origin.trim_end_matches('/');
        let pattern = format!(r"^{}/news/\d+/[a-z0-9-]+$", regex::escape(origin));
        let article_pattern = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .expect("escaped origin always forms a valid pattern");
        Self {
            index_base,
            article_origin: origin.to_string(),
            article_pattern,
        }
    }

    /// Dawn's daily editorial pages.
    pub fn dawn() -> Self {
        Self::new(DEFAULT_INDEX_BASE.clone(), "https://www.dawn.com")
    }

    /// Whether `href` has the shape `<origin>/news/<digits>/<slug>`.
    pub fn is_article_url(&self, href: &str) -> bool {
        self.article_pattern.is_match(href)
    }
}

impl Default for EditorialSource {
    fn default() -> Self {
        Self::dawn()
    }
}

/// HTTP client shared by index and article fetches.
///
/// Timeouts are left at the transport defaults.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_article_shape() {
        let source = EditorialSource::dawn();
        assert!(source.is_article_url("https://www.dawn.com/news/1914643/crypto-fever"));
        assert!(source.is_article_url("https://www.dawn.com/news/1914007/going-cashless"));
    }

    #[test]
    fn test_article_shape_is_case_insensitive() {
        let source = EditorialSource::dawn();
        assert!(source.is_article_url("HTTPS://WWW.DAWN.COM/news/1914643/Crypto-Fever"));
    }

    #[test]
    fn test_rejects_well_formed_urls_of_other_shapes() {
        let source = EditorialSource::dawn();
        for href in [
            "https://www.dawn.com/newspaper/editorial/2025-05-30",
            "https://www.dawn.com/news/crypto-fever",
            "https://www.dawn.com/news/1914643/crypto_fever",
            "https://www.dawn.com/news/1914643/crypto-fever/",
            "https://www.dawn.com/news/1914643/crypto-fever?ref=home",
            "http://www.dawn.com/news/1914643/crypto-fever",
            "https://images.dawn.com/news/1914643/crypto-fever",
            "https://www.dawn.com.evil.io/news/1914643/crypto-fever",
            "/news/1914643/crypto-fever",
        ] {
            assert!(!source.is_article_url(href), "accepted {href}");
        }
    }

    #[test]
    fn test_custom_origin_is_escaped() {
        let source = EditorialSource::new(
            Url::parse("http://127.0.0.1:8080/newspaper/editorial/").unwrap(),
            "http://127.0.0.1:8080/",
        );
        assert_eq!(source.article_origin, "http://127.0.0.1:8080");
        assert!(source.is_article_url("http://127.0.0.1:8080/news/1/a-b"));
        assert!(!source.is_article_url("http://127a0a0a1:8080/news/1/a-b"));
    }
}
