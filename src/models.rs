//! Data models that flow through the editorial pipeline.
//!
//! Each stage owns one type:
//! - [`DateRange`]: the inclusive span of days requested by the caller
//! - [`EditorialLink`]: an article URL discovered on a daily index page
//! - [`ArticleContent`]: title and body text extracted from one article
//! - [`VocabularyResult`]: the model-derived word and phrase lists
//! - [`DeliveryRecord`]: the audit entry written after a successful send
//!
//! [`VocabularyResult`] is also the element type of the JSON snapshot, so its
//! serialized field names (`title`, `words`, `phrases`) are part of that file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format used for every date the pipeline parses or prints.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive span of calendar days.
///
/// A range whose start lies after its end is valid and simply yields no days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse a pair of `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)?,
            end: NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)?,
        })
    }

    /// Every day from `start` through `end`, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(|day| *day <= end)
            .collect()
    }

    /// Caption shown under the document title, e.g. `2025-05-30 to 2025-05-31`.
    pub fn caption(&self) -> String {
        format!(
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// A candidate editorial URL found on one day's index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorialLink {
    pub url: String,
    /// The index date the link was discovered on.
    pub date: NaiveDate,
}

impl fmt::Display for EditorialLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Raw text of one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    pub url: String,
    pub title: String,
    /// Paragraph texts, each followed by a newline.
    pub body: String,
}

/// Study material derived from one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyResult {
    pub title: String,
    /// Cleaned `term: meaning` lines.
    pub words: String,
    /// Cleaned `phrase: meaning` lines.
    pub phrases: String,
}

/// Audit entry for a document that was actually sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub recipient_email: String,
    pub sender_name: String,
    pub pdf_file_name: String,
    pub timestamp: DateTime<Utc>,
    pub message_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::parse("2025-05-30", "2025-05-30").unwrap();
        assert_eq!(range.days(), vec![day("2025-05-30")]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = DateRange::parse("2025-06-02", "2025-05-30").unwrap();
        assert!(range.days().is_empty());
    }

    #[test]
    fn test_range_crosses_month_boundary() {
        let range = DateRange::parse("2025-05-30", "2025-06-02").unwrap();
        let days: Vec<String> = range.days().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            days,
            vec!["2025-05-30", "2025-05-31", "2025-06-01", "2025-06-02"]
        );
    }

    #[test]
    fn test_range_rejects_bad_format() {
        assert!(DateRange::parse("30/05/2025", "2025-05-30").is_err());
        assert!(DateRange::parse("2025-05-30", "2025-02-30").is_err());
    }

    #[test]
    fn test_caption() {
        let range = DateRange::parse("2025-05-30", "2025-05-31").unwrap();
        assert_eq!(range.caption(), "2025-05-30 to 2025-05-31");
    }

    #[test]
    fn test_vocabulary_result_field_names() {
        let result = VocabularyResult {
            title: "Crypto fever".to_string(),
            words: "frenzy: wild excitement".to_string(),
            phrases: String::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["title"], "Crypto fever");
        assert_eq!(json["words"], "frenzy: wild excitement");
        assert_eq!(json["phrases"], "");
    }

    #[test]
    fn test_delivery_record_uses_camel_case() {
        let record = DeliveryRecord {
            recipient_email: "reader@example.com".to_string(),
            sender_name: "Dawn News Bot".to_string(),
            pdf_file_name: "DawnEditorialVocabulary.pdf".to_string(),
            timestamp: Utc::now(),
            message_id: "<abc@example.com>".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("recipientEmail"));
        assert!(json.contains("pdfFileName"));
        assert!(json.contains("messageId"));
    }
}
