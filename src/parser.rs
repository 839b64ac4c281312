//! Splitting free-text model replies into word and phrase sections.
//!
//! The model is asked for two labelled lists, but nothing enforces the shape
//! of what comes back. The split is a heuristic:
//!
//! - the reply is cut at the first heading matching `#`/`##`, optional
//!   whitespace, then `Phrases` (any case)
//! - text before the cut is the words section
//! - text after the cut is the phrases section
//! - with no such heading the whole reply is the words section and the
//!   phrases section is empty
//!
//! Each section is then cleaned line by line with [`clean_lines`].

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static PHRASES_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)##?\s*Phrases").unwrap());

/// The two raw segments of a model reply, already cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
    pub words: String,
    pub phrases: String,
}

/// Split `reply` at the first phrases heading and clean both halves.
pub fn split_sections(reply: &str) -> Sections {
    let (words, phrases) = match PHRASES_HEADING.find(reply) {
        Some(m) => (&reply[..m.start()], &reply[m.end()..]),
        None => (reply, ""),
    };
    Sections {
        words: clean_lines(words),
        phrases: clean_lines(phrases),
    }
}

/// Trim every line, drop blank ones and rejoin with `\n`.
pub fn clean_lines(section: &str) -> String {
    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_double_hash_heading() {
        let reply = "## Words\n\nfrenzy: wild excitement\n  austerity: strict economy  \n\n## Phrases and Idioms\nat loggerheads: in strong disagreement\n";
        let sections = split_sections(reply);
        assert_eq!(
            sections.words,
            "## Words\nfrenzy: wild excitement\nausterity: strict economy"
        );
        assert_eq!(
            sections.phrases,
            "and Idioms\nat loggerheads: in strong disagreement"
        );
    }

    #[test]
    fn test_split_on_single_hash_case_insensitive() {
        let reply = "a: b\n#PHRASES\nc: d";
        let sections = split_sections(reply);
        assert_eq!(sections.words, "a: b");
        assert_eq!(sections.phrases, "c: d");
    }

    #[test]
    fn test_split_uses_first_heading_only() {
        let reply = "a: b\n## Phrases\nc: d\n## Phrases again\ne: f";
        let sections = split_sections(reply);
        assert_eq!(sections.words, "a: b");
        assert_eq!(sections.phrases, "c: d\n## Phrases again\ne: f");
    }

    #[test]
    fn test_missing_heading_puts_everything_in_words() {
        let reply = "1. **Words:**\nfrenzy: wild excitement\n2. **Phrases and Idioms:**\nat odds: in conflict";
        let sections = split_sections(reply);
        assert_eq!(sections.words, clean_lines(reply));
        assert_eq!(sections.phrases, "");
    }

    #[test]
    fn test_bare_word_phrases_is_not_a_heading() {
        let reply = "Phrases\nturn of phrase: a way of saying";
        let sections = split_sections(reply);
        assert_eq!(sections.phrases, "");
        assert!(sections.words.starts_with("Phrases"));
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(
            split_sections(""),
            Sections {
                words: String::new(),
                phrases: String::new()
            }
        );
    }

    #[test]
    fn test_clean_lines_handles_crlf_and_whitespace() {
        assert_eq!(clean_lines("  a: b \r\n\r\n\t c: d\r\n   \n"), "a: b\nc: d");
    }
}
