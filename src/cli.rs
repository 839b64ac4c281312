//! Command-line interface definitions.
//!
//! Every option can also come from the environment; a `.env` file in the
//! working directory is loaded before parsing.

use crate::delivery::DEFAULT_SENDER_NAME;
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Build the PDF for one day without sending it
/// editorial_vocab --start-date 2025-05-30 --end-date 2025-05-30
///
/// # Build it in memory and email it
/// editorial_vocab -s 2025-05-30 -e 2025-05-31 --email reader@example.com --in-memory
///
/// # Re-send a previously generated snapshot
/// editorial_vocab --from-snapshot ./out/articles_vocab.json --email reader@example.com
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First day to scrape (YYYY-MM-DD, inclusive)
    #[arg(short, long, env = "START_DATE", default_value = "2025-05-30")]
    pub start_date: String,

    /// Last day to scrape (YYYY-MM-DD, inclusive)
    #[arg(short, long, env = "END_DATE", default_value = "2025-05-30")]
    pub end_date: String,

    /// Recipient address; delivery is skipped when omitted
    #[arg(long, env = "RECIPIENT_EMAIL")]
    pub email: Option<String>,

    /// Render the PDF in memory instead of writing the snapshot and PDF to disk
    #[arg(long)]
    pub in_memory: bool,

    /// Directory for the JSON snapshot and the PDF in file mode
    #[arg(short, long, env = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// Render an existing JSON snapshot instead of scraping
    #[arg(long)]
    pub from_snapshot: Option<String>,

    /// Path to the model client's config.yaml
    #[arg(short, long, env = "AJ_CONFIG")]
    pub config: Option<String>,

    /// Named chat template to load instead of the built-in one
    #[arg(long, env = "AJ_TEMPLATE")]
    pub template: Option<String>,

    /// Number of articles to extract and analyze at once
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// SQLite URL for the delivery audit log
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://editorial_vocab.db")]
    pub database_url: String,

    /// SMTP relay host
    #[arg(long, env = "SMTP_RELAY", default_value = "smtp.gmail.com")]
    pub smtp_relay: String,

    /// SMTP user, also used as the sender address
    #[arg(long, env = "GMAIL_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password or app password
    #[arg(long, env = "GMAIL_APP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Display name for the sender
    #[arg(long, env = "SENDER_NAME", default_value = DEFAULT_SENDER_NAME)]
    pub sender_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "editorial_vocab",
            "--start-date",
            "2025-05-30",
            "--end-date",
            "2025-05-31",
            "--email",
            "reader@example.com",
            "--in-memory",
            "--concurrency",
            "3",
        ]);

        assert_eq!(cli.start_date, "2025-05-30");
        assert_eq!(cli.end_date, "2025-05-31");
        assert_eq!(cli.email.as_deref(), Some("reader@example.com"));
        assert!(cli.in_memory);
        assert_eq!(cli.concurrency, 3);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "editorial_vocab",
            "-s",
            "2025-06-01",
            "-e",
            "2025-06-02",
            "-o",
            "/tmp/out",
        ]);

        assert_eq!(cli.start_date, "2025-06-01");
        assert_eq!(cli.end_date, "2025-06-02");
        assert_eq!(cli.output_dir, "/tmp/out");
        assert!(!cli.in_memory);
        assert!(cli.from_snapshot.is_none());
    }

    #[test]
    fn test_cli_rejects_non_numeric_concurrency() {
        assert!(Cli::try_parse_from(["editorial_vocab", "--concurrency", "many"]).is_err());
    }
}
