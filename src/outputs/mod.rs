//! Output artifacts of a run.
//!
//! - [`json`]: the intermediate snapshot of vocabulary results
//! - [`pdf`]: the paginated document that gets emailed
//!
//! # Output Structure (file mode)
//!
//! ```text
//! output_dir/
//! ├── articles_vocab.json
//! └── Editorial_Vocabulary.pdf
//! ```
//!
//! In buffer mode nothing is written to disk.

pub mod json;
pub mod pdf;

pub const SNAPSHOT_FILE_NAME: &str = "articles_vocab.json";
pub const DOCUMENT_FILE_NAME: &str = "Editorial_Vocabulary.pdf";
