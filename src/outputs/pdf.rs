//! PDF rendering of vocabulary results.
//!
//! Rendering happens in two steps:
//!
//! 1. [`compose`] turns the results into a flat list of [`Block`]s. This is
//!    the whole layout: what text appears, in which style, and where pages
//!    break.
//! 2. [`render`] paints those blocks with `printpdf` and writes the document
//!    to any [`Write`] sink.
//!
//! File output and in-memory output both go through [`render`]; they differ
//! only in the sink handed to it.
//!
//! # Layout
//!
//! ```text
//! Dawn Editorial Vocabulary & Phrases        (24pt, centered)
//! 2025-05-30 to 2025-05-31                   (12pt, centered)
//! created by csshelp.vercel.app              (10pt, grey, centered)
//!
//! 1. <title>                                 (18pt bold, underlined)
//! Words and phrases & Idioms:                (14pt bold)
//!   word: meaning                            (12pt, indented)
//! Phrases and Idioms:                        (14pt bold)
//!   phrase: meaning
//! ---- page break ----
//! 2. <title>
//! ```

use crate::error::RenderError;
use crate::models::{DateRange, VocabularyResult};
use once_cell::sync::Lazy;
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DOCUMENT_TITLE: &str = "Dawn Editorial Vocabulary & Phrases";
pub const ATTRIBUTION: &str = "created by csshelp.vercel.app";
pub const WORDS_HEADING: &str = "Words and phrases & Idioms:";
pub const PHRASES_HEADING: &str = "Phrases and Idioms:";

static WORDS_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\*\s*\d*\.\s*\*\*Words:\*\*|^[\s*\-]+").unwrap());
static PHRASES_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\*\s*\d*\.\s*\*\*Phrases and Idioms:\*\*|^[\s*\-]+").unwrap());
static INLINE_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|__").unwrap());
/// A line that only names a section, e.g. `1. Words:`, `## Phrases` or the
/// `and Idioms` left over after the reply was split at its phrases heading.
static SECTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^#{0,2}\s*(?:\d+\.\s*)?(?:words|phrases and idioms|phrases|and idioms|idioms)\s*:?$",
    )
    .unwrap()
});

// US Letter with one-inch margins.
const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 25.4;
const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.15;
// Average Times glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
const ENTRY_INDENT: &str = "  ";

/// One unit of layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Caption(String),
    Attribution(String),
    /// Numbered, underlined article heading.
    Heading(String),
    SubHeading(&'static str),
    Entry(String),
    /// Vertical gap measured in body lines.
    Space(f32),
    PageBreak,
}

/// Lay out the title block and one section per result.
pub fn compose(results: &[VocabularyResult], range: &DateRange) -> Vec<Block> {
    let mut blocks = vec![
        Block::Title(DOCUMENT_TITLE.to_string()),
        Block::Caption(range.caption()),
        Block::Attribution(ATTRIBUTION.to_string()),
        Block::Space(2.0),
    ];

    for (index, result) in results.iter().enumerate() {
        blocks.push(Block::Heading(format!("{}. {}", index + 1, result.title)));
        blocks.push(Block::Space(0.5));

        let words: Vec<String> = cleaned_entries(&result.words, &WORDS_MARKERS).collect();
        if !words.is_empty() {
            blocks.push(Block::SubHeading(WORDS_HEADING));
            blocks.push(Block::Space(0.2));
            blocks.extend(words.into_iter().map(Block::Entry));
            blocks.push(Block::Space(0.5));
        }

        let phrases: Vec<String> = cleaned_entries(&result.phrases, &PHRASES_MARKERS).collect();
        if !phrases.is_empty() {
            blocks.push(Block::SubHeading(PHRASES_HEADING));
            blocks.push(Block::Space(0.2));
            blocks.extend(phrases.into_iter().map(Block::Entry));
            blocks.push(Block::Space(1.0));
        }

        if index + 1 < results.len() {
            blocks.push(Block::PageBreak);
        }
    }
    blocks
}

/// Strip list bullets and markdown emphasis from each line, dropping lines
/// that are only a section label.
fn cleaned_entries<'a>(text: &'a str, markers: &'a Regex) -> impl Iterator<Item = String> + 'a {
    text.lines()
        .map(move |line| {
            let line = markers.replace(line, "");
            INLINE_EMPHASIS.replace_all(&line, "").trim().to_string()
        })
        .filter(|line| !line.is_empty() && !SECTION_LABEL.is_match(line))
}

/// Result of a render: the sink handed back plus the number of pages painted.
#[derive(Debug)]
pub struct Rendered<W> {
    pub output: W,
    pub pages: usize,
}

/// Render `results` into `sink`.
///
/// # Arguments
///
/// * `results` - Vocabulary results in section order
/// * `range` - Date range shown under the document title
/// * `sink` - Destination for the PDF bytes
///
/// # Returns
///
/// The sink after the document has been written and flushed, with the page
/// count.
pub fn render<W: Write>(
    results: &[VocabularyResult],
    range: &DateRange,
    sink: W,
) -> Result<Rendered<W>, RenderError> {
    let blocks = compose(results, range);
    let (doc, pages) = paint(&blocks)?;

    let mut writer = BufWriter::new(sink);
    doc.save(&mut writer)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let output = writer.into_inner().map_err(|e| RenderError::Io(e.into_error()))?;
    Ok(Rendered { output, pages })
}

/// Render to a file at `path`, replacing any existing file.
#[instrument(level = "info", skip(results), fields(count = results.len()))]
pub fn render_to_file(
    results: &[VocabularyResult],
    range: &DateRange,
    path: &Path,
) -> Result<usize, RenderError> {
    let file = File::create(path)?;
    let rendered = render(results, range, file)?;
    rendered.output.sync_all()?;
    info!(path = %path.display(), pages = rendered.pages, "PDF generated");
    Ok(rendered.pages)
}

/// Render to an in-memory buffer.
#[instrument(level = "info", skip(results), fields(count = results.len()))]
pub fn render_to_bytes(
    results: &[VocabularyResult],
    range: &DateRange,
) -> Result<(Vec<u8>, usize), RenderError> {
    let rendered = render(results, range, Vec::new())?;
    info!(bytes = rendered.output.len(), pages = rendered.pages, "PDF generated in memory");
    Ok((rendered.output, rendered.pages))
}

/// A finished document, either on disk or in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedDocument {
    File(PathBuf),
    Buffer(Vec<u8>),
}

impl RenderedDocument {
    /// The document's bytes, read from disk in file mode.
    pub async fn bytes(&self) -> io::Result<Vec<u8>> {
        match self {
            RenderedDocument::File(path) => tokio::fs::read(path).await,
            RenderedDocument::Buffer(bytes) => Ok(bytes.clone()),
        }
    }
}

struct Style {
    size: f32,
    bold: bool,
    centered: bool,
    grey: bool,
    underline: bool,
}

impl Style {
    const fn new(size: f32) -> Self {
        Self {
            size,
            bold: false,
            centered: false,
            grey: false,
            underline: false,
        }
    }

    fn line_height(&self) -> f32 {
        self.size * PT_TO_MM * LINE_SPACING
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.size * GLYPH_WIDTH * PT_TO_MM
    }

    fn chars_per_line(&self) -> usize {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        ((usable / (self.size * GLYPH_WIDTH * PT_TO_MM)) as usize).max(1)
    }
}

fn style_of(block: &Block) -> Style {
    match block {
        Block::Title(_) => Style {
            centered: true,
            ..Style::new(24.0)
        },
        Block::Caption(_) => Style {
            centered: true,
            ..Style::new(12.0)
        },
        Block::Attribution(_) => Style {
            centered: true,
            grey: true,
            ..Style::new(10.0)
        },
        Block::Heading(_) => Style {
            bold: true,
            underline: true,
            ..Style::new(18.0)
        },
        Block::SubHeading(_) => Style {
            bold: true,
            ..Style::new(14.0)
        },
        Block::Entry(_) | Block::Space(_) | Block::PageBreak => Style::new(12.0),
    }
}

struct Painter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor: f32,
    pages: usize,
}

impl Painter {
    fn new() -> Result<Self, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::TimesRoman)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::TimesBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    fn paint_text(&mut self, text: &str, style: &Style) {
        for line in wrap(text, style.chars_per_line()) {
            let height = style.line_height();
            if self.cursor - height < MARGIN {
                self.new_page();
            }
            self.cursor -= height;

            let width = style.text_width(&line);
            let x = if style.centered {
                ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
            } else {
                MARGIN
            };
            let font = if style.bold { &self.bold } else { &self.regular };
            let shade = if style.grey { 0.5 } else { 0.0 };
            self.layer
                .set_fill_color(Color::Greyscale(Greyscale::new(shade, None)));
            self.layer
                .use_text(line.as_str(), style.size, Mm(x), Mm(self.cursor), font);

            if style.underline {
                let y = self.cursor - 0.8;
                self.layer.set_outline_thickness(0.6);
                self.layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(x), Mm(y)), false),
                        (Point::new(Mm(x + width), Mm(y)), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }
}

fn paint(blocks: &[Block]) -> Result<(PdfDocumentReference, usize), RenderError> {
    let mut painter = Painter::new()?;
    for block in blocks {
        let style = style_of(block);
        match block {
            Block::Title(text)
            | Block::Caption(text)
            | Block::Attribution(text)
            | Block::Heading(text) => painter.paint_text(text, &style),
            Block::SubHeading(text) => painter.paint_text(text, &style),
            Block::Entry(text) => painter.paint_text(&format!("{ENTRY_INDENT}{text}"), &style),
            Block::Space(lines) => {
                painter.cursor = (painter.cursor - lines * style.line_height()).max(MARGIN);
            }
            Block::PageBreak => painter.new_page(),
        }
    }
    let pages = painter.pages;
    Ok((painter.doc, pages))
}

/// Greedy word wrap at `width` characters; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
