//! Domain types for representing decoded document content.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The format handled by an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Legacy Word (OLE/CFB binary).
    Doc,
    /// Word (Office Open XML).
    Docx,
    /// Portable Document Format.
    Pdf,
    /// PowerPoint (Office Open XML).
    Pptx,
}

impl DocumentFormat {
    /// The file suffix this format is accepted under, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Whether the file name of `path` ends in this format's suffix
    /// (case-insensitive). A bare `.pdf` counts.
    pub fn matches_path(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        name.to_string_lossy()
            .to_lowercase()
            .ends_with(&format!(".{}", self.extension()))
    }

    /// The unit the selection range counts in.
    pub fn unit(&self) -> Unit {
        match self {
            Self::Doc | Self::Docx => Unit::Paragraph,
            Self::Pdf => Unit::Page,
            Self::Pptx => Unit::Slide,
        }
    }
}

/// The granularity a format's primary range selects over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Paragraph,
    Page,
    Slide,
}

impl Unit {
    /// Name of the per-format count in the statistics block.
    pub fn count_key(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph_count",
            Self::Page => "page_count",
            Self::Slide => "slide_count",
        }
    }
}

/// A table as a grid of cleaned cell strings. Rows may differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render the table as tab-separated cells and newline-separated rows.
    ///
    /// Cells are expected to be cleaned already; nothing is trimmed here.
    pub fn flatten(&self) -> String {
        self.rows
            .iter()
            .map(|cells| cells.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One item on a slide, in shape-traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeContent {
    /// Text of a shape's text frame, already trimmed.
    Text(String),
    /// A table hosted by a graphic frame.
    Table(Table),
}

/// A single decoded slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// 1-based position in the deck.
    pub number: usize,

    /// Shapes in traversal order.
    pub shapes: Vec<ShapeContent>,

    /// Speaker notes, if the slide has a notes page.
    pub notes: Option<String>,
}

impl Slide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
            notes: None,
        }
    }

    pub fn push_shape(&mut self, shape: ShapeContent) {
        self.shapes.push(shape);
    }

    #[cfg(test)]
    pub(crate) fn add_text(&mut self, text: impl Into<String>) {
        self.push_shape(ShapeContent::Text(text.into()));
    }

    #[cfg(test)]
    pub(crate) fn add_table(&mut self, table: Table) {
        self.push_shape(ShapeContent::Table(table));
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.shapes.iter().filter_map(|shape| match shape {
            ShapeContent::Table(table) => Some(table),
            ShapeContent::Text(_) => None,
        })
    }
}

/// Document information dictionary fields of a PDF. Missing entries
/// serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub subject: Option<String>,
}

/// PDF metadata block: `{}` without an information dictionary, otherwise
/// all five fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    #[serde(flatten)]
    pub info: Option<DocumentInfo>,
}

impl DocumentMetadata {
    pub fn from_info(info: DocumentInfo) -> Self {
        Self { info: Some(info) }
    }
}

/// Primitive sequences produced by a format decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedDocument {
    /// Body paragraphs and tables of a word-processing document.
    Flow {
        paragraphs: Vec<String>,
        tables: Vec<Table>,
    },
    /// Per-page text of a paginated document, empty pages included.
    Paged {
        pages: Vec<String>,
        metadata: DocumentMetadata,
    },
    /// Slides of a presentation.
    Deck { slides: Vec<Slide> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_flatten() {
        assert_eq!(table(&[&["a", "b"], &["c", "d"]]).flatten(), "a\tb\nc\td");
        assert_eq!(Table::default().flatten(), "");
    }

    #[test]
    fn test_flatten_ragged_rows() {
        let t = table(&[&["a"], &["b", "c", "d"], &[]]);
        assert_eq!(t.flatten(), "a\nb\tc\td\n");
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn test_flatten_keeps_empty_cells() {
        assert_eq!(table(&[&["", "x", ""]]).flatten(), "\tx\t");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("DOCX"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("Pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_matches_path() {
        assert!(DocumentFormat::Docx.matches_path(Path::new("/tmp/Report.DOCX")));
        assert!(!DocumentFormat::Doc.matches_path(Path::new("/tmp/report.docx")));
        assert!(!DocumentFormat::Pdf.matches_path(Path::new("/tmp/pdf")));
        assert!(!DocumentFormat::Pdf.matches_path(Path::new("/tmp/report.pdf.txt")));
        assert!(!DocumentFormat::Pdf.matches_path(Path::new("/")));
    }

    #[test]
    fn test_matches_bare_suffix_name() {
        assert!(DocumentFormat::Pdf.matches_path(Path::new("/tmp/.pdf")));
        assert!(DocumentFormat::Docx.matches_path(Path::new(".DOCX")));
        assert!(!DocumentFormat::Doc.matches_path(Path::new(".docx")));
    }

    #[test]
    fn test_metadata_json() {
        let empty = serde_json::to_value(DocumentMetadata::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));

        let info = DocumentMetadata::from_info(DocumentInfo {
            title: Some("Report".to_string()),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            serde_json::json!({
                "title": "Report",
                "author": null,
                "creator": null,
                "producer": null,
                "subject": null,
            })
        );
    }

    #[test]
    fn test_slide_tables() {
        let mut slide = Slide::new(1);
        slide.add_text("Title");
        slide.add_table(table(&[&["x"]]));
        assert_eq!(slide.tables().count(), 1);
    }
}
