//! The single response shape returned by every adapter call.

use crate::error::Error;
use crate::stats::Statistics;
use crate::types::{DocumentFormat, DocumentMetadata};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-slide entry of the `list` output mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideEntry {
    /// 1-based position of the slide in the deck.
    pub slide_index: usize,
    /// Text shapes and notes segment, newline-joined and trimmed.
    pub texts: String,
    /// Non-empty flattened tables of the slide.
    pub tables: Vec<String>,
}

/// Outcome of one extraction call, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub success: bool,

    /// The input path exactly as requested.
    pub file_path: String,

    /// Assembled content, or `""` when suppressed, listed or failed.
    pub content: String,

    /// Slide list; present for slide decks only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<SlideEntry>>,

    /// Document information; present for PDF only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,

    pub statistics: Statistics,

    pub error: Option<String>,
}

impl ExtractionResult {
    /// A successful envelope with the format's optional sections empty.
    pub fn success(
        format: DocumentFormat,
        path: &Path,
        content: String,
        statistics: Statistics,
    ) -> Self {
        Self {
            success: true,
            file_path: path.to_string_lossy().into_owned(),
            content,
            slides: (format == DocumentFormat::Pptx).then(Vec::new),
            metadata: (format == DocumentFormat::Pdf).then(DocumentMetadata::default),
            statistics,
            error: None,
        }
    }

    /// A failure envelope: empty content, zeroed statistics.
    pub fn failure(format: DocumentFormat, path: &Path, error: &Error) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::success(
                format,
                path,
                String::new(),
                Statistics::empty(format.unit()),
            )
        }
    }

    pub fn with_slides(mut self, slides: Vec<SlideEntry>) -> Self {
        self.slides = Some(slides);
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Withhold the content while keeping every count.
    pub fn suppress_content(mut self) -> Self {
        self.content.clear();
        self
    }
}
