//! PDF adapter.

use crate::parser::PdfParser;
use office_core::{Adapter, DecodedDocument, DocumentFormat, Result};
use std::path::Path;

/// Decodes `.pdf` files into page texts and metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfAdapter;

impl PdfAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for PdfAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn decode(&self, path: &Path) -> Result<DecodedDocument> {
        let parser = PdfParser::load(path)?;
        let pages = parser.pages();
        log::debug!("Extracted text from {} pages", pages.len());

        Ok(DecodedDocument::Paged {
            pages,
            metadata: parser.metadata(),
        })
    }
}
