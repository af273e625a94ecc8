//! Slide deck adapter.

use crate::parser::PptxParser;
use office_core::{Adapter, DecodedDocument, DocumentFormat, Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Decodes `.pptx` files into slides.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxAdapter;

impl PptxAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for PptxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn decode(&self, path: &Path) -> Result<DecodedDocument> {
        let file = File::open(path).map_err(|e| Error::open("Cannot read pptx file", e))?;

        let parser = PptxParser::new();
        // The archive owns the file handle and is dropped on every return path.
        let mut archive = parser.open(BufReader::new(file))?;
        let slides = parser.parse(&mut archive)?;

        Ok(DecodedDocument::Deck { slides })
    }
}
