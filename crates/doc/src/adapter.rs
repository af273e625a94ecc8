//! Legacy Word adapter.

use crate::parser::DocParser;
use crate::session::WordSession;
use office_core::{Adapter, DecodedDocument, DocumentFormat, Result};
use std::path::Path;

/// Decodes `.doc` files into paragraphs and tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocAdapter;

impl DocAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for DocAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Doc
    }

    fn decode(&self, path: &Path) -> Result<DecodedDocument> {
        let mut session = WordSession::open(path)?;
        let body = DocParser::new().parse(&mut session)?;

        Ok(DecodedDocument::Flow {
            paragraphs: body.paragraphs,
            tables: body.tables,
        })
    }
}
