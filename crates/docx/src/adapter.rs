//! Word (OOXML) adapter.

use crate::parser::DocxParser;
use office_core::{Adapter, DecodedDocument, DocumentFormat, Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Decodes `.docx` files into paragraphs and tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxAdapter;

impl DocxAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for DocxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn decode(&self, path: &Path) -> Result<DecodedDocument> {
        let file = File::open(path).map_err(|e| Error::open("Cannot read docx file", e))?;

        let parser = DocxParser::new();
        let (mut archive, document_path) = parser.open(BufReader::new(file))?;
        let body = parser.parse(&mut archive, &document_path)?;

        Ok(DecodedDocument::Flow {
            paragraphs: body.paragraphs,
            tables: body.tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::{build_docx, paragraph, table};
    use office_core::{extract, ExtractRequest};
    use tempfile::TempDir;

    fn write_report(dir: &TempDir) -> std::path::PathBuf {
        let body = format!(
            "{}{}{}{}{}",
            paragraph("Quarterly report"),
            table(&[&["Region", "Sales"], &["North", "10"]]),
            paragraph("Summary"),
            table(&[&["Total", "10"]]),
            paragraph("End")
        );
        let path = dir.path().join("report.docx");
        std::fs::write(&path, build_docx(&body)).unwrap();
        path
    }

    #[test]
    fn test_extract_all() {
        let dir = TempDir::new().unwrap();
        let path = write_report(&dir);
        let result = extract(&DocxAdapter::new(), &ExtractRequest::new(&path));

        assert!(result.success, "{:?}", result.error);
        assert_eq!(
            result.content,
            "Quarterly report\nSummary\nEnd\n\nRegion\tSales\nNorth\t10\n\nTotal\t10"
        );
        assert_eq!(result.statistics.unit_count, 3);
        assert_eq!(result.statistics.table_count, 2);
        assert_eq!(result.statistics.table_row_counts, vec![2, 1]);
        assert!(result.slides.is_none());
        assert!(result.metadata.is_none());
    }

    #[test]
    fn test_extract_ranges() {
        let dir = TempDir::new().unwrap();
        let path = write_report(&dir);
        let request = ExtractRequest::new(&path)
            .with_unit_range(Some(-1), Some(1))
            .with_table_range(Some(2), Some(99));
        let result = extract(&DocxAdapter::new(), &request);

        assert_eq!(result.content, "Quarterly report\n\nTotal\t10");
        assert_eq!(result.statistics.unit_count, 1);
        assert_eq!(result.statistics.table_row_counts, vec![1]);
    }

    #[test]
    fn test_tables_only_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.docx");
        std::fs::write(&path, build_docx(&table(&[&["a"]]))).unwrap();

        let result = extract(&DocxAdapter::new(), &ExtractRequest::new(&path));
        assert_eq!(result.content, "a");
        assert_eq!(result.statistics.unit_count, 0);
    }

    #[test]
    fn test_not_a_package() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"plain text").unwrap();

        let result = extract(&DocxAdapter::new(), &ExtractRequest::new(&path));
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Cannot open file"));
        assert_eq!(result.statistics.unit_count, 0);
    }
}
