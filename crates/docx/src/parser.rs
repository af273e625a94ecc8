//! DOCX file parser implementation.

use office_core::{clean_cell, clean_paragraph, Error, Result, Table};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

const PACKAGE_RELS_PATH: &str = "_rels/.rels";
const DEFAULT_DOCUMENT_PATH: &str = "word/document.xml";

/// Paragraphs and tables of a document body, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentBody {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
}

/// Parser for DOCX (Office Open XML) files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open the package and locate its main document part.
    pub fn open<R: Read + Seek>(&self, reader: R) -> Result<(ZipArchive<R>, String)> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::open("Cannot read docx package", e))?;

        let document_path = main_document_path(&mut archive)?;
        if !archive.file_names().any(|name| name == document_path) {
            return Err(Error::OpenFailure(format!(
                "Cannot read docx package: missing '{}'",
                document_path
            )));
        }
        Ok((archive, document_path))
    }

    /// Parse the main document part of an opened package.
    pub fn parse<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        document_path: &str,
    ) -> Result<DocumentBody> {
        let mut file = archive
            .by_name(document_path)
            .map_err(|e| Error::decode(&format!("File not found in archive '{}'", document_path), e))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::decode(&format!("Failed to read '{}'", document_path), e))?;

        let body = parse_document_xml(&content)?;
        log::debug!(
            "Parsed {} paragraphs and {} tables from '{}'",
            body.paragraphs.len(),
            body.tables.len(),
            document_path
        );
        Ok(body)
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Target of the package's officeDocument relationship.
fn main_document_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let mut content = String::new();
    match archive.by_name(PACKAGE_RELS_PATH) {
        Ok(mut file) => {
            file.read_to_string(&mut content)
                .map_err(|e| Error::open("Cannot read package relationships", e))?;
        }
        Err(_) => {
            log::warn!("Package has no '{}', assuming '{}'", PACKAGE_RELS_PATH, DEFAULT_DOCUMENT_PATH);
            return Ok(DEFAULT_DOCUMENT_PATH.to_string());
        }
    }

    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                if rel_type.ends_with("/officeDocument") {
                    if let Some(target) = attribute(e, b"Target") {
                        return Ok(target.trim_start_matches('/').to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::open("Cannot parse package relationships", e)),
            _ => {}
        }
    }

    Ok(DEFAULT_DOCUMENT_PATH.to_string())
}

/// How a cell takes part in a vertical merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum VerticalMerge {
    #[default]
    None,
    Restart,
    Continue,
}

#[derive(Debug, Default)]
struct CellState {
    paragraphs: Vec<String>,
    current: Option<String>,
    span: usize,
    merge: VerticalMerge,
}

impl CellState {
    fn text(mut self) -> String {
        if let Some(paragraph) = self.current.take() {
            self.paragraphs.push(paragraph);
        }
        clean_cell(&self.paragraphs.join("\n"))
    }
}

#[derive(Debug)]
struct TableState {
    /// Tables opened inside a cell of this one.
    nested: usize,
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<CellState>,
}

impl TableState {
    fn new() -> Self {
        Self {
            nested: 0,
            rows: Vec::new(),
            row: None,
            cell: None,
        }
    }

    /// Close the current cell, repeating it once per spanned grid column.
    ///
    /// A vertically continued cell repeats the text of the cell above it.
    fn end_cell(&mut self) {
        let Some(cell) = self.cell.take() else {
            return;
        };
        let span = cell.span.max(1);
        let merge = cell.merge;
        let mut text = cell.text();

        let row = self.row.get_or_insert_with(Vec::new);
        if merge == VerticalMerge::Continue {
            if let Some(above) = self.rows.last().and_then(|prev| prev.get(row.len())) {
                text = above.clone();
            }
        }
        for _ in 0..span {
            row.push(text.clone());
        }
    }

    fn end_row(&mut self) {
        self.end_cell();
        if let Some(row) = self.row.take() {
            self.rows.push(row);
        }
    }
}

/// Walks `w:document` and keeps only direct children of `w:body`.
#[derive(Debug, Default)]
struct BodyWalker {
    stack: Vec<Vec<u8>>,
    body: DocumentBody,
    paragraph: Option<String>,
    table: Option<TableState>,
    /// Depth inside text boxes, whose paragraphs are not body text.
    text_box: usize,
}

impl BodyWalker {
    fn parent(&self) -> Option<&[u8]> {
        self.stack.last().map(Vec::as_slice)
    }

    fn start(&mut self, name: &[u8]) {
        if name == b"txbxContent" {
            self.text_box += 1;
        }

        if self.parent() == Some(b"body".as_slice()) {
            match name {
                b"p" => self.paragraph = Some(String::new()),
                b"tbl" => self.table = Some(TableState::new()),
                _ => {}
            }
        } else if let Some(ref mut table) = self.table {
            if name == b"tbl" {
                table.nested += 1;
            } else if table.nested == 0 && self.text_box == 0 {
                match name {
                    b"tr" => {
                        table.end_row();
                        table.row = Some(Vec::new());
                    }
                    b"tc" => {
                        table.end_cell();
                        table.cell = Some(CellState::default());
                    }
                    b"p" => {
                        if let Some(ref mut cell) = table.cell {
                            cell.current = Some(String::new());
                        }
                    }
                    _ => {}
                }
            }
        }

        self.stack.push(name.to_vec());
    }

    fn empty(&mut self, name: &[u8], e: &BytesStart) {
        if self.parent() == Some(b"r".as_slice()) {
            match name {
                b"tab" => self.push_text("\t"),
                b"br" | b"cr" => self.push_text("\n"),
                b"noBreakHyphen" => self.push_text("-"),
                _ => {}
            }
            return;
        }

        if let Some(ref mut table) = self.table {
            if table.nested > 0 {
                return;
            }
            let Some(ref mut cell) = table.cell else {
                return;
            };
            match name {
                b"gridSpan" => {
                    cell.span = attribute(e, b"w:val")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1);
                }
                b"vMerge" => {
                    cell.merge = match attribute(e, b"w:val").as_deref() {
                        Some("restart") => VerticalMerge::Restart,
                        _ => VerticalMerge::Continue,
                    };
                }
                b"p" => cell.paragraphs.push(String::new()),
                _ => {}
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.parent() == Some(b"t".as_slice()) {
            self.push_text(text);
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.text_box > 0 {
            return;
        }
        if let Some(ref mut table) = self.table {
            if table.nested == 0 {
                if let Some(current) = table.cell.as_mut().and_then(|c| c.current.as_mut()) {
                    current.push_str(text);
                }
            }
        } else if let Some(ref mut paragraph) = self.paragraph {
            paragraph.push_str(text);
        }
    }

    fn end(&mut self) {
        let name = self.stack.pop().unwrap_or_default();

        if name == b"txbxContent" {
            self.text_box = self.text_box.saturating_sub(1);
            return;
        }

        if self.parent() == Some(b"body".as_slice()) {
            match name.as_slice() {
                b"p" => {
                    if let Some(text) = self.paragraph.take().as_deref().and_then(clean_paragraph) {
                        self.body.paragraphs.push(text);
                    }
                }
                b"tbl" => {
                    if let Some(mut table) = self.table.take() {
                        table.end_row();
                        self.body.tables.push(Table::new(table.rows));
                    }
                }
                _ => {}
            }
            return;
        }

        if let Some(ref mut table) = self.table {
            if name == b"tbl" {
                table.nested = table.nested.saturating_sub(1);
                return;
            }
            if table.nested > 0 || self.text_box > 0 {
                return;
            }
            match name.as_slice() {
                b"p" => {
                    if let Some(ref mut cell) = table.cell {
                        if let Some(paragraph) = cell.current.take() {
                            cell.paragraphs.push(paragraph);
                        }
                    }
                }
                b"tc" => table.end_cell(),
                b"tr" => table.end_row(),
                _ => {}
            }
        }
    }
}

/// Extract top-level paragraphs and tables from `word/document.xml`.
///
/// Paragraph text covers runs (including hyperlinks), tabs and breaks;
/// empty paragraphs are dropped. Nested tables and text boxes are skipped.
pub fn parse_document_xml(xml_content: &str) -> Result<DocumentBody> {
    let mut reader = Reader::from_str(xml_content);
    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => walker.start(local_name(e.name().as_ref())),
            Ok(Event::Empty(ref e)) => walker.empty(local_name(e.name().as_ref()), e),
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| Error::decode("Invalid text in document.xml", err))?;
                walker.text(&text);
            }
            Ok(Event::End(_)) => walker.end(),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::decode(
                    &format!("XML error at position {}", reader.buffer_position()),
                    e,
                ));
            }
            _ => {}
        }
    }

    Ok(walker.body)
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub(crate) fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
    }

    pub(crate) fn table(rows: &[&[&str]]) -> String {
        let rows: String = rows
            .iter()
            .map(|cells| {
                let cells: String = cells
                    .iter()
                    .map(|c| format!("<w:tc><w:tcPr><w:tcW w:w=\"0\" w:type=\"auto\"/></w:tcPr>{}</w:tc>", paragraph(c)))
                    .collect();
                format!("<w:tr>{}</w:tr>", cells)
            })
            .collect();
        format!("<w:tbl><w:tblPr/><w:tblGrid/>{}</w:tbl>", rows)
    }

    pub(crate) fn document_xml(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"{}\"><w:body>{}<w:sectPr/></w:body></w:document>",
            W_NS, body
        )
    }

    pub(crate) fn build_docx(body: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        zip.start_file(PACKAGE_RELS_PATH, options).unwrap();
        write!(
            zip,
            "<?xml version=\"1.0\"?><Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
             </Relationships>"
        )
        .unwrap();

        zip.start_file(DEFAULT_DOCUMENT_PATH, options).unwrap();
        zip.write_all(document_xml(body).as_bytes()).unwrap();

        zip.finish().unwrap().into_inner()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_paragraphs_trimmed_and_empty_dropped() {
        let xml = document_xml(&format!(
            "{}{}{}<w:p/>",
            paragraph("  First  "),
            paragraph("   "),
            paragraph("Second")
        ));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.paragraphs, strings(&["First", "Second"]));
        assert!(body.tables.is_empty());
    }

    #[test]
    fn test_runs_tabs_and_breaks() {
        let xml = document_xml(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>Name</w:t></w:r><w:r><w:tab/><w:t>Value</w:t></w:r>\
             <w:hyperlink r:id=\"rId5\"><w:r><w:br/><w:t>link</w:t></w:r></w:hyperlink>\
             <w:r><w:instrText> PAGE </w:instrText></w:r></w:p>",
        );
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.paragraphs, strings(&["Name\tValue\nlink"]));
    }

    #[test]
    fn test_table_cells() {
        let xml = document_xml(&format!(
            "{}{}{}",
            paragraph("Intro"),
            table(&[&[" a ", "b"], &["c", ""]]),
            paragraph("Outro")
        ));
        let body = parse_document_xml(&xml).unwrap();

        assert_eq!(body.paragraphs, strings(&["Intro", "Outro"]));
        assert_eq!(
            body.tables,
            vec![Table::new(vec![strings(&["a", "b"]), strings(&["c", ""])])]
        );
    }

    #[test]
    fn test_multi_paragraph_cell() {
        let xml = document_xml(&format!(
            "<w:tbl><w:tr><w:tc>{}{}</w:tc></w:tr></w:tbl>",
            paragraph("line one"),
            paragraph("line two")
        ));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.tables[0].rows, vec![strings(&["line one\nline two"])]);
    }

    #[test]
    fn test_grid_span_repeats_cell() {
        let xml = document_xml(&format!(
            "<w:tbl><w:tr><w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr>{}</w:tc>\
             <w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph("wide"),
            paragraph("narrow")
        ));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.tables[0].rows, vec![strings(&["wide", "wide", "narrow"])]);
    }

    #[test]
    fn test_vertical_merge_repeats_cell_above() {
        let xml = document_xml(&format!(
            "<w:tbl>\
             <w:tr><w:tc><w:tcPr><w:vMerge w:val=\"restart\"/></w:tcPr>{}</w:tc><w:tc>{}</w:tc></w:tr>\
             <w:tr><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc><w:tc>{}</w:tc></w:tr>\
             </w:tbl>",
            paragraph("group"),
            paragraph("one"),
            paragraph("two")
        ));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(
            body.tables[0].rows,
            vec![strings(&["group", "one"]), strings(&["group", "two"])]
        );
    }

    #[test]
    fn test_nested_table_ignored() {
        let xml = document_xml(&format!(
            "<w:tbl><w:tr><w:tc>{}{}</w:tc></w:tr></w:tbl>",
            paragraph("outer"),
            table(&[&["inner"]])
        ));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.tables.len(), 1);
        assert_eq!(body.tables[0].rows, vec![strings(&["outer"])]);
    }

    #[test]
    fn test_text_box_ignored() {
        let xml = document_xml(&format!(
            "<w:p><w:r><w:t>Body</w:t></w:r><w:r><w:drawing><wps:txbx><w:txbxContent>{}</w:txbxContent></wps:txbx></w:drawing></w:r></w:p>",
            paragraph("Boxed")
        ));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.paragraphs, strings(&["Body"]));
    }

    #[test]
    fn test_escaped_text() {
        let xml = document_xml(&paragraph("Fish &amp; chips &lt;3"));
        let body = parse_document_xml(&xml).unwrap();
        assert_eq!(body.paragraphs, strings(&["Fish & chips <3"]));
    }

    #[test]
    fn test_open_and_parse_package() {
        let bytes = build_docx(&format!("{}{}", paragraph("Hello"), table(&[&["x"]])));
        let parser = DocxParser::new();
        let (mut archive, path) = parser.open(Cursor::new(bytes)).unwrap();
        assert_eq!(path, DEFAULT_DOCUMENT_PATH);

        let body = parser.parse(&mut archive, &path).unwrap();
        assert_eq!(body.paragraphs, strings(&["Hello"]));
        assert_eq!(body.tables.len(), 1);
    }

    #[test]
    fn test_open_rejects_non_package() {
        let parser = DocxParser::new();
        let err = parser.open(Cursor::new(b"%PDF-1.4".to_vec())).unwrap_err();
        assert!(matches!(err, Error::OpenFailure(_)));
    }
}
