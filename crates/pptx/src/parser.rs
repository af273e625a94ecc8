//! PPTX file parser implementation.

use office_core::{clean_cell, Error, Result, ShapeContent, Slide, Table};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open the package. Anything that is not a readable PowerPoint
    /// package is an open failure.
    pub fn open<R: Read + Seek>(&self, reader: R) -> Result<ZipArchive<R>> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::open("Cannot read pptx package", e))?;
        if !has_file(&archive, PRESENTATION_PATH) {
            return Err(Error::OpenFailure(format!(
                "Cannot read pptx package: missing '{}'",
                PRESENTATION_PATH
            )));
        }
        Ok(archive)
    }

    /// Parse every slide of an opened package, in presentation order.
    pub fn parse<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<Slide>> {
        let slide_order = self.get_slide_order(archive)?;
        log::debug!("Found {} slides", slide_order.len());

        let mut slides = Vec::with_capacity(slide_order.len());
        for (idx, slide_path) in slide_order.iter().enumerate() {
            slides.push(self.parse_slide(archive, slide_path, idx + 1)?);
        }
        Ok(slides)
    }

    /// Get the ordered list of slide paths.
    ///
    /// The slide id list in presentation.xml is authoritative; relationship
    /// numbering is only used when that list is absent.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = parse_relationships(&read_file_from_archive(archive, PRESENTATION_RELS_PATH)?)?;
        let presentation = read_file_from_archive(archive, PRESENTATION_PATH)?;
        let slide_ids = parse_slide_id_list(&presentation)?;

        if !slide_ids.is_empty() {
            let mut slides = Vec::with_capacity(slide_ids.len());
            for rid in &slide_ids {
                match rels.iter().find(|r| &r.id == rid) {
                    Some(rel) => slides.push(resolve_target("ppt", &rel.target)),
                    None => log::warn!("Slide relationship '{}' not found, skipping", rid),
                }
            }
            return Ok(slides);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|r| r.rel_type.ends_with("/slide"))
            .map(|r| {
                let order_num = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (resolve_target("ppt", &r.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide and its notes page from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = read_file_from_archive(archive, slide_path)?;
        let mut slide = Slide::new(slide_number);

        for shape in extract_shapes_from_xml(&content)? {
            slide.push_shape(shape.content);
        }

        slide.notes = self.read_notes(archive, slide_path)?;
        Ok(slide)
    }

    /// Read the body placeholder text of the slide's notes page, if any.
    fn read_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let rels_path = rels_path_for(slide_path);
        if !has_file(archive, &rels_path) {
            return Ok(None);
        }

        let rels = parse_relationships(&read_file_from_archive(archive, &rels_path)?)?;
        let Some(notes_rel) = rels.iter().find(|r| r.rel_type.ends_with("/notesSlide")) else {
            return Ok(None);
        };

        let notes_path = resolve_target(parent_dir(slide_path), &notes_rel.target);
        let content = read_file_from_archive(archive, &notes_path)?;

        let notes = extract_shapes_from_xml(&content)?
            .into_iter()
            .filter(|shape| shape.placeholder.as_deref() == Some("body"))
            .find_map(|shape| match shape.content {
                ShapeContent::Text(text) => Some(text),
                ShapeContent::Table(_) => None,
            });
        Ok(notes)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// A top-level shape of a slide's shape tree.
#[derive(Debug)]
struct ParsedShape {
    content: ShapeContent,
    /// Placeholder type (`title`, `body`, ...) when the shape is one.
    placeholder: Option<String>,
}

/// Paragraph text of one text body (shape or table cell).
#[derive(Debug, Default)]
struct TextCollector {
    paragraphs: Vec<String>,
    current: Option<String>,
}

impl TextCollector {
    fn start_paragraph(&mut self) {
        self.current = Some(String::new());
    }

    fn push_text(&mut self, text: &str) {
        if let Some(ref mut current) = self.current {
            current.push_str(text);
        }
    }

    fn end_paragraph(&mut self) {
        if let Some(paragraph) = self.current.take() {
            self.paragraphs.push(paragraph);
        }
    }

    fn finish(mut self) -> String {
        self.end_paragraph();
        self.paragraphs.join("\n")
    }
}

/// Table grid under construction inside a graphic frame.
#[derive(Debug, Default)]
struct TableBuilder {
    found: bool,
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<TextCollector>,
}

impl TableBuilder {
    fn end_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            let text = clean_cell(&cell.finish());
            self.row.get_or_insert_with(Vec::new).push(text);
        }
    }

    fn end_row(&mut self) {
        self.end_cell();
        if let Some(row) = self.row.take() {
            self.rows.push(row);
        }
    }
}

#[derive(Debug)]
enum ShapeKind {
    Text(TextCollector),
    Frame(TableBuilder),
}

#[derive(Debug)]
struct OpenShape {
    kind: ShapeKind,
    /// Element depth of the shape's own start tag.
    depth: usize,
    placeholder: Option<String>,
}

impl OpenShape {
    fn finish(self) -> Option<ParsedShape> {
        let content = match self.kind {
            ShapeKind::Text(collector) => {
                let text = collector.finish().trim().to_string();
                if text.is_empty() {
                    return None;
                }
                ShapeContent::Text(text)
            }
            ShapeKind::Frame(mut builder) => {
                if !builder.found {
                    return None;
                }
                builder.end_row();
                ShapeContent::Table(Table::new(builder.rows))
            }
        };
        Some(ParsedShape {
            content,
            placeholder: self.placeholder,
        })
    }
}

/// Extract the top-level shapes of a slide (or notes page) in tree order.
///
/// Only direct children of `p:spTree` are visited; group shapes are not
/// descended into. Text shapes with no text are dropped, tables are kept
/// even when every cell is empty.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<ParsedShape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<OpenShape> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref()).to_vec();

                if let Some(ref mut open) = shape {
                    start_in_shape(open, &name, e);
                } else if stack.last().map(Vec::as_slice) == Some(b"spTree".as_slice()) {
                    shape = open_shape(&name, stack.len());
                }

                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if let Some(ref mut open) = shape {
                    empty_in_shape(open, name, e);
                }
            }
            Ok(Event::Text(ref e)) => {
                if stack.last().map(Vec::as_slice) != Some(b"t".as_slice()) {
                    continue;
                }
                if let Some(ref mut open) = shape {
                    let text = e.unescape().unwrap_or_default();
                    match open.kind {
                        ShapeKind::Text(ref mut collector) => collector.push_text(&text),
                        ShapeKind::Frame(ref mut builder) => {
                            if let Some(ref mut cell) = builder.cell {
                                cell.push_text(&text);
                            }
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();

                let closes_shape = shape.as_ref().is_some_and(|open| open.depth == stack.len());
                if closes_shape {
                    if let Some(parsed) = shape.take().and_then(OpenShape::finish) {
                        shapes.push(parsed);
                    }
                } else if let Some(ref mut open) = shape {
                    end_in_shape(open, &name);
                }
            }
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

    Ok(shapes)
}

fn open_shape(name: &[u8], depth: usize) -> Option<OpenShape> {
    let kind = match name {
        b"sp" => ShapeKind::Text(TextCollector::default()),
        b"graphicFrame" => ShapeKind::Frame(TableBuilder::default()),
        _ => return None,
    };
    Some(OpenShape {
        kind,
        depth,
        placeholder: None,
    })
}

fn start_in_shape(open: &mut OpenShape, name: &[u8], e: &BytesStart) {
    if name == b"ph" {
        open.placeholder = Some(placeholder_type(e));
    }
    match open.kind {
        ShapeKind::Text(ref mut collector) => {
            if name == b"p" {
                collector.start_paragraph();
            }
        }
        ShapeKind::Frame(ref mut builder) => match name {
            b"tbl" => builder.found = true,
            b"tr" => {
                builder.end_row();
                builder.row = Some(Vec::new());
            }
            b"tc" => {
                builder.end_cell();
                builder.cell = Some(TextCollector::default());
            }
            b"p" => {
                if let Some(ref mut cell) = builder.cell {
                    cell.start_paragraph();
                }
            }
            _ => {}
        },
    }
}

fn empty_in_shape(open: &mut OpenShape, name: &[u8], e: &BytesStart) {
    if name == b"ph" {
        open.placeholder = Some(placeholder_type(e));
    }
    match open.kind {
        ShapeKind::Text(ref mut collector) => match name {
            b"br" => collector.push_text("\n"),
            b"p" => {
                collector.start_paragraph();
                collector.end_paragraph();
            }
            _ => {}
        },
        ShapeKind::Frame(ref mut builder) => match name {
            b"br" => {
                if let Some(ref mut cell) = builder.cell {
                    cell.push_text("\n");
                }
            }
            b"tc" => {
                builder.end_cell();
                builder.row.get_or_insert_with(Vec::new).push(String::new());
            }
            _ => {}
        },
    }
}

fn end_in_shape(open: &mut OpenShape, name: &[u8]) {
    match open.kind {
        ShapeKind::Text(ref mut collector) => {
            if name == b"p" {
                collector.end_paragraph();
            }
        }
        ShapeKind::Frame(ref mut builder) => match name {
            b"p" => {
                if let Some(ref mut cell) = builder.cell {
                    cell.end_paragraph();
                }
            }
            b"tc" => builder.end_cell(),
            b"tr" => builder.end_row(),
            _ => {}
        },
    }
}

/// `type` attribute of a `p:ph` element; an untyped placeholder is `obj`.
fn placeholder_type(e: &BytesStart) -> String {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"type")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
        .unwrap_or_else(|| "obj".to_string())
}

/// Relationship ids of `p:sldIdLst`, in presentation order.
fn parse_slide_id_list(xml_content: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The namespaced `r:id`, not the numeric `id`.
                let rid = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref().ends_with(b":id"))
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                if let Some(rid) = rid {
                    ids.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::decode("Error parsing presentation.xml", e)),
            _ => {}
        }
    }

    Ok(ids)
}

/// Parse the entries of a `.rels` part.
fn parse_relationships(xml_content: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::decode("Error parsing relationships", e)),
            _ => {}
        }
    }

    Ok(rels)
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::decode(&format!("File not found in archive '{}'", path), e))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::decode(&format!("Failed to read '{}'", path), e))?;

    Ok(content)
}

fn has_file<R: Read + Seek>(archive: &ZipArchive<R>, path: &str) -> bool {
    archive.file_names().any(|name| name == path)
}

/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
