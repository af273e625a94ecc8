//! Word 97-2003 binary parser.
//!
//! Text lives in the `WordDocument` stream and is addressed through the
//! piece table (CLX) stored in the `0Table` or `1Table` stream. Which
//! paragraphs belong to table cells is decided from the paragraph property
//! pages (PAPX FKPs); when those are missing, cell and row marks in the
//! text itself are used instead.

use crate::session::WordSession;
use encoding_rs::WINDOWS_1252;
use office_core::{clean_cell, clean_paragraph, Error, Result, Table};
use std::io::{Read, Seek};

/// `wIdent` of every Word 97+ FIB.
const FIB_MAGIC: u16 = 0xA5EC;

/// FibBase flags.
const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_WHICH_TABLE: u16 = 0x0200;
const FLAG_OBFUSCATED: u16 = 0x8000;

/// Offset of `csw`, the start of the variable part of the FIB.
const FIB_RG_W_OFFSET: usize = 32;

/// Indices into `FibRgFcLcb97`.
const FC_PLCF_BTE_PAPX: usize = 13;
const FC_CLX: usize = 33;

/// Bit marking an 8-bit (cp1252) piece in `FcCompressed`.
const FC_COMPRESSED: u32 = 0x4000_0000;

/// Formatted disk pages are 512 bytes.
const FKP_SIZE: usize = 512;
const BX_PAP_SIZE: usize = 13;

/// Paragraph sprms that place a paragraph inside a table.
const SPRM_P_F_IN_TABLE: u16 = 0x2416;
const SPRM_P_F_TTP: u16 = 0x2417;
const SPRM_T_DEF_TABLE: u16 = 0xD608;

/// Special characters of the text stream.
mod chars {
    pub const PARAGRAPH_MARK: char = '\r';
    pub const CELL_MARK: char = '\x07';
    pub const PAGE_BREAK: char = '\x0C';
    pub const LINE_BREAK: char = '\x0B';
    pub const FIELD_BEGIN: char = '\x13';
    pub const FIELD_SEPARATOR: char = '\x14';
    pub const FIELD_END: char = '\x15';
    pub const NON_BREAKING_HYPHEN: char = '\x1E';
    pub const OPTIONAL_HYPHEN: char = '\x1F';
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// The parts of the File Information Block this parser needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fib {
    pub use_table1: bool,
    pub encrypted: bool,
    /// Character count of the main document story.
    pub ccp_text: u32,
    pub fc_clx: u32,
    pub lcb_clx: u32,
    pub fc_plcf_bte_papx: u32,
    pub lcb_plcf_bte_papx: u32,
}

impl Fib {
    /// Parse the FIB at the start of the `WordDocument` stream.
    pub fn parse(stream: &[u8]) -> Result<Self> {
        let truncated = || Error::OpenFailure("Word document header is truncated".to_string());

        let magic = read_u16_le(stream, 0).ok_or_else(truncated)?;
        if magic != FIB_MAGIC {
            return Err(Error::OpenFailure(format!(
                "Not a Word 97-2003 document (FIB identifier 0x{:04X})",
                magic
            )));
        }

        let flags = read_u16_le(stream, 0x0A).ok_or_else(truncated)?;

        let mut pos = FIB_RG_W_OFFSET;
        let csw = read_u16_le(stream, pos).ok_or_else(truncated)? as usize;
        pos += 2 + csw * 2;

        let cslw = read_u16_le(stream, pos).ok_or_else(truncated)? as usize;
        pos += 2;
        // fibRgLw: cbMac, reserved1, reserved2, ccpText, ...
        let ccp_text = if cslw > 3 {
            read_u32_le(stream, pos + 3 * 4).ok_or_else(truncated)?
        } else {
            0
        };
        pos += cslw * 4;

        let cb_rg_fc_lcb = read_u16_le(stream, pos).ok_or_else(truncated)? as usize;
        pos += 2;

        let pair = |index: usize| -> Result<(u32, u32)> {
            if index >= cb_rg_fc_lcb {
                return Ok((0, 0));
            }
            let offset = pos + index * 8;
            let fc = read_u32_le(stream, offset).ok_or_else(truncated)?;
            let lcb = read_u32_le(stream, offset + 4).ok_or_else(truncated)?;
            Ok((fc, lcb))
        };
        let (fc_plcf_bte_papx, lcb_plcf_bte_papx) = pair(FC_PLCF_BTE_PAPX)?;
        let (fc_clx, lcb_clx) = pair(FC_CLX)?;

        Ok(Self {
            use_table1: flags & FLAG_WHICH_TABLE != 0,
            encrypted: flags & (FLAG_ENCRYPTED | FLAG_OBFUSCATED) != 0,
            ccp_text,
            fc_clx,
            lcb_clx,
            fc_plcf_bte_papx,
            lcb_plcf_bte_papx,
        })
    }

    pub fn table_stream_name(&self) -> &'static str {
        if self.use_table1 {
            "1Table"
        } else {
            "0Table"
        }
    }
}

/// A run of text in the `WordDocument` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPiece {
    pub cp_start: u32,
    pub cp_end: u32,
    /// Byte offset of the first character in the `WordDocument` stream.
    pub file_offset: u32,
    /// 8-bit cp1252 text rather than UTF-16LE.
    pub compressed: bool,
}

/// Parse the piece table out of the CLX, skipping any leading `Prc` blocks.
pub fn parse_piece_table(table_stream: &[u8], fc_clx: u32, lcb_clx: u32) -> Result<Vec<TextPiece>> {
    let start = fc_clx as usize;
    let end = start + lcb_clx as usize;
    let clx = table_stream.get(start..end).ok_or_else(|| {
        Error::DecodeFailure("Piece table lies outside the table stream".to_string())
    })?;

    let mut pos = 0;
    while let Some(&clxt) = clx.get(pos) {
        match clxt {
            0x01 => {
                let lcb = read_u32_le(clx, pos + 1).unwrap_or(0) as usize;
                let plc = clx.get(pos + 5..pos + 5 + lcb).ok_or_else(|| {
                    Error::DecodeFailure("Piece table is truncated".to_string())
                })?;
                return Ok(parse_plc_pcd(plc));
            }
            0x02 => {
                let cb = read_u16_le(clx, pos + 1).unwrap_or(0) as usize;
                pos += 3 + cb;
            }
            other => {
                return Err(Error::DecodeFailure(format!(
                    "Unexpected CLX entry type 0x{:02X}",
                    other
                )));
            }
        }
    }

    Err(Error::DecodeFailure("Document has no piece table".to_string()))
}

fn parse_plc_pcd(plc: &[u8]) -> Vec<TextPiece> {
    // n + 1 character positions followed by n 8-byte piece descriptors.
    let count = plc.len().saturating_sub(4) / 12;
    let descriptors = (count + 1) * 4;

    (0..count)
        .filter_map(|i| {
            let cp_start = read_u32_le(plc, i * 4)?;
            let cp_end = read_u32_le(plc, (i + 1) * 4)?;
            let fc = read_u32_le(plc, descriptors + i * 8 + 2)?;
            let compressed = fc & FC_COMPRESSED != 0;
            let file_offset = if compressed {
                (fc & !FC_COMPRESSED) / 2
            } else {
                fc
            };
            Some(TextPiece {
                cp_start,
                cp_end,
                file_offset,
                compressed,
            })
        })
        .collect()
}

/// A decoded character and the stream offset it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DocChar {
    ch: char,
    fc: u32,
}

/// Decode the main document story, at most `limit` characters.
fn decode_text(word_stream: &[u8], pieces: &[TextPiece], limit: u32) -> Vec<DocChar> {
    let mut out = Vec::new();

    for piece in pieces {
        if piece.cp_start >= limit || piece.cp_end <= piece.cp_start {
            continue;
        }
        let chars = (piece.cp_end.min(limit) - piece.cp_start) as usize;
        let width = if piece.compressed { 1 } else { 2 };
        let start = piece.file_offset as usize;
        let Some(bytes) = word_stream.get(start..start + chars * width) else {
            log::warn!(
                "Text piece at offset {} runs past the end of the stream, skipping",
                start
            );
            continue;
        };

        if piece.compressed {
            // cp1252 maps every byte to exactly one character.
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            out.extend(text.chars().enumerate().map(|(i, ch)| DocChar {
                ch,
                fc: piece.file_offset + i as u32,
            }));
        } else {
            let units = bytes.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]]));
            let mut offset = piece.file_offset;
            for decoded in char::decode_utf16(units) {
                let (ch, len) = match decoded {
                    Ok(ch) => (ch, ch.len_utf16()),
                    Err(_) => (char::REPLACEMENT_CHARACTER, 1),
                };
                out.push(DocChar { ch, fc: offset });
                offset += (len * 2) as u32;
            }
        }
    }

    out
}

/// Table membership of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParagraphProps {
    pub in_table: bool,
    /// Terminates a table row.
    pub row_end: bool,
}

/// Paragraph properties indexed by stream offset.
#[derive(Debug, Default)]
struct PropertyIndex {
    /// `(fc_start, fc_end, props)`, sorted by `fc_start`.
    runs: Vec<(u32, u32, ParagraphProps)>,
}

impl PropertyIndex {
    fn load(word_stream: &[u8], table_stream: &[u8], fib: &Fib) -> Option<Self> {
        if fib.lcb_plcf_bte_papx < 4 {
            return None;
        }
        let start = fib.fc_plcf_bte_papx as usize;
        let plc = table_stream.get(start..start + fib.lcb_plcf_bte_papx as usize)?;

        // n + 1 offsets followed by n page numbers.
        let count = (plc.len() - 4) / 8;
        let pages = (count + 1) * 4;

        let mut runs = Vec::new();
        for i in 0..count {
            let pn = read_u32_le(plc, pages + i * 4)? & 0x003F_FFFF;
            let offset = pn as usize * FKP_SIZE;
            match word_stream.get(offset..offset + FKP_SIZE) {
                Some(page) => read_papx_page(page, &mut runs),
                None => log::warn!("Paragraph property page {} is out of range", pn),
            }
        }
        runs.sort_by_key(|run| run.0);

        log::debug!("Loaded {} paragraph property runs", runs.len());
        Some(Self { runs })
    }

    fn lookup(&self, fc: u32) -> ParagraphProps {
        let idx = self.runs.partition_point(|run| run.0 <= fc);
        match idx.checked_sub(1).map(|i| self.runs[i]) {
            Some((start, end, props)) if start <= fc && fc < end => props,
            _ => ParagraphProps::default(),
        }
    }
}

fn read_papx_page(page: &[u8], runs: &mut Vec<(u32, u32, ParagraphProps)>) {
    let crun = page[FKP_SIZE - 1] as usize;
    let bx_start = (crun + 1) * 4;

    for i in 0..crun {
        let (Some(fc_start), Some(fc_end)) = (read_u32_le(page, i * 4), read_u32_le(page, (i + 1) * 4))
        else {
            break;
        };
        let Some(&b_offset) = page.get(bx_start + i * BX_PAP_SIZE) else {
            break;
        };
        let props = if b_offset == 0 {
            ParagraphProps::default()
        } else {
            papx_props(page, b_offset as usize * 2)
        };
        runs.push((fc_start, fc_end, props));
    }
}

/// Read `PapxInFkp` at `offset` and pull out the table flags.
fn papx_props(page: &[u8], offset: usize) -> ParagraphProps {
    let Some(&cb) = page.get(offset) else {
        return ParagraphProps::default();
    };
    let (start, len) = if cb != 0 {
        (offset + 1, cb as usize * 2 - 1)
    } else {
        match page.get(offset + 1) {
            Some(&cb2) => (offset + 2, cb2 as usize * 2),
            None => return ParagraphProps::default(),
        }
    };
    let end = (start + len).min(page.len());

    // Skip the 2-byte style index.
    let grpprl = page.get(start + 2..end).unwrap_or_default();
    grpprl_props(grpprl)
}

fn grpprl_props(grpprl: &[u8]) -> ParagraphProps {
    let mut props = ParagraphProps::default();
    let mut pos = 0;

    while let Some(sprm) = read_u16_le(grpprl, pos) {
        let operand = pos + 2;
        let Some(size) = operand_size(sprm, grpprl, operand) else {
            break;
        };
        let value = grpprl.get(operand).copied().unwrap_or(0);
        match sprm {
            SPRM_P_F_IN_TABLE => props.in_table = value != 0,
            SPRM_P_F_TTP => props.row_end = value != 0,
            _ => {}
        }
        pos = operand + size;
    }

    props
}

/// Operand length in bytes, as encoded by the sprm's `spra` bits.
fn operand_size(sprm: u16, grpprl: &[u8], operand: usize) -> Option<usize> {
    let size = match sprm >> 13 {
        0 | 1 => 1,
        2 | 4 | 5 => 2,
        3 => 4,
        7 => 3,
        _ if sprm == SPRM_T_DEF_TABLE => read_u16_le(grpprl, operand)? as usize + 1,
        _ => *grpprl.get(operand)? as usize + 1,
    };
    Some(size)
}

/// How a paragraph in the text stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Paragraph,
    Cell,
}

#[derive(Debug)]
struct RawParagraph {
    text: String,
    mark: Mark,
    /// Offset of the terminating mark.
    fc: Option<u32>,
}

/// Split the story into paragraphs, dropping field instructions and
/// mapping special characters.
fn split_paragraphs(text: &[DocChar]) -> Vec<RawParagraph> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    // One entry per open field: true once its result part has started.
    let mut fields: Vec<bool> = Vec::new();

    for dc in text {
        match dc.ch {
            chars::PARAGRAPH_MARK | chars::PAGE_BREAK | chars::CELL_MARK => {
                let mark = if dc.ch == chars::CELL_MARK {
                    Mark::Cell
                } else {
                    Mark::Paragraph
                };
                paragraphs.push(RawParagraph {
                    text: std::mem::take(&mut current),
                    mark,
                    fc: Some(dc.fc),
                });
            }
            chars::FIELD_BEGIN => fields.push(false),
            chars::FIELD_SEPARATOR => {
                if let Some(in_result) = fields.last_mut() {
                    *in_result = true;
                }
            }
            chars::FIELD_END => {
                fields.pop();
            }
            _ if fields.iter().any(|in_result| !in_result) => {}
            chars::LINE_BREAK => current.push('\n'),
            chars::NON_BREAKING_HYPHEN => current.push('-'),
            chars::OPTIONAL_HYPHEN => {}
            '\t' => current.push('\t'),
            ch if (ch as u32) < 0x20 => {}
            ch => current.push(ch),
        }
    }

    if !current.is_empty() {
        paragraphs.push(RawParagraph {
            text: current,
            mark: Mark::Paragraph,
            fc: None,
        });
    }

    paragraphs
}

/// Paragraphs and tables of the main story, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentBody {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
}

#[derive(Debug, Default)]
struct BodyBuilder {
    body: DocumentBody,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,
}

impl BodyBuilder {
    fn paragraph(&mut self, text: &str) {
        self.close_table();
        if let Some(text) = clean_paragraph(text) {
            self.body.paragraphs.push(text);
        }
    }

    fn cell_line(&mut self, text: String) {
        self.cell.push(text);
    }

    fn end_cell(&mut self, text: String) {
        self.cell.push(text);
        let joined = std::mem::take(&mut self.cell).join("\n");
        self.row.push(clean_cell(&joined));
    }

    fn end_row(&mut self) {
        if !self.cell.is_empty() {
            let joined = std::mem::take(&mut self.cell).join("\n");
            self.row.push(clean_cell(&joined));
        }
        let row = std::mem::take(&mut self.row);
        self.rows.push(row);
    }

    fn in_row(&self) -> bool {
        !self.row.is_empty() || !self.cell.is_empty()
    }

    fn close_table(&mut self) {
        if self.in_row() {
            self.end_row();
        }
        if !self.rows.is_empty() {
            let rows = std::mem::take(&mut self.rows);
            self.body.tables.push(Table::new(rows));
        }
    }

    fn finish(mut self) -> DocumentBody {
        self.close_table();
        self.body
    }
}

/// Group paragraphs using the table flags from paragraph properties.
fn assemble_with_properties(paragraphs: Vec<RawParagraph>, index: &PropertyIndex) -> DocumentBody {
    let mut builder = BodyBuilder::default();

    for paragraph in paragraphs {
        let props = paragraph
            .fc
            .map(|fc| index.lookup(fc))
            .unwrap_or_default();

        // Cell text goes to its table only and is never counted as a body
        // paragraph, as in docx.
        if props.row_end {
            builder.end_row();
        } else if props.in_table {
            match paragraph.mark {
                Mark::Cell => builder.end_cell(paragraph.text),
                Mark::Paragraph => builder.cell_line(paragraph.text),
            }
        } else {
            builder.paragraph(&paragraph.text);
        }
    }

    builder.finish()
}

/// Group paragraphs from the marks alone: every cell mark closes a cell and
/// an empty paragraph right after a cell mark closes the row.
fn assemble_from_marks(paragraphs: Vec<RawParagraph>) -> DocumentBody {
    let mut builder = BodyBuilder::default();
    let mut after_cell = false;

    for paragraph in paragraphs {
        match paragraph.mark {
            Mark::Cell if after_cell && paragraph.text.is_empty() => {
                builder.end_row();
                after_cell = false;
            }
            Mark::Cell => {
                builder.end_cell(paragraph.text);
                after_cell = true;
            }
            Mark::Paragraph if builder.in_row() => {
                builder.cell_line(paragraph.text);
                after_cell = false;
            }
            Mark::Paragraph => {
                builder.paragraph(&paragraph.text);
                after_cell = false;
            }
        }
    }

    builder.finish()
}

/// Parser for legacy Word (OLE/CFB) files.
pub struct DocParser;

impl DocParser {
    /// Create a new DOC parser.
    pub fn new() -> Self {
        Self
    }

    /// Decode the main story of an open Word session.
    pub fn parse<R: Read + Seek>(&self, session: &mut WordSession<R>) -> Result<DocumentBody> {
        if !session.has_stream("WordDocument") {
            return Err(Error::OpenFailure(
                "Missing 'WordDocument' stream. This is not a Word document".to_string(),
            ));
        }
        let word_stream = session.read_stream("WordDocument")?;

        let fib = Fib::parse(&word_stream)?;
        if fib.encrypted {
            return Err(Error::OpenFailure(
                "Word document is encrypted and cannot be read".to_string(),
            ));
        }
        log::debug!("FIB: {:?}", fib);

        let table_name = fib.table_stream_name();
        if !session.has_stream(table_name) {
            return Err(Error::DecodeFailure(format!(
                "Missing '{}' stream referenced by the document header",
                table_name
            )));
        }
        let table_stream = session.read_stream(table_name)?;

        self.parse_streams(&word_stream, &table_stream, &fib)
    }

    /// Decode from already loaded streams.
    pub fn parse_streams(
        &self,
        word_stream: &[u8],
        table_stream: &[u8],
        fib: &Fib,
    ) -> Result<DocumentBody> {
        let pieces = parse_piece_table(table_stream, fib.fc_clx, fib.lcb_clx)?;
        let limit = if fib.ccp_text > 0 { fib.ccp_text } else { u32::MAX };
        let text = decode_text(word_stream, &pieces, limit);
        log::debug!("Decoded {} characters from {} pieces", text.len(), pieces.len());

        let paragraphs = split_paragraphs(&text);
        let body = match PropertyIndex::load(word_stream, table_stream, fib) {
            Some(index) => assemble_with_properties(paragraphs, &index),
            None => {
                log::debug!("No paragraph properties, grouping tables by cell marks");
                assemble_from_marks(paragraphs)
            }
        };

        log::debug!(
            "Parsed {} paragraphs and {} tables",
            body.paragraphs.len(),
            body.tables.len()
        );
        Ok(body)
    }
}

impl Default for DocParser {
    fn default() -> Self {
        Self::new()
    }
}
