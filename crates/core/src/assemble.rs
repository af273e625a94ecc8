//! Content assembly: how selected paragraphs, pages, slides and tables are
//! joined into the final text.
//!
//! Output for each layout:
//!
//! ```text
//! paragraph one            page one text         slide one title
//! paragraph two                                  a<TAB>b
//!                          page three text        notes: speaker notes
//! a<TAB>b
//! c<TAB>d                                        slide two text
//!
//! x<TAB>y
//! ```

use crate::envelope::SlideEntry;
use crate::range::SelectionRange;
use crate::types::{ShapeContent, Slide, Table};

/// Separator between independent blocks (table blocks, pages, slides).
const BLOCK_SEPARATOR: &str = "\n\n";

/// Marker that introduces a slide's speaker notes.
pub const NOTES_MARKER: &str = " notes: ";

/// Word-like layout: paragraphs first, then every table as its own block.
pub fn flow_content(paragraphs: &[String], tables: &[Table]) -> String {
    let mut parts = Vec::with_capacity(2);
    if !paragraphs.is_empty() {
        parts.push(paragraphs.join("\n"));
    }
    if !tables.is_empty() {
        let blocks: Vec<String> = tables.iter().map(Table::flatten).collect();
        parts.push(blocks.join(BLOCK_SEPARATOR));
    }
    parts.join(BLOCK_SEPARATOR).trim().to_string()
}

/// Paginated layout: one block per page, empty pages contribute nothing.
pub fn paged_content(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
        .trim()
        .to_string()
}

/// Everything derived from walking the selected slides once.
#[derive(Debug, Clone, Default)]
pub struct DeckAssembly<'a> {
    /// Assembled deck content, before any suppression.
    pub content: String,

    /// Per-slide entries for list output, one per selected slide.
    pub slides: Vec<SlideEntry>,

    /// Tables inside the table range, in deck order.
    pub tables: Vec<&'a Table>,
}

/// Slide deck layout.
///
/// Tables are numbered across `slides` (already the selected slide range);
/// only those whose ordinal falls in `table_range` are rendered or counted.
pub fn deck_content(slides: &[Slide], table_range: SelectionRange) -> DeckAssembly<'_> {
    let mut assembly = DeckAssembly::default();
    let mut blocks = Vec::new();
    let mut table_ordinal = 0;

    for slide in slides {
        let mut segments: Vec<String> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        let mut tables: Vec<String> = Vec::new();

        for shape in &slide.shapes {
            match shape {
                ShapeContent::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        segments.push(text.to_string());
                        texts.push(text.to_string());
                    }
                }
                ShapeContent::Table(table) => {
                    let in_range = table_range.contains(table_ordinal);
                    table_ordinal += 1;
                    if !in_range {
                        continue;
                    }
                    assembly.tables.push(table);

                    let flattened = table.flatten().trim().to_string();
                    if !flattened.is_empty() {
                        segments.push(flattened.clone());
                        tables.push(flattened);
                    }
                }
            }
        }

        if let Some(notes) = slide.notes.as_deref().map(str::trim) {
            if !notes.is_empty() {
                let segment = format!("{}{}", NOTES_MARKER, notes);
                segments.push(segment.clone());
                texts.push(segment);
            }
        }

        if !segments.is_empty() {
            blocks.push(segments.join("\n"));
        }

        assembly.slides.push(SlideEntry {
            slide_index: slide.number,
            texts: texts.join("\n").trim().to_string(),
            tables,
        });
    }

    assembly.content = blocks.join(BLOCK_SEPARATOR).trim().to_string();
    assembly
}

/// Count the tables hosted by `slides`, for numbering the table range.
pub fn deck_table_total(slides: &[Slide]) -> usize {
    slides.iter().map(|slide| slide.tables().count()).sum()
}
