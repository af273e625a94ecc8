//! The extraction pipeline shared by every adapter:
//! validate → decode → select → assemble → measure → envelope.

use crate::adapter::Adapter;
use crate::assemble::{deck_content, deck_table_total, flow_content, paged_content};
use crate::envelope::ExtractionResult;
use crate::error::{Error, Result};
use crate::options::{ExtractOptions, ExtractRequest, OutputMode};
use crate::range::SelectionRange;
use crate::stats::Statistics;
use crate::types::{DecodedDocument, DocumentFormat};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Run one extraction call. Always returns an envelope.
pub fn extract<A: Adapter + ?Sized>(adapter: &A, request: &ExtractRequest) -> ExtractionResult {
    let format = adapter.format();
    match run(adapter, request) {
        Ok(result) => result,
        Err(err) => {
            log::warn!(
                "Extraction of '{}' failed ({:?}): {}",
                request.path().display(),
                err.kind(),
                err
            );
            ExtractionResult::failure(format, request.path(), &err)
        }
    }
}

fn run<A: Adapter + ?Sized>(adapter: &A, request: &ExtractRequest) -> Result<ExtractionResult> {
    let format = adapter.format();
    let path = request.path();

    validate_path(path, format)?;
    let options = request.options()?;

    log::debug!("Decoding '{}' as {:?}", path.display(), format);
    let document = decode_guarded(adapter, path)?;

    Ok(build(format, request, &options, document))
}

/// File checks, in order: existence, then extension.
pub fn validate_path(path: &Path, format: DocumentFormat) -> Result<()> {
    let is_file = std::fs::metadata(path)
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    if !format.matches_path(path) {
        return Err(Error::WrongFormat {
            expected: format.extension(),
        });
    }

    Ok(())
}

/// Decode, turning a decoder panic into a decode failure.
fn decode_guarded<A: Adapter + ?Sized>(adapter: &A, path: &Path) -> Result<DecodedDocument> {
    match panic::catch_unwind(AssertUnwindSafe(|| adapter.decode(path))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "decoder panicked".to_string());
            Err(Error::DecodeFailure(message))
        }
    }
}

fn build(
    format: DocumentFormat,
    request: &ExtractRequest,
    options: &ExtractOptions,
    document: DecodedDocument,
) -> ExtractionResult {
    let path = request.path();
    let units = request.unit_range;
    let table_request = request.table_range;
    let unit = format.unit();

    let result = match document {
        DecodedDocument::Flow { paragraphs, tables } => {
            let paragraph_range =
                SelectionRange::normalize(paragraphs.len(), units.start, units.end);
            let table_range =
                SelectionRange::normalize(tables.len(), table_request.start, table_request.end);

            let paragraphs = paragraph_range.select(&paragraphs);
            let tables = table_range.select(&tables);

            let content = flow_content(paragraphs, tables);
            let statistics = Statistics::collect(unit, paragraphs.len(), tables, &content);
            ExtractionResult::success(format, path, content, statistics)
        }
        DecodedDocument::Paged { pages, metadata } => {
            let page_range = SelectionRange::normalize(pages.len(), units.start, units.end);
            let pages = page_range.select(&pages);

            let content = paged_content(pages);
            let statistics = Statistics::collect(unit, pages.len(), std::iter::empty(), &content);
            ExtractionResult::success(format, path, content, statistics).with_metadata(metadata)
        }
        DecodedDocument::Deck { slides } => {
            let slide_range = SelectionRange::normalize(slides.len(), units.start, units.end);
            let slides = slide_range.select(&slides);
            let table_range = SelectionRange::normalize(
                deck_table_total(slides),
                table_request.start,
                table_request.end,
            );

            let assembly = deck_content(slides, table_range);
            let statistics = Statistics::collect(
                unit,
                slides.len(),
                assembly.tables.iter().copied(),
                &assembly.content,
            );

            match options.output_mode {
                OutputMode::Full => {
                    ExtractionResult::success(format, path, assembly.content, statistics)
                }
                OutputMode::List => {
                    ExtractionResult::success(format, path, String::new(), statistics)
                        .with_slides(assembly.slides)
                }
            }
        }
    };

    log::debug!(
        "Selected {} {:?} unit(s), {} table(s), {} chars",
        result.statistics.unit_count,
        unit,
        result.statistics.table_count,
        result.statistics.char_count
    );

    if options.include_content {
        result
    } else {
        result.suppress_content()
    }
}
