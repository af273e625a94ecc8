//! Core extraction contract for office documents: range selection, table
//! flattening, content assembly, statistics and the result envelope shared
//! by every format adapter.

pub mod adapter;
pub mod assemble;
pub mod envelope;
pub mod error;
pub mod normalize;
pub mod options;
pub mod pipeline;
pub mod range;
pub mod stats;
pub mod types;

pub use adapter::Adapter;
pub use envelope::{ExtractionResult, SlideEntry};
pub use error::{Error, ErrorKind, Result};
pub use normalize::{clean_cell, clean_paragraph};
pub use options::{parse_bool, ExtractOptions, ExtractRequest, OutputMode, RangeRequest};
pub use pipeline::extract;
pub use range::SelectionRange;
pub use stats::Statistics;
pub use types::{
    DecodedDocument, DocumentFormat, DocumentInfo, DocumentMetadata, ShapeContent, Slide, Table, Unit,
};
