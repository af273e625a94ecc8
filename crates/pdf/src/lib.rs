//! PDF decoder: per-page text and document information metadata.

pub mod adapter;
pub mod parser;

pub use adapter::PdfAdapter;
pub use parser::PdfParser;
