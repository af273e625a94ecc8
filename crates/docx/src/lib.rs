//! DOCX (Office Open XML) decoder.
//!
//! Reads the main document part of a .docx package and yields its
//! top-level paragraphs and tables.

pub mod adapter;
pub mod parser;

pub use adapter::DocxAdapter;
pub use parser::DocxParser;
