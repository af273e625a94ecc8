//! PPTX (Office Open XML) slide decoder.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents,
//! into slides of shape text, tables and speaker notes.

pub mod adapter;
pub mod parser;

pub use adapter::PptxAdapter;
pub use parser::PptxParser;
