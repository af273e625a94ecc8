//! Text cleanup shared by the format decoders.
//!
//! Decoders hand the core trimmed paragraphs and cleaned cells; these
//! helpers are the single place that decides what "clean" means.

use regex::Regex;
use std::sync::LazyLock;

/// Carriage return, cell/row end mark and vertical tab.
static CELL_CONTROL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\x07\x0B]").unwrap());

/// Line endings of any flavor.
static LINE_ENDING_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());

/// Clean a table cell: drop control marks, then trim surrounding whitespace.
pub fn clean_cell(text: &str) -> String {
    CELL_CONTROL_REGEX.replace_all(text, "").trim().to_string()
}

/// Trim a paragraph, returning `None` when nothing is left.
pub fn clean_paragraph(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    LINE_ENDING_REGEX.replace_all(text, "\n").into_owned()
}
