//! Request options and their validation.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parse the textual boolean forms accepted for `include_content`.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidOption(format!(
            "include_content must be true/false, got '{}'",
            value
        ))),
    }
}

/// How a slide deck result is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The assembled content string.
    #[default]
    Full,
    /// A per-slide list instead of the content string.
    List,
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(Self::Full),
            "list" => Ok(Self::List),
            other => Err(Error::InvalidOption(format!(
                "output_mode must be one of [\"full\", \"list\"], got '{}'",
                other
            ))),
        }
    }
}

/// An optional 1-based inclusive `[start, end]` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeRequest {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl RangeRequest {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }
}

/// Everything a caller asks of one extraction call.
///
/// Option values are kept as given and validated by the pipeline after
/// the file checks, so a bad value still produces an envelope.
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    pub path: PathBuf,

    /// Paragraph, page or slide range depending on the format.
    pub unit_range: RangeRequest,

    /// Table range; within the selected slides for decks.
    pub table_range: RangeRequest,

    /// Raw `include_content` text; `None` means true.
    pub include_content: Option<String>,

    /// Raw `output_mode` text; `None` means full.
    pub output_mode: Option<String>,
}

impl ExtractRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_unit_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.unit_range = RangeRequest::new(start, end);
        self
    }

    pub fn with_table_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.table_range = RangeRequest::new(start, end);
        self
    }

    pub fn with_include_content(mut self, value: impl Into<String>) -> Self {
        self.include_content = Some(value.into());
        self
    }

    pub fn with_output_mode(mut self, value: impl Into<String>) -> Self {
        self.output_mode = Some(value.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate the option values.
    pub fn options(&self) -> Result<ExtractOptions> {
        let include_content = match &self.include_content {
            Some(value) => parse_bool(value)?,
            None => true,
        };
        let output_mode = match &self.output_mode {
            Some(value) => value.parse()?,
            None => OutputMode::default(),
        };
        Ok(ExtractOptions {
            include_content,
            output_mode,
        })
    }
}

/// Validated option values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub include_content: bool,
    pub output_mode: OutputMode,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_content: true,
            output_mode: OutputMode::Full,
        }
    }
}
