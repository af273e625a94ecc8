//! Error taxonomy shared by every format adapter.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end an extraction call.
///
/// Every variant is recovered at the adapter boundary and reported through
/// the envelope's `error` field; none of them escapes as a fault.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not reference an existing regular file.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file extension does not match the adapter's format.
    #[error("Unsupported file type: only .{expected} files are accepted")]
    WrongFormat { expected: &'static str },

    /// A request option carried an unsupported value.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The document could not be opened, decrypted or recognized.
    #[error("Cannot open file: {0}")]
    OpenFailure(String),

    /// Any failure raised while walking an opened document.
    #[error("{0}")]
    DecodeFailure(String),
}

/// Coarse classification of an [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    WrongFormat,
    InvalidOption,
    OpenFailure,
    DecodeFailure,
}

impl Error {
    /// Build an open failure from any displayable cause.
    pub fn open(context: &str, cause: impl std::fmt::Display) -> Self {
        Self::OpenFailure(format!("{}: {}", context, cause))
    }

    /// Build a decode failure from any displayable cause.
    pub fn decode(context: &str, cause: impl std::fmt::Display) -> Self {
        Self::DecodeFailure(format!("{}: {}", context, cause))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound(_) => ErrorKind::FileNotFound,
            Error::WrongFormat { .. } => ErrorKind::WrongFormat,
            Error::InvalidOption(_) => ErrorKind::InvalidOption,
            Error::OpenFailure(_) => ErrorKind::OpenFailure,
            Error::DecodeFailure(_) => ErrorKind::DecodeFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::FileNotFound(PathBuf::from("/no/such.docx"));
        assert_eq!(err.to_string(), "File not found: /no/such.docx");

        let err = Error::WrongFormat { expected: "pdf" };
        assert_eq!(
            err.to_string(),
            "Unsupported file type: only .pdf files are accepted"
        );

        let err = Error::decode("Failed to read slide", "truncated");
        assert_eq!(err.to_string(), "Failed to read slide: truncated");
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            Error::InvalidOption("x".into()).kind(),
            ErrorKind::InvalidOption
        );
        assert_eq!(
            Error::open("Failed to open ZIP", "bad header").kind(),
            ErrorKind::OpenFailure
        );
    }
}
