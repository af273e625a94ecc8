//! The capability every format decoder provides to the pipeline.

use crate::error::Result;
use crate::types::{DecodedDocument, DocumentFormat};
use std::path::Path;

/// A format-specific decoder producing primitive sequences.
///
/// Implementations own their document handle for the duration of
/// [`Adapter::decode`] and must release it on every exit path. Open and
/// decrypt problems are reported as `Error::OpenFailure`, problems during
/// the structural walk as `Error::DecodeFailure`.
pub trait Adapter {
    /// The format this adapter accepts.
    fn format(&self) -> DocumentFormat;

    /// Decode the file at `path`, which is known to exist and to carry the
    /// adapter's extension.
    fn decode(&self, path: &Path) -> Result<DecodedDocument>;
}
