//! Legacy Word (OLE/CFB) decoder.
//!
//! Reads `.doc` files written by Word 97 and later: the `WordDocument`
//! stream, its piece table and paragraph properties. Older formats and
//! encrypted documents are rejected as open failures.

pub mod adapter;
pub mod parser;
pub mod session;

pub use adapter::DocAdapter;
pub use parser::DocParser;
pub use session::WordSession;
