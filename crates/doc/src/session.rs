//! Scoped access to a Word compound file.

use cfb::CompoundFile;
use office_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

/// Owns an open compound file for the duration of one decode call.
///
/// The underlying handle is released when the session is dropped, on
/// success and failure paths alike.
pub struct WordSession<R: Read + Seek = BufReader<File>> {
    cfb: CompoundFile<R>,
    label: PathBuf,
}

impl WordSession<BufReader<File>> {
    /// Open the compound file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open("Cannot read doc file", e))?;
        Self::from_reader(BufReader::new(file), path)
    }
}

impl<R: Read + Seek> WordSession<R> {
    /// Open a compound file from any seekable reader.
    pub fn from_reader(reader: R, label: impl Into<PathBuf>) -> Result<Self> {
        let label = label.into();
        let cfb = CompoundFile::open(reader)
            .map_err(|e| Error::open("Not an OLE compound document", e))?;
        log::debug!("Opened Word session for '{}'", label.display());
        Ok(Self { cfb, label })
    }

    pub fn has_stream(&self, name: &str) -> bool {
        self.cfb.is_stream(stream_path(name))
    }

    /// Read a whole root-level stream into memory.
    pub fn read_stream(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = stream_path(name);
        let mut stream = self
            .cfb
            .open_stream(&path)
            .map_err(|e| Error::decode(&format!("Failed to open '{}' stream", name), e))?;

        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .map_err(|e| Error::decode(&format!("Failed to read '{}' stream", name), e))?;
        Ok(data)
    }
}

impl<R: Read + Seek> Drop for WordSession<R> {
    fn drop(&mut self) {
        log::debug!("Released Word session for '{}'", self.label.display());
    }
}

fn stream_path(name: &str) -> String {
    format!("/{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cfb = CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        for (name, data) in streams {
            let mut stream = cfb.create_stream(stream_path(name)).unwrap();
            stream.write_all(data).unwrap();
        }
        cfb.flush().unwrap();
        cfb.into_inner().into_inner()
    }

    #[test]
    fn test_read_stream() {
        let bytes = compound_file(&[("WordDocument", b"abc")]);
        let mut session = WordSession::from_reader(Cursor::new(bytes), "memory.doc").unwrap();

        assert!(session.has_stream("WordDocument"));
        assert!(!session.has_stream("1Table"));
        assert_eq!(session.read_stream("WordDocument").unwrap(), b"abc");
    }

    #[test]
    fn test_missing_stream_is_decode_failure() {
        let bytes = compound_file(&[("WordDocument", b"abc")]);
        let mut session = WordSession::from_reader(Cursor::new(bytes), "memory.doc").unwrap();

        let err = session.read_stream("0Table").unwrap_err();
        assert!(matches!(err, Error::DecodeFailure(_)));
    }

    #[test]
    fn test_not_a_compound_file() {
        let result = WordSession::from_reader(Cursor::new(b"{\\rtf1 hello}".to_vec()), "x.doc");
        assert!(matches!(result, Err(Error::OpenFailure(_))));
    }
}
