//! PDF text and metadata extraction on top of `lopdf`.

use lopdf::{Dictionary, Document, Object};
use office_core::normalize::normalize_line_endings;
use office_core::{DocumentInfo, DocumentMetadata, Error, Result};
use std::path::Path;

const ENCRYPTED_MESSAGE: &str = "PDF is encrypted and cannot be read without a password";

/// A loaded, readable PDF.
pub struct PdfParser {
    doc: Document,
}

impl PdfParser {
    /// Load the document at `path`, decrypting it with the empty password
    /// when it is encrypted.
    pub fn load(path: &Path) -> Result<Self> {
        let doc = Document::load(path).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::OpenFailure(ENCRYPTED_MESSAGE.to_string()),
            other => Error::open("Cannot read PDF", other),
        })?;
        Self::from_document(doc)
    }

    /// Wrap an already loaded document.
    pub fn from_document(mut doc: Document) -> Result<Self> {
        if doc.is_encrypted() {
            log::debug!("PDF is encrypted, trying the empty password");
            if let Err(e) = doc.decrypt("") {
                log::debug!("Empty-password decryption failed: {}", e);
                return Err(Error::OpenFailure(ENCRYPTED_MESSAGE.to_string()));
            }
        }
        Ok(Self { doc })
    }

    /// Trimmed text of every page, in page order.
    ///
    /// A page whose text cannot be extracted contributes an empty string.
    pub fn pages(&self) -> Vec<String> {
        self.doc
            .get_pages()
            .keys()
            .map(|&number| match self.doc.extract_text(&[number]) {
                Ok(text) => normalize_line_endings(&text).trim().to_string(),
                Err(e) => {
                    log::warn!("Cannot extract text from page {}: {}", number, e);
                    String::new()
                }
            })
            .collect()
    }

    /// Fields of the trailer's document information dictionary, empty when
    /// the trailer has none.
    pub fn metadata(&self) -> DocumentMetadata {
        let Some(info) = self.info() else {
            return DocumentMetadata::default();
        };

        DocumentMetadata::from_info(DocumentInfo {
            title: info_string(info, b"Title"),
            author: info_string(info, b"Author"),
            creator: info_string(info, b"Creator"),
            producer: info_string(info, b"Producer"),
            subject: info_string(info, b"Subject"),
        })
    }

    fn info(&self) -> Option<&Dictionary> {
        match self.doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.doc.get_object(*id).ok()?.as_dict().ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

/// A text string entry, decoded as PDFDocEncoding, UTF-16BE or UTF-8 by
/// its byte order mark.
fn info_string(info: &Dictionary, key: &[u8]) -> Option<String> {
    match info.get(key).ok()? {
        obj @ Object::String(..) => match lopdf::decode_text_string(obj) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Cannot decode /{}: {}", String::from_utf8_lossy(key), e);
                None
            }
        },
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream, StringFormat};

    /// A document with one page per entry of `pages`.
    pub(crate) fn build_pdf(pages: &[&str], info: Option<Dictionary>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let mut operations = Vec::new();
            if !text.is_empty() {
                operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ];
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }
        doc
    }

    fn utf16_string(text: &str) -> Object {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(text.encode_utf16().flat_map(|u| u.to_be_bytes()));
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    fn literal(bytes: &[u8]) -> Object {
        Object::String(bytes.to_vec(), StringFormat::Literal)
    }

    #[test]
    fn test_info_string_encodings() {
        let info = dictionary! {
            "Plain" => literal(b"Plain"),
            "Latin" => literal(&[0x43, 0x61, 0x66, 0xE9]),
            "Punctuation" => literal(b"A\x84B \x8Dq\x8E"),
            "Wide" => literal(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69, 0x4E, 0x2D]),
            "Empty" => literal(b""),
            "Named" => Object::Name(b"Draft".to_vec()),
            "Number" => 3,
        };

        assert_eq!(info_string(&info, b"Plain").as_deref(), Some("Plain"));
        assert_eq!(info_string(&info, b"Latin").as_deref(), Some("Caf\u{e9}"));
        assert_eq!(
            info_string(&info, b"Punctuation").as_deref(),
            Some("A\u{2014}B \u{201c}q\u{201d}")
        );
        assert_eq!(info_string(&info, b"Wide").as_deref(), Some("Hi\u{4e2d}"));
        assert_eq!(info_string(&info, b"Empty").as_deref(), Some(""));
        assert_eq!(info_string(&info, b"Named").as_deref(), Some("Draft"));
        assert_eq!(info_string(&info, b"Number"), None);
        assert_eq!(info_string(&info, b"Missing"), None);
    }

    #[test]
    fn test_pages_in_order() {
        let parser = PdfParser::from_document(build_pdf(&["Hello first", "", "Hello third"], None))
            .unwrap();

        let pages = parser.pages();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Hello first"));
        assert_eq!(pages[1], "");
        assert!(pages[2].contains("Hello third"));
        assert!(pages.iter().all(|p| p.trim() == p));
    }

    #[test]
    fn test_metadata() {
        let info = dictionary! {
            "Title" => Object::string_literal("Annual Report"),
            "Author" => utf16_string("Zo\u{eb}"),
            "Producer" => Object::string_literal("lopdf"),
        };
        let parser = PdfParser::from_document(build_pdf(&["x"], Some(info))).unwrap();

        let metadata = parser.metadata();
        let info = metadata.info.as_ref().unwrap();
        assert_eq!(info.title.as_deref(), Some("Annual Report"));
        assert_eq!(info.author.as_deref(), Some("Zo\u{eb}"));
        assert_eq!(info.producer.as_deref(), Some("lopdf"));
        assert_eq!(info.creator, None);
        assert_eq!(info.subject, None);

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["title"], "Annual Report");
        assert!(value["creator"].is_null());
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_missing_info() {
        let parser = PdfParser::from_document(build_pdf(&["x"], None)).unwrap();
        assert_eq!(parser.metadata(), DocumentMetadata::default());
    }
}
