pub mod epub_package;
pub mod epub_parser;
pub mod extractor;
#[cfg(feature = "pdf")]
pub mod pdf_parser;
pub mod plain_text;
pub mod text_processor;

#[cfg(test)]
pub(crate) mod fixtures;

pub use epub_parser::EpubExtractor;
pub use extractor::Extractor;
#[cfg(feature = "pdf")]
pub use pdf_parser::PdfExtractor;
pub use plain_text::PlainTextExtractor;
pub use text_processor::{decode_entities, normalize};
