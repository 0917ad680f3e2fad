use std::borrow::Cow;
use tracing::{info, warn};

use super::extractor::Extractor;
use super::text_processor::normalize;
use crate::document::{DocumentFormat, ExtractedText, SourceDocument};
use crate::error::ExtractionError;
use crate::ExtractionResult;

/// Plain text extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor {
    strict_utf8: bool,
}

impl PlainTextExtractor {
    pub fn new(strict_utf8: bool) -> Self {
        Self { strict_utf8 }
    }

    fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, ExtractionError> {
        if self.strict_utf8 {
            return std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| ExtractionError::DecodeError(e.to_string()));
        }

        let text = String::from_utf8_lossy(bytes);
        if let Cow::Owned(_) = text {
            warn!("Text file is not valid UTF-8, invalid sequences were replaced");
        }
        Ok(text)
    }
}

impl Extractor for PlainTextExtractor {
    /// Empty output is still a success; length policies belong to the front-end.
    fn extract(&self, document: &SourceDocument<'_>) -> ExtractionResult {
        info!("Extracting text from text file: {}", document.filename);

        let text = normalize(&self.decode(document.bytes)?);

        Ok(ExtractedText::from_units(
            document,
            DocumentFormat::PlainText,
            vec![text],
        ))
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::PlainText
    }
}
