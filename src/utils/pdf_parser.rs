use lopdf::Document;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

use super::extractor::{collect_units, Extractor};
use super::text_processor::normalize;
use crate::document::{DocumentFormat, ExtractedText, SourceDocument};
use crate::error::ExtractionError;
use crate::ExtractionResult;

/// PDF text extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, document: &SourceDocument<'_>) -> ExtractionResult {
        info!("Extracting text from PDF: {}", document.filename);

        let pdf = Document::load_mem(document.bytes)
            .map_err(|e| ExtractionError::InvalidPdf(e.to_string()))?;

        let pages = match extract_pages(document.bytes) {
            Ok(pages) => pages,
            Err(reason) => {
                warn!("{}, falling back to page-by-page extraction", reason);
                extract_pages_fallback(&pdf)
            }
        };

        debug!("Read {} pages from PDF", pages.len());

        // Image-only pages come back blank and are dropped.
        let cleaned = pages
            .iter()
            .filter(|page| !page.trim().is_empty())
            .map(|page| normalize(page))
            .collect();
        let units = collect_units(cleaned, false, DocumentFormat::Pdf)?;

        info!("Extracted text from {} PDF pages", units.len());

        Ok(ExtractedText::from_units(document, DocumentFormat::Pdf, units))
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }
}

/// Per-page text via `pdf_extract`, which understands font encodings.
///
/// `pdf_extract` can panic on malformed input, so panics are turned into errors.
fn extract_pages(data: &[u8]) -> Result<Vec<String>, String> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(format!("PDF text extraction failed: {}", e)),
        Err(_) => Err("PDF text extraction panicked".to_string()),
    }
}

/// Page-by-page text via `lopdf`; an unreadable page is logged and left blank.
fn extract_pages_fallback(pdf: &Document) -> Vec<String> {
    pdf.get_pages()
        .into_keys()
        .map(|page_number| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| pdf.extract_text(&[page_number])));

            match result {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    warn!("Failed to extract text from PDF page {}: {}", page_number, e);
                    String::new()
                }
                Err(_) => {
                    warn!("Text extraction panicked on PDF page {}", page_number);
                    String::new()
                }
            }
        })
        .collect()
}
