use tracing::{debug, warn};

use crate::config::{Capabilities, ExtractConfig};
use crate::document::{DocumentFormat, SourceDocument};
use crate::error::ExtractionError;
use crate::utils::{EpubExtractor, Extractor, PlainTextExtractor};
#[cfg(feature = "pdf")]
use crate::utils::PdfExtractor;
use crate::ExtractionResult;

/// Routes a document to the extractor matching its file extension.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of concurrent callers.
#[derive(Debug, Clone)]
pub struct ExtractionDispatcher {
    capabilities: Capabilities,
    epub: EpubExtractor,
    #[cfg(feature = "pdf")]
    pdf: PdfExtractor,
    text: PlainTextExtractor,
}

impl ExtractionDispatcher {
    pub fn new(config: &ExtractConfig) -> Self {
        Self::with_capabilities(config, Capabilities::detect())
    }

    /// Restrict dispatch to a subset of the compiled-in formats
    pub fn with_capabilities(config: &ExtractConfig, capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            epub: EpubExtractor::new(config.epub_strategy, config.keep_empty_items),
            #[cfg(feature = "pdf")]
            pdf: PdfExtractor::new(),
            text: PlainTextExtractor::new(config.strict_utf8),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn extractor_for(&self, format: DocumentFormat) -> Option<&dyn Extractor> {
        if !self.capabilities.supports(format) {
            return None;
        }
        match format {
            DocumentFormat::Epub => Some(&self.epub),
            #[cfg(feature = "pdf")]
            DocumentFormat::Pdf => Some(&self.pdf),
            #[cfg(not(feature = "pdf"))]
            DocumentFormat::Pdf => None,
            DocumentFormat::PlainText => Some(&self.text),
        }
    }

    /// Extract text from `bytes`, choosing the extractor from `filename`.
    ///
    /// The extension is trusted as-is: a PDF uploaded as `.epub` fails with
    /// `InvalidArchive` rather than being re-routed.
    pub fn dispatch(&self, filename: &str, bytes: &[u8]) -> ExtractionResult {
        let document = SourceDocument::new(filename, bytes);
        let extension = document.extension();

        let extractor = document
            .format()
            .and_then(|format| self.extractor_for(format))
            .ok_or_else(|| {
                warn!("Unsupported file type {:?} for {}", extension, filename);
                ExtractionError::UnsupportedType(extension.clone())
            })?;

        debug!(
            "Dispatching {} ({} bytes) to the {} extractor",
            filename,
            bytes.len(),
            extractor.format()
        );

        extractor.extract(&document)
    }
}

impl Default for ExtractionDispatcher {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}
