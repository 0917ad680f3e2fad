// Library exports for the CLI, the batch tool and any HTTP front-end

pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod response;
pub mod utils;

// Re-export commonly used types
pub use config::{Capabilities, EpubStrategy, ExtractConfig};
pub use dispatch::ExtractionDispatcher;
pub use document::{DocumentFormat, ExtractedText, SourceDocument};
pub use error::ExtractionError;
pub use utils::normalize;

/// Success carries the cleaned text, failure a typed error kind
pub type ExtractionResult = Result<ExtractedText, ExtractionError>;

/// Extract normalized text from an uploaded file with default settings.
///
/// This is the one operation every front-end calls.
pub fn extract_text(filename: &str, content: &[u8]) -> ExtractionResult {
    ExtractionDispatcher::default().dispatch(filename, content)
}
