use crate::document::{DocumentFormat, SourceDocument};
use crate::error::ExtractionError;
use crate::ExtractionResult;

/// Trait for per-format text extraction
pub trait Extractor: Send + Sync {
    /// Extract normalized text from the document bytes
    fn extract(&self, document: &SourceDocument<'_>) -> ExtractionResult;

    /// Format handled by this extractor
    fn format(&self) -> DocumentFormat;
}

/// Drop empty cleaned units (unless asked to keep them) and fail when
/// nothing readable is left.
pub(crate) fn collect_units(
    units: Vec<String>,
    keep_empty: bool,
    format: DocumentFormat,
) -> Result<Vec<String>, ExtractionError> {
    let units: Vec<String> = units
        .into_iter()
        .filter(|unit| keep_empty || !unit.is_empty())
        .collect();

    if units.iter().all(|unit| unit.trim().is_empty()) {
        return Err(ExtractionError::NoTextContent(format.to_string()));
    }

    Ok(units)
}
