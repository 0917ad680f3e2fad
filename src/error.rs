use thiserror::Error;

/// Typed extraction failure.
///
/// Structural problems with a document are fatal and surface here; problems
/// with a single chapter or page are logged and skipped by the extractors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The EPUB bytes are not a readable zip archive.
    #[error("invalid EPUB archive: {0}")]
    InvalidArchive(String),

    /// `META-INF/container.xml` is missing or does not reference a package document.
    #[error("malformed EPUB container: {0}")]
    MalformedContainer(String),

    /// The package document is missing, unparseable, or lacks a manifest or spine.
    #[error("invalid EPUB package structure: {0}")]
    InvalidPackageStructure(String),

    #[error("invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("no text content found in {0}")]
    NoTextContent(String),

    /// Carries the lower-cased extension, leading dot included (empty when absent).
    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),

    #[error("failed to decode content: {0}")]
    DecodeError(String),
}

impl ExtractionError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArchive(_) => "InvalidArchive",
            Self::MalformedContainer(_) => "MalformedContainer",
            Self::InvalidPackageStructure(_) => "InvalidPackageStructure",
            Self::InvalidPdf(_) => "InvalidPdf",
            Self::NoTextContent(_) => "NoTextContent",
            Self::UnsupportedType(_) => "UnsupportedType",
            Self::DecodeError(_) => "DecodeError",
        }
    }

    /// Whether the failure is caused by the uploaded content rather than by
    /// the extractor itself.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::DecodeError(_))
    }
}
