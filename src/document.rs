use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Document formats with a dedicated extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Epub,
    Pdf,
    #[serde(rename = "text")]
    PlainText,
}

impl DocumentFormat {
    /// Map a lower-cased extension (with leading dot) to a format
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".epub" => Some(Self::Epub),
            ".pdf" => Some(Self::Pdf),
            ".txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Epub => ".epub",
            Self::Pdf => ".pdf",
            Self::PlainText => ".txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Epub => "EPUB",
            Self::Pdf => "PDF",
            Self::PlainText => "text",
        };
        f.write_str(name)
    }
}

/// Uploaded document as handed over by a front-end.
///
/// The bytes are borrowed from the caller and never modified.
#[derive(Debug, Clone, Copy)]
pub struct SourceDocument<'a> {
    pub filename: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> SourceDocument<'a> {
    pub fn new(filename: &'a str, bytes: &'a [u8]) -> Self {
        Self { filename, bytes }
    }

    /// Lower-cased extension including the leading dot, or an empty string.
    ///
    /// Dotfiles such as `.epub` have no extension.
    pub fn extension(&self) -> String {
        Path::new(self.filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_extension(&self.extension())
    }
}

/// Successful extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub text: String,
    pub source_filename: String,
    pub format: DocumentFormat,
    /// Number of chapters or pages that contributed to `text`
    pub units: usize,
}

impl ExtractedText {
    /// Join cleaned units with a blank line between them.
    pub(crate) fn from_units(
        source: &SourceDocument<'_>,
        format: DocumentFormat,
        units: Vec<String>,
    ) -> Self {
        Self {
            text: units.join("\n\n"),
            source_filename: source.filename.to_string(),
            format,
            units: units.len(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
