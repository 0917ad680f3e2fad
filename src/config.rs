use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::document::DocumentFormat;

/// How EPUB reading order is discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpubStrategy {
    /// Parse `container.xml` and the package document directly
    #[default]
    Package,
    /// Let the `epub` crate load the book model
    Library,
}

impl fmt::Display for EpubStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => f.write_str("package"),
            Self::Library => f.write_str("library"),
        }
    }
}

/// Formats this build can extract.
///
/// Optional backends are cargo features, so this is computed once at startup
/// instead of being probed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub epub: bool,
    pub epub_library: bool,
    pub pdf: bool,
    pub text: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self {
            epub: true,
            epub_library: cfg!(feature = "epub-library"),
            pdf: cfg!(feature = "pdf"),
            text: true,
        }
    }

    pub fn supports(&self, format: DocumentFormat) -> bool {
        match format {
            DocumentFormat::Epub => self.epub,
            DocumentFormat::Pdf => self.pdf,
            DocumentFormat::PlainText => self.text,
        }
    }

    /// Extensions accepted by this build, leading dot included
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        [DocumentFormat::Epub, DocumentFormat::Pdf, DocumentFormat::PlainText]
            .into_iter()
            .filter(|format| self.supports(*format))
            .map(|format| format.extension())
            .collect()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub epub_strategy: EpubStrategy,
    /// Keep chapters whose cleaned text is empty as empty paragraphs
    pub keep_empty_items: bool,
    /// Reject `.txt` uploads that are not valid UTF-8 instead of decoding lossily
    pub strict_utf8: bool,
    /// Minimum trimmed character count a front-end accepts; 0 disables the check
    pub min_text_length: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            epub_strategy: EpubStrategy::Package,
            keep_empty_items: false,
            strict_utf8: false,
            min_text_length: 10,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from a JSON file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epub_strategy == EpubStrategy::Library {
            anyhow::ensure!(
                Capabilities::detect().epub_library,
                "epub_strategy \"library\" requires the `epub-library` feature"
            );
        }
        Ok(())
    }
}

impl fmt::Display for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
