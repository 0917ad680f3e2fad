use lazy_static::lazy_static;
use regex::Regex;
use std::io::{self, Cursor, Read, Seek};
use tracing::{debug, info, warn};
use zip::ZipArchive;

#[cfg(feature = "epub-library")]
use epub::doc::EpubDoc;

use super::epub_package::{parse_container, parse_package, CONTAINER_PATH};
use super::extractor::{collect_units, Extractor};
use super::text_processor::normalize;
use crate::config::EpubStrategy;
use crate::document::{DocumentFormat, ExtractedText, SourceDocument};
use crate::error::ExtractionError;
use crate::ExtractionResult;

lazy_static! {
    /// Blocks whose text is never part of the readable content
    static ref RE_NON_CONTENT: Vec<Regex> = ["head", "script", "style"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{0}\b[^>]*?(?:/>|>.*?</{0}\s*>)", tag)).unwrap()
        })
        .collect();
    static ref RE_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
}

/// EPUB text extractor
#[derive(Debug, Clone, Default)]
pub struct EpubExtractor {
    strategy: EpubStrategy,
    keep_empty_items: bool,
}

impl EpubExtractor {
    pub fn new(strategy: EpubStrategy, keep_empty_items: bool) -> Self {
        Self {
            strategy,
            keep_empty_items,
        }
    }

    /// Raw chapter markup in spine order, read straight from the package document
    fn chapters_from_package(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::InvalidArchive(e.to_string()))?;

        let container = read_entry(&mut archive, CONTAINER_PATH).map_err(|e| {
            ExtractionError::MalformedContainer(format!("cannot read {}: {}", CONTAINER_PATH, e))
        })?;
        let package_path = parse_container(&container)?;

        let package_doc = read_entry(&mut archive, &package_path).map_err(|e| {
            ExtractionError::InvalidPackageStructure(format!(
                "cannot read package document {}: {}",
                package_path, e
            ))
        })?;
        let package = parse_package(&package_path, &package_doc)?;

        debug!(
            "Package {}: {} manifest items, {} spine items",
            package_path,
            package.manifest.len(),
            package.spine.len()
        );

        let mut chapters = Vec::new();

        for entry in package.reading_order() {
            let path = match entry {
                Ok(path) => path,
                Err(idref) => {
                    warn!("Spine idref {:?} is not in the manifest, skipping", idref);
                    continue;
                }
            };

            match read_entry(&mut archive, &path) {
                Ok(content) => chapters.push(String::from_utf8_lossy(&content).into_owned()),
                Err(e) => warn!("Failed to read EPUB item {:?}: {}", path, e),
            }
        }

        Ok(chapters)
    }

    /// Raw chapter markup in spine order, as loaded by the `epub` crate
    #[cfg(feature = "epub-library")]
    fn chapters_from_library(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let mut doc = EpubDoc::from_reader(Cursor::new(bytes))
            .map_err(|e| ExtractionError::InvalidArchive(e.to_string()))?;

        let spine_len = doc.spine.len();
        let mut chapters = Vec::with_capacity(spine_len);

        for index in 0..spine_len {
            match doc.get_current_str() {
                Some((content, _mime)) => chapters.push(content),
                None => warn!("Failed to read EPUB spine item {}", index),
            }

            if !doc.go_next() {
                break;
            }
        }

        Ok(chapters)
    }

    #[cfg(not(feature = "epub-library"))]
    fn chapters_from_library(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        warn!("Built without the `epub-library` feature, using the package strategy");
        self.chapters_from_package(bytes)
    }
}

impl Extractor for EpubExtractor {
    fn extract(&self, document: &SourceDocument<'_>) -> ExtractionResult {
        info!(
            "Extracting text from EPUB: {} ({} strategy)",
            document.filename, self.strategy
        );

        let chapters = match self.strategy {
            EpubStrategy::Package => self.chapters_from_package(document.bytes)?,
            EpubStrategy::Library => self.chapters_from_library(document.bytes)?,
        };

        let cleaned = chapters
            .iter()
            .map(|html| normalize(&flatten_html(html)))
            .collect();
        let units = collect_units(cleaned, self.keep_empty_items, DocumentFormat::Epub)?;

        info!("Extracted {} chapters from EPUB", units.len());

        Ok(ExtractedText::from_units(document, DocumentFormat::Epub, units))
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Epub
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> io::Result<Vec<u8>> {
    let mut file = archive.by_name(name).map_err(io::Error::from)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Remove markup whose text is not readable content (document head,
/// scripts, styles, comments). Remaining tags are left to [`normalize`].
pub fn flatten_html(html: &str) -> String {
    let mut text = RE_COMMENT.replace_all(html, " ").into_owned();

    for re in RE_NON_CONTENT.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures;

    fn extract(bytes: &[u8]) -> ExtractionResult {
        EpubExtractor::default().extract(&SourceDocument::new("book.epub", bytes))
    }

    #[test]
    fn test_flatten_html() {
        let html = "<head><title>T</title></head><p>Text</p><script>alert('hi');</script>\
                    <!-- note --><style type=\"text/css\">p{}</style><p>More text</p>";
        let text = normalize(&flatten_html(html));
        assert_eq!(text, "Text More text");
    }

    #[test]
    fn test_flatten_keeps_header_elements() {
        let text = normalize(&flatten_html("<header>Kept</header><script src=\"a.js\"/>After"));
        assert_eq!(text, "Kept After");
    }

    #[test]
    fn test_single_item() {
        let bytes = fixtures::epub(&[("c1", "<p>Hello &amp; welcome</p>")]);
        let extracted = extract(&bytes).unwrap();
        assert_eq!(extracted.text, "Hello & welcome");
        assert_eq!(extracted.source_filename, "book.epub");
        assert_eq!(extracted.format, DocumentFormat::Epub);
    }

    #[test]
    fn test_items_joined_with_blank_line() {
        let bytes = fixtures::epub(&[("a", "<p>A</p>"), ("b", "<p>B</p>")]);
        assert_eq!(extract(&bytes).unwrap().text, "A\n\nB");
    }

    #[test]
    fn test_spine_order_wins_over_manifest_order() {
        let bytes = fixtures::epub_with_spine(
            &[("first", "<p>Manifest first</p>"), ("second", "<p>Manifest second</p>")],
            &["second", "first"],
        );
        assert_eq!(
            extract(&bytes).unwrap().text,
            "Manifest second\n\nManifest first"
        );
    }

    #[test]
    fn test_unknown_idref_is_skipped() {
        let bytes = fixtures::epub_with_spine(
            &[("a", "<p>A</p>"), ("b", "<p>B</p>")],
            &["a", "ghost", "b"],
        );
        let extracted = extract(&bytes).unwrap();
        assert_eq!(extracted.text, "A\n\nB");
        assert_eq!(extracted.units, 2);
    }

    #[test]
    fn test_missing_item_entry_is_skipped() {
        let container = fixtures::container_xml("content.opf");
        let opf = fixtures::package_opf(&[("a", "a.xhtml"), ("b", "b.xhtml")], &["a", "b"]);
        let chapter = fixtures::xhtml("<p>Only B</p>");
        let bytes = fixtures::build_zip(&[
            ("META-INF/container.xml", container.as_bytes()),
            ("content.opf", opf.as_bytes()),
            ("b.xhtml", chapter.as_bytes()),
        ]);
        assert_eq!(extract(&bytes).unwrap().text, "Only B");
    }

    #[test]
    fn test_invalid_utf8_item_is_decoded_lossily() {
        let container = fixtures::container_xml("content.opf");
        let opf = fixtures::package_opf(&[("a", "a.xhtml")], &["a"]);
        let bytes = fixtures::build_zip(&[
            ("META-INF/container.xml", container.as_bytes()),
            ("content.opf", opf.as_bytes()),
            ("a.xhtml", b"<p>caf\xe9 ok</p>".as_slice()),
        ]);
        assert_eq!(extract(&bytes).unwrap().text, "caf\u{FFFD} ok");
    }

    #[test]
    fn test_empty_chapters_are_skipped_by_default() {
        let bytes = fixtures::epub(&[
            ("a", "<p>A</p>"),
            ("blank", "<img src=\"x.png\"/>"),
            ("b", "<p>B</p>"),
        ]);
        assert_eq!(extract(&bytes).unwrap().text, "A\n\nB");

        let keeping = EpubExtractor::new(EpubStrategy::Package, true);
        let extracted = keeping
            .extract(&SourceDocument::new("book.epub", &bytes))
            .unwrap();
        assert_eq!(extracted.text, "A\n\n\n\nB");
    }

    #[test]
    fn test_no_text_content() {
        let bytes = fixtures::epub(&[("a", "<img src=\"cover.png\"/>")]);
        assert_eq!(extract(&bytes).unwrap_err().kind(), "NoTextContent");
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract(b"definitely not a zip").unwrap_err();
        assert_eq!(err.kind(), "InvalidArchive");
    }

    #[test]
    fn test_missing_container() {
        let bytes = fixtures::build_zip(&[("mimetype", b"application/epub+zip".as_slice())]);
        assert_eq!(extract(&bytes).unwrap_err().kind(), "MalformedContainer");
    }

    #[test]
    fn test_unparseable_container() {
        let bytes = fixtures::build_zip(&[(
            "META-INF/container.xml",
            b"<container><rootfiles></container>".as_slice(),
        )]);
        assert_eq!(extract(&bytes).unwrap_err().kind(), "MalformedContainer");
    }

    #[test]
    fn test_missing_package_document() {
        let container = fixtures::container_xml("OEBPS/content.opf");
        let bytes = fixtures::build_zip(&[("META-INF/container.xml", container.as_bytes())]);
        assert_eq!(extract(&bytes).unwrap_err().kind(), "InvalidPackageStructure");
    }

    #[test]
    fn test_package_without_spine() {
        let container = fixtures::container_xml("content.opf");
        let opf = r#"<package xmlns="http://www.idpf.org/2007/opf"><manifest/></package>"#;
        let bytes = fixtures::build_zip(&[
            ("META-INF/container.xml", container.as_bytes()),
            ("content.opf", opf.as_bytes()),
        ]);
        assert_eq!(extract(&bytes).unwrap_err().kind(), "InvalidPackageStructure");
    }

    #[cfg(feature = "epub-library")]
    #[test]
    fn test_library_strategy_matches_package_strategy() {
        let bytes = fixtures::epub_with_spine(
            &[("a", "<p>Alpha &amp; omega</p>"), ("b", "<p>Beta</p>")],
            &["b", "a"],
        );
        let document = SourceDocument::new("book.epub", &bytes);

        let library = EpubExtractor::new(EpubStrategy::Library, false)
            .extract(&document)
            .unwrap();
        let package = EpubExtractor::new(EpubStrategy::Package, false)
            .extract(&document)
            .unwrap();
        assert_eq!(library.text, package.text);
        assert_eq!(library.text, "Beta\n\nAlpha & omega");
    }

    #[cfg(feature = "epub-library")]
    #[test]
    fn test_library_strategy_rejects_garbage() {
        let err = EpubExtractor::new(EpubStrategy::Library, false)
            .extract(&SourceDocument::new("book.epub", b"garbage"))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArchive");
    }
}
