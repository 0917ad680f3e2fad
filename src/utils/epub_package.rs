//! Container and package-document parsing for EPUB archives.
//!
//! Only the parts needed to walk the reading order are read: the package
//! document location from `META-INF/container.xml`, and the manifest and
//! spine from the package document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::ExtractionError;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const CONTAINER_NAMESPACE: &[u8] = b"urn:oasis:names:tc:opendocument:xmlns:container";
pub const PACKAGE_NAMESPACE: &[u8] = b"http://www.idpf.org/2007/opf";

/// Manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub href: String,
    pub media_type: Option<String>,
}

/// Parsed package document
#[derive(Debug, Clone, Default)]
pub struct EpubPackage {
    /// Archive path of the package document itself
    pub package_path: String,
    /// item-id -> manifest entry
    pub manifest: HashMap<String, ManifestItem>,
    /// idrefs in reading order
    pub spine: Vec<String>,
}

impl EpubPackage {
    /// Directory of the package document, used to resolve manifest hrefs
    pub fn base_dir(&self) -> &str {
        parent(&self.package_path)
    }

    /// Archive paths of the spine items in reading order.
    ///
    /// Idrefs that do not resolve in the manifest are reported as `Err(idref)`
    /// so the caller can log and skip them.
    pub fn reading_order(&self) -> Vec<Result<String, &str>> {
        self.spine
            .iter()
            .map(|idref| match self.manifest.get(idref) {
                Some(item) => Ok(resolve(self.base_dir(), &item.href)),
                None => Err(idref.as_str()),
            })
            .collect()
    }
}

/// Element matches when its local name is right and it is either in the
/// expected namespace or in no namespace at all.
fn is_element(ns: &ResolveResult, el: &BytesStart, local_name: &[u8], namespace: &[u8]) -> bool {
    if el.local_name().as_ref() != local_name {
        return false;
    }
    match ns {
        ResolveResult::Bound(Namespace(bound)) => *bound == namespace,
        ResolveResult::Unbound => true,
        ResolveResult::Unknown(_) => false,
    }
}

fn attribute(el: &BytesStart, key: &str) -> Option<String> {
    let attr = el.try_get_attribute(key).ok().flatten()?;
    let raw = String::from_utf8_lossy(&attr.value).into_owned();

    match quick_xml::escape::unescape(&raw) {
        Ok(Cow::Owned(value)) => Some(value),
        _ => Some(raw),
    }
}

/// Locate the package document path in `META-INF/container.xml`.
pub fn parse_container(data: &[u8]) -> Result<String, ExtractionError> {
    let mut reader = NsReader::from_reader(data);

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(el))) | Ok((ns, Event::Empty(el)))
                if is_element(&ns, &el, b"rootfile", CONTAINER_NAMESPACE) =>
            {
                return match attribute(&el, "full-path") {
                    Some(path) if !path.trim().is_empty() => {
                        Ok(path.trim().trim_start_matches('/').to_string())
                    }
                    _ => Err(ExtractionError::MalformedContainer(
                        "rootfile element has no full-path attribute".to_string(),
                    )),
                };
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractionError::MalformedContainer(format!(
                    "unparseable {}: {}",
                    CONTAINER_PATH, e
                )))
            }
        }
    }

    Err(ExtractionError::MalformedContainer(format!(
        "no rootfile element in {}",
        CONTAINER_PATH
    )))
}

/// Parse manifest and spine out of a package document.
pub fn parse_package(package_path: &str, data: &[u8]) -> Result<EpubPackage, ExtractionError> {
    let mut reader = NsReader::from_reader(data);

    let mut manifest = HashMap::new();
    let mut spine = Vec::new();
    let mut seen_manifest = false;
    let mut seen_spine = false;
    let mut in_manifest = false;
    let mut in_spine = false;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(|e| {
            ExtractionError::InvalidPackageStructure(format!(
                "unparseable package document {}: {}",
                package_path, e
            ))
        })?;

        // An empty `<manifest/>` or `<spine/>` still counts as present.
        let is_start = matches!(event, Event::Start(_));

        match event {
            Event::Start(el) | Event::Empty(el) => {
                if is_element(&ns, &el, b"manifest", PACKAGE_NAMESPACE) {
                    seen_manifest = true;
                    in_manifest = is_start;
                } else if is_element(&ns, &el, b"spine", PACKAGE_NAMESPACE) {
                    seen_spine = true;
                    in_spine = is_start;
                } else if in_manifest && is_element(&ns, &el, b"item", PACKAGE_NAMESPACE) {
                    if let (Some(id), Some(href)) = (attribute(&el, "id"), attribute(&el, "href")) {
                        let media_type = attribute(&el, "media-type");
                        manifest.insert(id, ManifestItem { href, media_type });
                    }
                } else if in_spine && is_element(&ns, &el, b"itemref", PACKAGE_NAMESPACE) {
                    if let Some(idref) = attribute(&el, "idref") {
                        spine.push(idref);
                    }
                }
            }
            Event::End(el) => match el.local_name().as_ref() {
                b"manifest" => in_manifest = false,
                b"spine" => in_spine = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    match (seen_manifest, seen_spine) {
        (true, true) => Ok(EpubPackage {
            package_path: package_path.to_string(),
            manifest,
            spine,
        }),
        (false, _) => Err(ExtractionError::InvalidPackageStructure(format!(
            "no manifest element in {}",
            package_path
        ))),
        (_, false) => Err(ExtractionError::InvalidPackageStructure(format!(
            "no spine element in {}",
            package_path
        ))),
    }
}

pub fn parent(path: &str) -> &str {
    path.rfind('/').map_or("", |index| &path[..index])
}

/// Resolve a manifest href against the package directory into an archive path.
///
/// The href is percent-decoded, its query/fragment dropped, and `.`/`..`
/// segments collapsed. `..` never climbs above the archive root.
pub fn resolve(base_dir: &str, href: &str) -> String {
    let main = href.find(['?', '#']).map_or(href, |position| &href[..position]);
    let decoded = percent_encoding::percent_decode_str(main).decode_utf8_lossy();

    let joined = if decoded.starts_with('/') {
        PathBuf::from(decoded.trim_start_matches('/'))
    } else {
        Path::new(base_dir).join(decoded.as_ref())
    };

    let mut stack = Vec::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(part) => stack.push(part.to_string_lossy().into_owned()),
            _ => {}
        }
    }

    stack.join("/")
}
