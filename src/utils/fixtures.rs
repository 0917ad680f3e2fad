//! In-memory documents for tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

pub(crate) fn container_xml(full_path: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        full_path
    )
}

/// Package document with `(id, href)` manifest items and a spine of idrefs
pub(crate) fn package_opf(manifest: &[(&str, &str)], spine: &[&str]) -> String {
    let items: String = manifest
        .iter()
        .map(|(id, href)| {
            format!(
                r#"    <item id="{}" href="{}" media-type="application/xhtml+xml"/>
"#,
                id, href
            )
        })
        .collect();
    let itemrefs: String = spine
        .iter()
        .map(|idref| format!("    <itemref idref=\"{}\"/>\n", idref))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Fixture</dc:title>
    <dc:identifier id="uid">urn:uuid:fixture</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
{}  </manifest>
  <spine>
{}  </spine>
</package>"#,
        items, itemrefs
    )
}

pub(crate) fn xhtml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter title</title><style>p {{ margin: 0; }}</style></head>
<body>{}</body>
</html>"#,
        body
    )
}

/// EPUB whose manifest declares chapters in the given order and whose spine
/// lists `spine` idrefs. Chapter `id` lives at `OEBPS/text/<id>.xhtml`.
pub(crate) fn epub_with_spine(chapters: &[(&str, &str)], spine: &[&str]) -> Vec<u8> {
    let hrefs: Vec<(String, String)> = chapters
        .iter()
        .map(|(id, _)| (id.to_string(), format!("text/{}.xhtml", id)))
        .collect();
    let manifest: Vec<(&str, &str)> = hrefs
        .iter()
        .map(|(id, href)| (id.as_str(), href.as_str()))
        .collect();

    let container = container_xml("OEBPS/content.opf");
    let opf = package_opf(&manifest, spine);
    let bodies: Vec<(String, String)> = chapters
        .iter()
        .map(|(id, body)| (format!("OEBPS/text/{}.xhtml", id), xhtml(body)))
        .collect();

    let mut entries: Vec<(&str, &[u8])> = vec![
        ("mimetype", b"application/epub+zip".as_slice()),
        ("META-INF/container.xml", container.as_bytes()),
        ("OEBPS/content.opf", opf.as_bytes()),
    ];
    for (path, body) in &bodies {
        entries.push((path.as_str(), body.as_bytes()));
    }

    build_zip(&entries)
}

/// EPUB whose spine follows manifest order
pub(crate) fn epub(chapters: &[(&str, &str)]) -> Vec<u8> {
    let spine: Vec<&str> = chapters.iter().map(|(id, _)| *id).collect();
    epub_with_spine(chapters, &spine)
}

/// Single-page-per-entry PDF; each page shows its string with a core font.
/// An empty string produces a page without text.
#[cfg(feature = "pdf")]
pub(crate) fn pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
