use lazy_static::lazy_static;
use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};

lazy_static! {
    static ref RE_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref RE_ENTITY: Regex =
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z][A-Za-z0-9]*)(;?)").unwrap();
    static ref RE_CONTROL: Regex = Regex::new(r"[\x00-\x09\x0B\x0C\x0E-\x1F\x7F-\x9F]").unwrap();
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Names HTML5 still decodes without a trailing semicolon
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren", "deg",
    "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34", "gt",
    "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// Windows-1252 readings of numeric references 0x80..=0x9F. Unassigned
/// bytes keep their C1 code point.
const C1_REPLACEMENTS: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{8D}', '\u{017D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{9D}', '\u{017E}', '\u{0178}',
];

/// Clean extracted text into its canonical plain-text form.
///
/// Markup tags become a single space, entity references are decoded,
/// control characters are dropped, and every whitespace run (newlines
/// included) becomes one space. Tag stripping, entity decoding and control
/// removal repeat until nothing changes, so escaped markup such as
/// `&lt;p&gt;` cannot survive and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();

    // Every pass that changes something shortens the text in chars.
    loop {
        let stripped = RE_TAG.replace_all(&text, " ");
        let decoded = decode_entities(&stripped);
        let cleaned = RE_CONTROL.replace_all(&decoded, "").into_owned();

        if cleaned == text {
            break;
        }
        text = cleaned;
    }

    // No separate blank-line pass: this already leaves no newlines at all.
    let collapsed = RE_WHITESPACE.replace_all(&text, " ");

    collapsed.trim().to_string()
}

/// Decode named and numeric character references the way an HTML5
/// parser does.
///
/// The terminating semicolon is optional for numeric references and for
/// the legacy names in [`LEGACY_ENTITIES`], which also match as a prefix
/// (`&copy2024` is `©2024`). Numeric references 0x80..=0x9F take their
/// Windows-1252 meaning, surrogates and values past U+10FFFF become
/// U+FFFD, and noncharacters or control code points decode to nothing.
/// Anything else is kept verbatim.
pub fn decode_entities(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let semicolon = &caps[2];

            if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                return numeric_reference(u32::from_str_radix(hex, 16).ok());
            }
            if let Some(decimal) = entity.strip_prefix('#') {
                return numeric_reference(decimal.parse::<u32>().ok());
            }

            if !semicolon.is_empty() {
                if let Some(value) = resolve_html5_entity(entity) {
                    return value.to_string();
                }
            }

            // Longest legacy name the reference starts with
            for len in (2..=entity.len()).rev() {
                let name = &entity[..len];
                if !LEGACY_ENTITIES.iter().any(|known| *known == name) {
                    continue;
                }
                if let Some(value) = resolve_html5_entity(name) {
                    return format!("{}{}{}", value, &entity[len..], semicolon);
                }
            }

            caps[0].to_string()
        })
        .into_owned()
}

fn numeric_reference(code: Option<u32>) -> String {
    let code = match code {
        Some(code) => code,
        None => return char::REPLACEMENT_CHARACTER.to_string(),
    };

    match code {
        0 => char::REPLACEMENT_CHARACTER.to_string(),
        0x0D => "\r".to_string(),
        0x80..=0x9F => C1_REPLACEMENTS[(code - 0x80) as usize].to_string(),
        0xD800..=0xDFFF | 0x110000.. => char::REPLACEMENT_CHARACTER.to_string(),
        0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F | 0xFDD0..=0xFDEF => String::new(),
        _ if code & 0xFFFE == 0xFFFE => String::new(),
        _ => char::from_u32(code)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string(),
    }
}
