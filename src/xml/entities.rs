//! Bundled entity table.
//!
//! Feeds routinely reference the Netscape RSS 0.91 DTD or the XHTML DTDs and
//! then use the HTML entities those declare (`&nbsp;`, `&eacute;`, ...).
//! Instead of fetching the DTD, the parser resolves entities against this
//! fixed local table. `<!ENTITY>` declarations in the document itself are
//! never honoured.

use std::collections::HashMap;
use std::sync::OnceLock;

/// ISO-8859-1 entities in code point order, starting at U+00A0.
const LATIN1: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave",
    "Eacute", "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve",
    "Oacute", "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml",
    "Yacute", "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig",
    "ccedil", "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth",
    "ntilde", "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave",
    "uacute", "ucirc", "uuml", "yacute", "thorn", "yuml",
];

/// HTML 4 special and punctuation entities commonly found in feed bodies.
const SPECIAL: [(&str, u32); 32] = [
    ("OElig", 0x152),
    ("oelig", 0x153),
    ("Scaron", 0x160),
    ("scaron", 0x161),
    ("Yuml", 0x178),
    ("fnof", 0x192),
    ("circ", 0x2C6),
    ("tilde", 0x2DC),
    ("ensp", 0x2002),
    ("emsp", 0x2003),
    ("thinsp", 0x2009),
    ("zwnj", 0x200C),
    ("zwj", 0x200D),
    ("lrm", 0x200E),
    ("rlm", 0x200F),
    ("ndash", 0x2013),
    ("mdash", 0x2014),
    ("lsquo", 0x2018),
    ("rsquo", 0x2019),
    ("sbquo", 0x201A),
    ("ldquo", 0x201C),
    ("rdquo", 0x201D),
    ("bdquo", 0x201E),
    ("dagger", 0x2020),
    ("Dagger", 0x2021),
    ("bull", 0x2022),
    ("hellip", 0x2026),
    ("permil", 0x2030),
    ("lsaquo", 0x2039),
    ("rsaquo", 0x203A),
    ("euro", 0x20AC),
    ("trade", 0x2122),
];

fn table() -> &'static HashMap<&'static str, String> {
    static TABLE: OnceLock<HashMap<&'static str, String>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = HashMap::with_capacity(LATIN1.len() + SPECIAL.len());
        for (offset, name) in LATIN1.iter().enumerate() {
            if let Some(ch) = char::from_u32(0xA0 + offset as u32) {
                map.insert(*name, ch.to_string());
            }
        }
        for (name, code) in SPECIAL {
            if let Some(ch) = char::from_u32(code) {
                map.insert(name, ch.to_string());
            }
        }
        map
    })
}

/// Resolves a named entity (without `&` and `;`).
///
/// Character references (`&#233;`) are handled by the unescaper itself and
/// never reach this function.
pub(crate) fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => table().get(name).map(String::as_str),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_entities() {
        assert_eq!(resolve_entity("amp"), Some("&"));
        assert_eq!(resolve_entity("quot"), Some("\""));
    }

    #[test]
    fn test_latin1_table_is_aligned() {
        assert_eq!(resolve_entity("nbsp"), Some("\u{a0}"));
        assert_eq!(resolve_entity("eacute"), Some("é"));
        assert_eq!(resolve_entity("yuml"), Some("ÿ"));
    }

    #[test]
    fn test_special_entities() {
        assert_eq!(resolve_entity("mdash"), Some("—"));
        assert_eq!(resolve_entity("euro"), Some("€"));
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(resolve_entity("xxe"), None);
        assert_eq!(resolve_entity("NBSP"), None);
    }
}
