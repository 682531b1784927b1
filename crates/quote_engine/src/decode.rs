use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// How far into the page a `<meta charset>` declaration is looked for.
const META_PRESCAN_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode bytes with {encoding}")]
    Malformed { encoding: String },
}

/// Reads and decodes a saved page.
pub fn load_page(path: &Path, charset_hint: Option<&str>) -> Result<DecodedPage, DecodeError> {
    let bytes = fs::read(path).map_err(|source| DecodeError::Read {
        path: path.display().to_string(),
        source,
    })?;
    decode_page(&bytes, charset_hint)
}

/// Decodes page bytes using: BOM -> caller hint -> `<meta>` charset -> chardetng guess.
pub fn decode_page(bytes: &[u8], charset_hint: Option<&str>) -> Result<DecodedPage, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let declared = charset_hint
        .and_then(|hint| Encoding::for_label(charset_label(hint).as_bytes()))
        .or_else(|| meta_charset(bytes));
    if let Some(encoding) = declared {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

/// Accepts either a bare label or a `Content-Type` value with `charset=`.
fn charset_label(hint: &str) -> &str {
    hint.split(';')
        .map(str::trim)
        .find_map(|part| {
            part.get(..8)
                .filter(|prefix| prefix.eq_ignore_ascii_case("charset="))
                .map(|_| &part[8..])
        })
        .unwrap_or(hint)
        .trim_matches([' ', '"', '\''].as_ref())
}

fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.'))
        .collect();
    Encoding::for_label(label.as_bytes())
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedPage, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(DecodedPage {
        html: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{charset_label, decode_page};

    #[test]
    fn hint_accepts_content_type_or_label() {
        assert_eq!(charset_label("text/html; charset=ISO-8859-1"), "ISO-8859-1");
        assert_eq!(charset_label("text/html; Charset=\"utf-8\""), "utf-8");
        assert_eq!(charset_label("windows-1252"), "windows-1252");
    }

    #[test]
    fn hint_selects_encoding() {
        let decoded = decode_page(b"caf\xe9", Some("iso-8859-1")).unwrap();
        assert_eq!(decoded.html, "caf\u{e9}");
    }

    #[test]
    fn bom_wins_over_hint() {
        let decoded = decode_page(b"\xEF\xBB\xBFhello", Some("iso-8859-1")).unwrap();
        assert_eq!(decoded.html, "hello");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn meta_charset_is_honoured() {
        let bytes = b"<html><head><meta charset=\"windows-1252\"></head><p>caf\xe9</p>";
        let decoded = decode_page(bytes, None).unwrap();
        assert_eq!(decoded.encoding_label, "windows-1252");
        assert!(decoded.html.contains("caf\u{e9}"));
    }

    #[test]
    fn malformed_utf8_is_an_error() {
        assert!(decode_page(b"ab\xc3", Some("utf-8")).is_err());
    }
}
