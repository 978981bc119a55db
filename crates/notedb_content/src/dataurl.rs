//! `data:` URL parsing and formatting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A parsed `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    /// Declared media type, if any (`image/png`).
    pub mime: Option<&'a str>,
    /// True if the payload is base64 encoded.
    pub base64: bool,
    /// Payload exactly as written after the comma.
    pub data: &'a str,
}

impl DataUrl<'_> {
    /// Returns the payload bytes.
    ///
    /// Base64 payloads are returned as their ASCII text (the blob store
    /// decodes them); other payloads are percent-decoded.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        if self.base64 {
            self.data.bytes().filter(|b| !b.is_ascii_whitespace()).collect()
        } else {
            urlencoding::decode_binary(self.data.as_bytes()).into_owned()
        }
    }
}

/// Parses `src` as a `data:` URL. Returns `None` for any other URL.
#[must_use]
pub fn parse(src: &str) -> Option<DataUrl<'_>> {
    let src = src.trim();
    let scheme = src.get(..5)?;
    if !scheme.eq_ignore_ascii_case("data:") {
        return None;
    }
    let (header, data) = src[5..].split_once(',')?;

    let mut params = header.split(';');
    let mime = params
        .next()
        .map(str::trim)
        .filter(|mime| !mime.is_empty());
    let base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));

    Some(DataUrl { mime, base64, data })
}

/// Formats bytes as a base64 `data:` URL.
#[must_use]
pub fn format(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_image() {
        let url = parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(url.mime, Some("image/png"));
        assert!(url.base64);
        assert_eq!(url.data, "iVBORw0KGgo=");
        assert_eq!(url.payload(), b"iVBORw0KGgo=".to_vec());
    }

    #[test]
    fn parses_plain_payload_without_mime() {
        let url = parse("DATA:,hello%20world").unwrap();
        assert_eq!(url.mime, None);
        assert!(!url.base64);
        assert_eq!(url.payload(), b"hello world".to_vec());
    }

    #[test]
    fn malformed_escapes_are_kept_literally() {
        assert_eq!(parse("data:text/plain,a%+9b").unwrap().payload(), b"a%+9b".to_vec());
        assert_eq!(parse("data:text/plain,100%").unwrap().payload(), b"100%".to_vec());
        assert_eq!(parse("data:,%41%42").unwrap().payload(), b"AB".to_vec());
    }

    #[test]
    fn rejects_other_urls() {
        assert!(parse("https://example.com/a.png").is_none());
        assert!(parse("data:image/png;base64").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn format_produces_base64_url() {
        assert_eq!(format("image/gif", b"GIF89a"), "data:image/gif;base64,R0lGODlh");
    }
}
