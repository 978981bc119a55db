//! Sample note markup.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Base64 of the 8-byte PNG signature; a tiny stand-in image payload.
pub const PNG_BASE64: &str = "iVBORw0KGgo=";

/// Base64 of the JPEG start-of-image marker.
pub const JPEG_BASE64: &str = "/9j/4AAQ";

/// An `<img>` with an inline base64 `data:` source.
pub fn inline_image(mime: &str, base64: &str) -> String {
    format!(r#"<img src="data:{mime};base64,{base64}">"#)
}

/// An `<img>` with inline data built from raw bytes.
pub fn inline_image_bytes(mime: &str, bytes: &[u8]) -> String {
    inline_image(mime, &STANDARD.encode(bytes))
}

/// An `<img>` that already references stored bytes.
pub fn hashed_image(hash: &str) -> String {
    format!(r#"<img data-hash="{hash}">"#)
}

/// One `<p>` per line of text.
pub fn paragraphs(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("<p>{line}</p>")).collect()
}

/// A typical body: a heading, two paragraphs and an inline image.
pub fn sample_note() -> String {
    format!(
        "<h1>Trip plan</h1>{}{}",
        paragraphs(&["Book the train. Pack light", "Remember the charger"]),
        inline_image("image/png", PNG_BASE64)
    )
}
