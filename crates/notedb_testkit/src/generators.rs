//! Property-based test generators using proptest.

use crate::markup::{inline_image_bytes, paragraphs};
use proptest::prelude::*;

/// Strategy for a single lowercase word.
pub fn word_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,10}").expect("Invalid regex")
}

/// Strategy for titles that survive sanitization unchanged.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 _-]{0,20}[A-Za-z0-9]|[A-Za-z0-9]")
        .expect("Invalid regex")
}

/// Strategy for a title padded with whitespace, with its sanitized form.
pub fn padded_title_strategy() -> impl Strategy<Value = (String, String)> {
    (
        prop::string::string_regex("[ \t]{0,4}").expect("Invalid regex"),
        title_strategy(),
        prop::string::string_regex("[ \t]{0,4}").expect("Invalid regex"),
    )
        .prop_map(|(lead, title, trail)| (format!("{lead}{title}{trail}"), title))
}

/// Strategy for text made of words separated by whitespace runs.
pub fn spaced_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            word_strategy(),
            prop::string::string_regex("[ \t\n\r]{1,3}").expect("Invalid regex"),
        ),
        0..12,
    )
    .prop_map(|parts| parts.into_iter().map(|(w, s)| format!("{w}{s}")).collect())
}

/// Strategy for note markup: one to four paragraphs of words.
pub fn note_markup_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec(word_strategy(), 1..6), 1..4).prop_map(|paras| {
        let lines: Vec<String> = paras.into_iter().map(|words| words.join(" ")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        paragraphs(&refs)
    })
}

/// Strategy for image payloads.
pub fn image_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..128)
}

/// Strategy for an inline PNG image element with random bytes.
pub fn inline_image_strategy() -> impl Strategy<Value = (String, Vec<u8>)> {
    image_bytes_strategy().prop_map(|bytes| (inline_image_bytes("image/png", &bytes), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn titles_have_no_edge_whitespace(title in title_strategy()) {
            prop_assert_eq!(title.trim(), title.as_str());
            prop_assert!(!title.is_empty());
        }

        #[test]
        fn padded_titles_trim_to_their_core((padded, core) in padded_title_strategy()) {
            prop_assert_eq!(padded.trim(), core.as_str());
        }
    }
}
