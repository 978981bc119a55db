//! Plain-text heuristics: title, headline and query matching.
//!
//! These operate on already extracted plain text. Their cut-off rules are
//! relied upon by clients that store derived titles, so they are kept
//! literal rather than sentence-aware.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

/// Whitespace runs a title may contain before it is cut.
pub const TITLE_WHITESPACE_RUNS: usize = 4;

fn is_break(ch: char) -> bool {
    matches!(ch, '\n' | '\t' | '\r' | ' ')
}

/// Derives a short title from `text`.
///
/// Every run of spaces, tabs and line breaks becomes a single space. The
/// title stops right after the fourth such run, so its trailing space is
/// kept. Text with fewer runs is returned whole (normalized).
#[must_use]
pub fn title_from_text(text: &str) -> String {
    let mut title = String::with_capacity(text.len().min(128));
    let mut runs = 0;
    let mut in_run = false;

    for ch in text.chars() {
        if is_break(ch) {
            if in_run {
                continue;
            }
            in_run = true;
            runs += 1;
            title.push(' ');
            if runs == TITLE_WHITESPACE_RUNS {
                break;
            }
        } else {
            in_run = false;
            title.push(ch);
        }
    }
    title
}

/// Derives a one-sentence preview from `text`.
///
/// Scans up to the first newline, tab or carriage return (excluded) or the
/// first period followed by a space (period included). Without such a
/// boundary the whole text is returned.
#[must_use]
pub fn headline_from_text(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\n' | '\t' | '\r' => return &text[..index],
            '.' if matches!(chars.peek(), Some((_, ' '))) => return &text[..=index],
            _ => {}
        }
    }
    text
}

/// Splits a query into lowercase word tokens.
///
/// Word characters are Unicode letters, digits and `_`, so `café` and
/// `naïve` stay whole; everything else separates tokens. Empty tokens are
/// dropped.
#[must_use]
pub fn query_tokens(query: &str) -> Vec<String> {
    NON_WORD_RE
        .split(&query.to_lowercase())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns true if any token of `query` occurs in `text`, ignoring case.
///
/// A query without word characters matches nothing.
#[must_use]
pub fn matches_query(text: &str, query: &str) -> bool {
    let haystack = text.to_lowercase();
    query_tokens(query)
        .iter()
        .any(|token| haystack.contains(token.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn headline_stops_at_line_break() {
        assert_eq!(headline_from_text("Hello\nWorld"), "Hello");
        assert_eq!(headline_from_text("Tab\there"), "Tab");
        assert_eq!(headline_from_text("\nleading"), "");
    }

    #[test]
    fn headline_keeps_sentence_period() {
        assert_eq!(headline_from_text("Hello. World"), "Hello.");
        assert_eq!(headline_from_text("v1.2 is out. Yes"), "v1.2 is out.");
        assert_eq!(headline_from_text("Ends with a period."), "Ends with a period.");
    }

    #[test]
    fn headline_without_boundary_is_whole_text() {
        assert_eq!(headline_from_text("NoBoundaryHere"), "NoBoundaryHere");
        assert_eq!(headline_from_text(""), "");
    }

    #[test]
    fn title_cuts_after_fourth_run() {
        assert_eq!(title_from_text("one two three four five six"), "one two three four ");
        assert_eq!(title_from_text("a  b\n\nc\t d   e f"), "a b c d ");
    }

    #[test]
    fn title_with_few_runs_is_whole_text() {
        assert_eq!(title_from_text("a b c"), "a b c");
        assert_eq!(title_from_text("a\n\n b"), "a b");
        assert_eq!(title_from_text("single"), "single");
    }

    #[test]
    fn search_matches_any_token() {
        assert!(matches_query("my todo list", "urgent TODO"));
        assert!(!matches_query("groceries", "urgent TODO"));
        assert!(matches_query("Café au lait", "CAFÉ"));
    }

    #[test]
    fn accented_words_are_single_tokens() {
        assert_eq!(query_tokens("Café, naïve-Über"), ["café", "naïve", "über"]);
        assert!(!matches_query("a cafe b", "café"));
    }

    #[test]
    fn search_ignores_empty_tokens() {
        assert_eq!(query_tokens("  --hello,, world!"), ["hello", "world"]);
        assert!(!matches_query("anything", "!!!"));
        assert!(!matches_query("anything", ""));
    }

    proptest! {
        #[test]
        fn headline_is_prefix_without_breaks(text in "[a-z .\n\t]{0,40}") {
            let headline = headline_from_text(&text);
            prop_assert!(text.starts_with(headline));
            prop_assert!(!headline.contains(['\n', '\t', '\r']));
        }

        #[test]
        fn title_has_at_most_four_single_spaces(text in "[a-z \n\t]{0,60}") {
            let title = title_from_text(&text);
            prop_assert!(title.matches(' ').count() <= TITLE_WHITESPACE_RUNS);
            prop_assert!(!title.contains("  "));
            prop_assert!(!title.contains(['\n', '\t', '\r']));
        }

        #[test]
        fn words_of_text_always_match(words in proptest::collection::vec("[a-z]{1,8}", 1..6), pick in 0usize..6) {
            let text = words.join(" ");
            let word = &words[pick % words.len()];
            prop_assert!(matches_query(&text, &word.to_uppercase()));
        }
    }
}
