//! Property tests over titles, headlines and search.

use notedb_content::text::{headline_from_text, title_from_text, TITLE_WHITESPACE_RUNS};
use notedb_content::ContentModel;
use notedb_core::{sanitize_title, ItemDraft, NoteDraft};
use notedb_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sanitized_titles_dedupe((padded, core) in padded_title_strategy()) {
        let db = TestDatabase::memory();
        let a = db.tags().add(ItemDraft::titled(core.clone())).unwrap();
        let b = db.tags().add(ItemDraft::titled(padded)).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(db.tags().all().count().unwrap(), 1);
    }

    #[test]
    fn sanitize_is_idempotent(text in spaced_text_strategy()) {
        let once = sanitize_title(&text);
        prop_assert_eq!(sanitize_title(&once), once);
    }

    #[test]
    fn titles_stop_after_whitespace_runs(text in spaced_text_strategy()) {
        let title = title_from_text(&text);
        prop_assert!(title.matches(' ').count() <= TITLE_WHITESPACE_RUNS);
        prop_assert!(!title.contains("  "));
        prop_assert!(!title.contains(['\n', '\t', '\r']));
    }

    #[test]
    fn headline_is_a_prefix(text in spaced_text_strategy()) {
        let headline = headline_from_text(&text);
        prop_assert!(text.starts_with(headline));
        prop_assert!(!headline.contains(['\n', '\t', '\r']));
    }

    #[test]
    fn notes_are_found_by_any_body_word(markup in note_markup_strategy(), pick in any::<prop::sample::Index>()) {
        let model = ContentModel::new();
        let text = model.body(&markup).to_plain_text().to_string();
        let words: Vec<&str> = text.split_whitespace().collect();
        let word = words[pick.index(words.len())].to_uppercase();

        let db = TestDatabase::memory();
        let id = db.notes().add(NoteDraft::new().with_content(markup)).unwrap();
        let found: Vec<_> = db.notes().search(&word).unwrap().into_iter().map(|n| n.meta.id).collect();
        prop_assert_eq!(found, vec![id]);
    }

    #[test]
    fn inline_images_are_stored_once((image, bytes) in inline_image_strategy()) {
        let db = TestDatabase::memory();
        db.notes().add(NoteDraft::new().with_title("a").with_content(image.clone())).unwrap();
        db.notes().add(NoteDraft::new().with_title("b").with_content(image)).unwrap();
        prop_assert_eq!(db.blobs.len(), 1);
        let hash = notedb_storage::content_hash(&bytes);
        let notes = db.notes().all().to_vec().unwrap();
        prop_assert!(notes.iter().all(|n| n.attachments[0].hash == hash));
    }
}

#[test]
fn search_matches_any_query_word() {
    let db = TestDatabase::memory();
    let hit = db
        .notes()
        .add(NoteDraft::new().with_content(paragraphs(&["my todo list"])))
        .unwrap();
    db.notes()
        .add(NoteDraft::new().with_content(paragraphs(&["groceries"])))
        .unwrap();

    let found: Vec<_> = db
        .notes()
        .search("urgent TODO")
        .unwrap()
        .into_iter()
        .map(|n| n.meta.id)
        .collect();
    assert_eq!(found, vec![hit]);
    assert!(db.notes().search("  ").unwrap().is_empty());
}
