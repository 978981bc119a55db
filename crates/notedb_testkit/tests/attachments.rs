//! Attachment extraction and re-insertion through notes.

use notedb_content::DEFAULT_IMAGE_MIME;
use notedb_core::NoteDraft;
use notedb_storage::{content_hash, BlobEncoding, BlobStore};
use notedb_testkit::prelude::*;

#[test]
fn note_body_round_trips_through_blob_store() {
    let db = TestDatabase::memory();
    let markup = sample_note();

    let id = db.notes().add(NoteDraft::new().with_content(markup.clone())).unwrap();
    let note = db.notes().note(&id).unwrap().unwrap();

    assert!(!note.content.data.contains("base64"));
    assert_eq!(note.attachments.len(), 1);
    assert_eq!(note.attachments[0].mime.as_deref(), Some("image/png"));
    assert_eq!(db.blobs.len(), 1);
    assert_eq!(note.title, "Trip planBook the train.");
    assert_eq!(note.headline, "Trip planBook the train.");

    let restored = db.notes().content(&id).unwrap().unwrap();
    assert!(restored.contains(&format!("data:image/png;base64,{PNG_BASE64}")));
}

#[test]
fn saving_extracted_markup_stores_nothing_new() {
    let db = TestDatabase::memory();
    let id = db.notes().add(NoteDraft::new().with_content(sample_note())).unwrap();
    let stored = db.notes().note(&id).unwrap().unwrap();
    let rx = db.subscribe();

    db.notes()
        .add(NoteDraft::new().with_id(id.clone()).with_content(stored.content.data.clone()))
        .unwrap();

    assert_eq!(db.blobs.len(), 1);
    let again = db.notes().note(&id).unwrap().unwrap();
    assert_eq!(again.attachments, stored.attachments);
    assert!(rx.try_recv().is_err(), "unchanged note must not be rewritten");
}

#[test]
fn identical_images_share_one_blob() {
    let db = TestDatabase::memory();
    let image = inline_image("image/jpeg", JPEG_BASE64);

    let first = db
        .notes()
        .add(NoteDraft::new().with_title("one").with_content(image.clone()))
        .unwrap();
    let second = db
        .notes()
        .add(NoteDraft::new().with_title("two").with_content(format!("<p>copy</p>{image}")))
        .unwrap();

    assert_eq!(db.blobs.len(), 1);
    let a = db.notes().note(&first).unwrap().unwrap();
    let b = db.notes().note(&second).unwrap().unwrap();
    assert_eq!(a.attachments[0].hash, b.attachments[0].hash);
}

#[test]
fn image_only_note_gets_fallback_title() {
    let db = TestDatabase::memory();
    let id = db
        .notes()
        .add(NoteDraft::new().with_content(inline_image("image/png", PNG_BASE64)))
        .unwrap();

    let note = db.notes().note(&id).unwrap().unwrap();
    assert!(note.title.starts_with("Note "), "got {:?}", note.title);
}

#[test]
fn unknown_hash_keeps_its_placeholder() {
    let db = TestDatabase::memory();
    let hash = content_hash(b"never stored");
    let id = db
        .notes()
        .add(
            NoteDraft::new()
                .with_title("dangling")
                .with_content(format!("<p>see</p>{}", hashed_image(&hash))),
        )
        .unwrap();

    let restored = db.notes().content(&id).unwrap().unwrap();
    assert!(restored.contains(&hash));
    assert!(!restored.contains("base64"));
}

#[test]
fn attachment_without_mime_restores_as_default_image() {
    let db = TestDatabase::memory();
    let meta = db.blobs.store(b"raw", BlobEncoding::Raw).unwrap();
    let id = db
        .notes()
        .add(
            NoteDraft::new()
                .with_title("raw")
                .with_content(hashed_image(&meta.hash)),
        )
        .unwrap();

    let restored = db.notes().content(&id).unwrap().unwrap();
    assert!(restored.contains(&format!("data:{DEFAULT_IMAGE_MIME};base64,")));
}

#[test]
fn character_references_survive_saving() {
    let db = TestDatabase::memory();
    let markup = "<p>Caf&eacute; cr&egrave;me br&ucirc;l&eacute;e &amp; th&eacute; caf&eacute x</p>";

    let id = db.notes().add(NoteDraft::new().with_content(markup)).unwrap();
    let note = db.notes().note(&id).unwrap().unwrap();

    assert_eq!(note.content.data, markup);
    assert_eq!(note.title, "Café crème brûlée &");
    assert_eq!(db.notes().content(&id).unwrap().unwrap(), markup);

    let found = db.notes().search("café").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].meta.id, id);
    assert!(db.notes().search("eacute").unwrap().is_empty());
}

#[test]
fn editor_markup_without_inline_images_is_stored_verbatim() {
    let db = TestDatabase::memory();
    let markup = concat!(
        "<h2>R&eacute;sum&eacute; &ndash; draft</h2>\n",
        "<p>Fish &amp; chips &lt;3 &hellip;&nbsp;caf&eacute</p>\n",
        "<ul>\n<li>first<br>second line</li>\n<li><a href=\"/s?q=a&amp;page=2\" target=\"_blank\">next</a></li>\n</ul>\n",
        "<p><img src=\"https://example.com/a.png\" alt=\"A &amp; B\"></p>",
    );

    let extraction = db.content().body(markup).extract_attachments(&*db.blobs).unwrap();
    assert_eq!(extraction.data, markup);
    assert!(extraction.attachments.is_empty());
    assert_eq!(db.blobs.len(), 0);

    let id = db.notes().add(NoteDraft::new().with_content(markup)).unwrap();
    let note = db.notes().note(&id).unwrap().unwrap();
    assert_eq!(note.content.data, markup);
    assert!(note.title.starts_with("Résumé – draft"));
    assert_eq!(db.notes().search("RÉSUMÉ").unwrap().len(), 1);
}
