//! Change event publication and ordering.

use notedb_core::{ChangeType, ItemDraft, NoteDraft};
use notedb_testkit::prelude::*;

#[test]
fn events_arrive_in_commit_order() {
    let db = TestDatabase::memory();
    let rx = db.subscribe();

    let tag = db.tags().add(ItemDraft::titled("work")).unwrap();
    let note = db.notes().add(NoteDraft::new().with_title("plan")).unwrap();
    db.tags().link_note(&tag, &note).unwrap();

    let events: Vec<_> = rx.try_iter().collect();
    let sequences: Vec<_> = events.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(events[0].ids_for("tags", ChangeType::Insert), vec![&tag]);
    assert_eq!(events[1].ids_for("notes", ChangeType::Insert), vec![&note]);
    assert!(events[2].touches("relations"));
    assert_eq!(db.committed_seq().as_u64(), 3);
}

#[test]
fn insert_then_update_in_one_transaction_reports_insert() {
    let db = TestDatabase::memory();
    let rx = db.subscribe();

    let id = db
        .transaction(|txn| {
            let id = db.notes().add_in_txn(txn, NoteDraft::new().with_title("draft"))?;
            db.notes()
                .add_in_txn(txn, NoteDraft::new().with_id(id.clone()).pinned(true))?;
            Ok(id)
        })
        .unwrap();

    let event = rx.try_recv().unwrap();
    assert_eq!(event.ids_for("notes", ChangeType::Insert), vec![&id]);
    assert!(event.ids_for("notes", ChangeType::Update).is_empty());
    assert!(db.notes().note(&id).unwrap().unwrap().pinned);
}

#[test]
fn late_subscribers_catch_up_by_polling() {
    let db = TestDatabase::memory();
    for title in ["a", "b", "c", "d"] {
        db.tags().add(ItemDraft::titled(title)).unwrap();
    }

    let first = db.poll_changes(0, 2);
    assert_eq!(first.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![1, 2]);
    let rest = db.poll_changes(first[1].sequence, 10);
    assert_eq!(rest.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![3, 4]);
    assert!(db.poll_changes(4, 10).is_empty());
}

#[test]
fn events_serialize_with_camel_case_fields() {
    let db = TestDatabase::memory();
    let rx = db.subscribe();
    db.tags().add(ItemDraft::titled("work")).unwrap();

    let event = rx.try_recv().unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["changes"][0]["collection"], "tags");
    assert_eq!(json["changes"][0]["changeType"], "insert");
}
