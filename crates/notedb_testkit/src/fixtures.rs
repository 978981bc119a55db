//! Test fixtures and database helpers.

use crate::faulty::{FaultyBackend, FaultyBlobStore};
use crate::trace::init_tracing;
use notedb_core::{Config, Database, ItemDraft, ItemId, NoteDraft};
use std::sync::Arc;

/// A test database over failure-injecting in-memory stores.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The record backend, for failure injection and inspection.
    pub backend: Arc<FaultyBackend>,
    /// The blob store, for failure injection and inspection.
    pub blobs: Arc<FaultyBlobStore>,
}

impl TestDatabase {
    /// Creates a test database with the default config.
    pub fn memory() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a test database with `config`.
    pub fn with_config(config: Config) -> Self {
        init_tracing();
        let backend = Arc::new(FaultyBackend::new());
        let blobs = Arc::new(FaultyBlobStore::new());
        let db = Database::open_with_backends(config, backend.clone(), blobs.clone())
            .expect("Failed to open test database");
        Self { db, backend, blobs }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a fresh test database.
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&TestDatabase) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A tag linked to some notes.
    #[derive(Debug, Clone)]
    pub struct TaggedNotes {
        /// The tag.
        pub tag: ItemId,
        /// The notes carrying it.
        pub notes: Vec<ItemId>,
    }

    /// Adds a tag titled `title` and `note_count` notes linked to it.
    pub fn tagged_notes(db: &Database, title: &str, note_count: usize) -> TaggedNotes {
        let tag = db
            .tags()
            .add(ItemDraft::titled(title))
            .expect("Failed to add tag");
        let notes = (0..note_count)
            .map(|i| {
                let note = db
                    .notes()
                    .add(NoteDraft::new().with_title(format!("{title} note {i}")))
                    .expect("Failed to add note");
                db.tags().link_note(&tag, &note).expect("Failed to link note");
                note
            })
            .collect();
        TaggedNotes { tag, notes }
    }
}
