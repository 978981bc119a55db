//! Database facade.

use crate::change_feed::{ChangeEvent, ChangeFeed};
use crate::collection::Collection;
use crate::config::Config;
use crate::entity::{decode_entity, Entity, ItemKind, ItemReference};
use crate::error::CoreResult;
use crate::items::{Grouping, Notebooks, Notes, Tags};
use crate::relations::Relations;
use crate::transaction::{Transaction, TransactionManager};
use crate::types::SequenceNumber;
use notedb_content::ContentModel;
use notedb_storage::{BlobStore, InMemoryBackend, InMemoryBlobStore, StorageBackend};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::info;

/// The main database handle.
///
/// Wires a record backend and a blob store to the change feed, the
/// transaction manager, the content model and the domain collections.
/// Cloning is cheap; clones share everything.
///
/// # Example
///
/// ```rust
/// use notedb_core::{Database, ItemDraft, NoteDraft};
///
/// let db = Database::open_in_memory().unwrap();
///
/// let (tag, note) = db
///     .transaction(|txn| {
///         let tag = db.tags().collection().add_with_in_txn(txn, ItemDraft::titled("ideas"), |_| {})?;
///         let note = db.notes().add_in_txn(txn, NoteDraft::new().with_title("Garden"))?;
///         Ok((tag, note))
///     })
///     .unwrap();
///
/// db.tags().link_note(&tag, &note).unwrap();
/// assert_eq!(db.tags().notes_of(&tag).unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct Database {
    config: Config,
    backend: Arc<dyn StorageBackend>,
    blobs: Arc<dyn BlobStore>,
    txns: Arc<TransactionManager>,
    content: Arc<ContentModel>,
    relations: Relations,
    tags: Tags,
    notebooks: Notebooks,
    notes: Notes,
}

impl Database {
    /// Opens a database over in-memory stores with the default config.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be initialized.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_in_memory_with(Config::default())
    }

    /// Opens a database over in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be initialized.
    pub fn open_in_memory_with(config: Config) -> CoreResult<Self> {
        Self::open_with_backends(
            config,
            Arc::new(InMemoryBackend::new()),
            Arc::new(InMemoryBlobStore::new()),
        )
    }

    /// Opens a database over the given stores.
    ///
    /// Initializes one table per item kind.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be initialized.
    pub fn open_with_backends(
        config: Config,
        backend: Arc<dyn StorageBackend>,
        blobs: Arc<dyn BlobStore>,
    ) -> CoreResult<Self> {
        for kind in ItemKind::ALL {
            backend.init(kind.table())?;
        }

        let feed = Arc::new(ChangeFeed::with_max_history(config.change_history));
        let txns = Arc::new(TransactionManager::new(Arc::clone(&backend), feed));
        let content = Arc::new(if config.markup {
            ContentModel::new()
        } else {
            ContentModel::without_markup()
        });

        let batch_size = config.batch_size;
        let relations = Relations::new(Collection::new(Arc::clone(&txns), batch_size));
        let notes_collection = Collection::new(Arc::clone(&txns), batch_size);
        let tags = Tags::new(Grouping::new(
            Collection::new(Arc::clone(&txns), batch_size),
            notes_collection.clone(),
            relations.clone(),
        ));
        let notebooks = Notebooks::new(Grouping::new(
            Collection::new(Arc::clone(&txns), batch_size),
            notes_collection.clone(),
            relations.clone(),
        ));
        let notes = Notes::new(
            notes_collection,
            relations.clone(),
            Arc::clone(&content),
            Arc::clone(&blobs),
        );

        info!(
            batch_size = ?config.batch_size,
            markup = config.markup,
            change_history = config.change_history,
            "database opened"
        );

        Ok(Self {
            config,
            backend,
            blobs,
            txns,
            content,
            relations,
            tags,
            notebooks,
            notes,
        })
    }

    /// Runs `f` in one write transaction.
    ///
    /// Use the `*_in_txn` methods of the collections inside `f`. On `Ok`
    /// all writes are committed together and one change event is published;
    /// on `Err` nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the error of `f` or of the commit.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction) -> CoreResult<T>,
    {
        self.txns.run(f)
    }

    /// Subscribes to committed changes.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.txns.feed().subscribe()
    }

    /// Returns retained events with `sequence > cursor`, up to `limit`.
    pub fn poll_changes(&self, cursor: u64, limit: usize) -> Vec<ChangeEvent> {
        self.txns.feed().poll(cursor, limit)
    }

    /// Returns the sequence number of the last commit.
    #[must_use]
    pub fn committed_seq(&self) -> SequenceNumber {
        self.txns.committed_seq()
    }

    /// Resolves a weak reference, including tombstoned items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record cannot be
    /// decoded.
    pub fn item(&self, reference: &ItemReference) -> CoreResult<Option<Entity>> {
        self.backend
            .get_by_id(reference.kind.table(), reference.id.as_str())?
            .map(decode_entity)
            .transpose()
    }

    /// Returns the tag collection.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns the notebook collection.
    #[must_use]
    pub fn notebooks(&self) -> &Notebooks {
        &self.notebooks
    }

    /// Returns the note collection.
    #[must_use]
    pub fn notes(&self) -> &Notes {
        &self.notes
    }

    /// Returns the relation graph.
    #[must_use]
    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    /// Returns the content model.
    #[must_use]
    pub fn content(&self) -> &ContentModel {
        &self.content
    }

    /// Returns the blob store holding attachment bytes.
    #[must_use]
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Returns the change feed.
    #[must_use]
    pub fn change_feed(&self) -> &Arc<ChangeFeed> {
        self.txns.feed()
    }

    /// Returns the configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("txns", &self.txns)
            .finish_non_exhaustive()
    }
}
