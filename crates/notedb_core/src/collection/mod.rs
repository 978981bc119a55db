//! Generic soft-delete collections.
//!
//! A [`Collection`] is bound to the table of one item kind and owns the
//! policy the backend knows nothing about:
//! - deletion sets the `deleted` flag instead of removing the record
//! - default views only see live records
//! - titled items are deduplicated by title on [`Collection::add`]
//!
//! Every write has an `*_in_txn` variant so several steps can be committed
//! as one unit through [`crate::TransactionManager::run`]. Reads made with
//! a transaction see its pending writes first.

mod titled;
mod view;

pub use titled::{sanitize_title, ItemDraft};
pub use view::{FilteredView, ViewIter};

use crate::change_feed::ChangeType;
use crate::entity::{decode, encode, Item, ItemKind};
use crate::error::CoreResult;
use crate::id::ItemId;
use crate::transaction::{Transaction, TransactionManager};
use notedb_storage::{field, Predicate, StorageBackend};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A collection of items of type `T`.
///
/// # Example
///
/// ```rust
/// use notedb_core::{Database, Item, ItemDraft};
///
/// let db = Database::open_in_memory().unwrap();
/// let tags = db.tags().collection();
///
/// let id = tags.add(ItemDraft::titled("work")).unwrap();
/// assert_eq!(tags.add(ItemDraft::titled("work")).unwrap(), id);
///
/// tags.soft_delete(&[id.clone()]).unwrap();
/// assert!(tags.get(&id).unwrap().unwrap().is_deleted());
/// assert_eq!(tags.all().count().unwrap(), 0);
/// ```
pub struct Collection<T: Item> {
    backend: Arc<dyn StorageBackend>,
    txns: Arc<TransactionManager>,
    batch_size: Option<usize>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Item> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            txns: Arc::clone(&self.txns),
            batch_size: self.batch_size,
            _marker: PhantomData,
        }
    }
}

impl<T: Item> Collection<T> {
    /// Creates a collection over the manager's backend.
    pub fn new(txns: Arc<TransactionManager>, batch_size: Option<usize>) -> Self {
        Self {
            backend: Arc::clone(txns.backend()),
            txns,
            batch_size,
            _marker: PhantomData,
        }
    }

    /// Returns the item kind.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        T::KIND
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &'static str {
        T::KIND.table()
    }

    /// Gets an item by id, including tombstoned items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record cannot be
    /// decoded. A missing id is `Ok(None)`.
    pub fn get(&self, id: &ItemId) -> CoreResult<Option<T>> {
        self.backend
            .get_by_id(self.table(), id.as_str())?
            .map(decode::<T>)
            .transpose()
    }

    /// Gets an item within a transaction, seeing its pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn get_in_txn(&self, txn: &Transaction, id: &ItemId) -> CoreResult<Option<T>> {
        if let Some(pending) = txn.get_pending(self.table(), id.as_str()) {
            return decode::<T>(pending.clone()).map(Some);
        }
        self.get(id)
    }

    /// Gets a live item within a transaction; tombstoned items are `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn get_live_in_txn(&self, txn: &Transaction, id: &ItemId) -> CoreResult<Option<T>> {
        Ok(self.get_in_txn(txn, id)?.filter(|item| !item.is_deleted()))
    }

    /// Checks whether an item exists, live or tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn exists(&self, id: &ItemId) -> CoreResult<bool> {
        Ok(self.backend.exists_by_id(self.table(), id.as_str())?)
    }

    /// Checks existence within a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn exists_in_txn(&self, txn: &Transaction, id: &ItemId) -> CoreResult<bool> {
        if txn.get_pending(self.table(), id.as_str()).is_some() {
            return Ok(true);
        }
        self.exists(id)
    }

    /// Writes `item` as-is in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be encoded or the commit fails.
    pub fn upsert(&self, item: &T) -> CoreResult<()> {
        self.txns.run(|txn| self.upsert_in_txn(txn, item))
    }

    /// Writes `item` as-is within a transaction.
    ///
    /// The change is an insert if no record with the id existed before.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be encoded or the transaction is
    /// not active.
    pub fn upsert_in_txn(&self, txn: &mut Transaction, item: &T) -> CoreResult<()> {
        let change_type = if self.exists_in_txn(txn, item.id())? {
            ChangeType::Update
        } else {
            ChangeType::Insert
        };
        self.write_in_txn(txn, item, change_type)
    }

    pub(crate) fn write_in_txn(
        &self,
        txn: &mut Transaction,
        item: &T,
        change_type: ChangeType,
    ) -> CoreResult<()> {
        txn.put(self.table(), encode(item)?, change_type)?;
        debug!(table = self.table(), id = %item.id(), ?change_type, "buffered write");
        Ok(())
    }

    /// Tombstones `ids` in one transaction.
    ///
    /// Returns how many items were tombstoned. Unknown and already
    /// tombstoned ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing is deleted then.
    pub fn soft_delete(&self, ids: &[ItemId]) -> CoreResult<usize> {
        self.txns.run(|txn| self.soft_delete_in_txn(txn, ids))
    }

    /// Tombstones `ids` within a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn soft_delete_in_txn(&self, txn: &mut Transaction, ids: &[ItemId]) -> CoreResult<usize> {
        let mut deleted = 0;
        for id in ids {
            let Some(mut item) = self.get_live_in_txn(txn, id)? else {
                continue;
            };
            item.meta_mut().tombstone();
            self.write_in_txn(txn, &item, ChangeType::Delete)?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Returns a lazy view over all live items.
    #[must_use]
    pub fn all(&self) -> FilteredView<T> {
        FilteredView::new(
            Arc::clone(&self.backend),
            field("deleted").is_false(),
            self.batch_size,
        )
    }

    /// Returns the first live item matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn find(&self, predicate: Predicate) -> CoreResult<Option<T>> {
        self.all().filter(predicate).find()
    }

    /// Returns the first live item matching `predicate`, seeing the
    /// transaction's pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn find_in_txn(&self, txn: &Transaction, predicate: Predicate) -> CoreResult<Option<T>> {
        let live = field("deleted").is_false().and(predicate);
        Ok(self.select_in_txn(txn, &live)?.into_iter().next())
    }

    /// Returns every item matching `predicate`, tombstoned or not, with the
    /// transaction's pending writes taking precedence over committed
    /// records.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn select_in_txn(&self, txn: &Transaction, predicate: &Predicate) -> CoreResult<Vec<T>> {
        let table = self.table();
        let mut shadowed = HashSet::new();
        let mut pending = Vec::new();
        for record in txn.pending_in(table) {
            shadowed.insert(record.id().to_string());
            if predicate.matches(record) {
                pending.push(decode::<T>(record.clone())?);
            }
        }

        let mut items = Vec::new();
        for record in self.backend.query_all(table, predicate.clone(), self.batch_size) {
            let record = record?;
            if !shadowed.contains(record.id()) {
                items.push(decode::<T>(record)?);
            }
        }
        items.extend(pending);
        Ok(items)
    }

    /// Returns the transaction manager this collection commits through.
    #[must_use]
    pub fn transactions(&self) -> &Arc<TransactionManager> {
        &self.txns
    }
}

impl<T: Item> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("table", &self.table())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::ChangeFeed;
    use crate::entity::{ItemMeta, Tag, TitledItem};
    use notedb_storage::InMemoryBackend;

    fn tags(batch_size: Option<usize>) -> Collection<Tag> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.init("tags").unwrap();
        let txns = Arc::new(TransactionManager::new(backend, Arc::new(ChangeFeed::new())));
        Collection::new(txns, batch_size)
    }

    fn tag(id: &str, title: &str) -> Tag {
        Tag::create(ItemMeta::new(ItemId::from(id)), title.into())
    }

    #[test]
    fn upsert_then_get() {
        let tags = tags(None);
        tags.upsert(&tag("t1", "work")).unwrap();

        assert_eq!(tags.get(&"t1".into()).unwrap().unwrap().title, "work");
        assert!(tags.exists(&"t1".into()).unwrap());
        assert!(tags.get(&"nope".into()).unwrap().is_none());
        assert!(!tags.exists(&"nope".into()).unwrap());
    }

    #[test]
    fn upsert_reports_insert_then_update() {
        let tags = tags(None);
        let rx = tags.transactions().feed().subscribe();

        tags.upsert(&tag("t1", "a")).unwrap();
        tags.upsert(&tag("t1", "b")).unwrap();

        let first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(first.ids_for("tags", ChangeType::Insert).len(), 1);
        assert_eq!(second.ids_for("tags", ChangeType::Update).len(), 1);
    }

    #[test]
    fn soft_delete_keeps_record() {
        let tags = tags(None);
        tags.upsert(&tag("t1", "a")).unwrap();
        tags.upsert(&tag("t2", "b")).unwrap();

        let n = tags
            .soft_delete(&["t1".into(), "t1".into(), "missing".into()])
            .unwrap();
        assert_eq!(n, 1);

        let stored = tags.get(&"t1".into()).unwrap().unwrap();
        assert!(stored.is_deleted());
        assert!(stored.meta.date_modified >= stored.meta.date_created);
        assert!(tags.exists(&"t1".into()).unwrap());
        assert_eq!(tags.all().ids().unwrap(), vec![ItemId::from("t2")]);
    }

    #[test]
    fn deleting_nothing_emits_nothing() {
        let tags = tags(None);
        let rx = tags.transactions().feed().subscribe();

        assert_eq!(tags.soft_delete(&["missing".into()]).unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn all_is_restartable_and_batched() {
        let tags = tags(Some(2));
        for i in 0..5 {
            tags.upsert(&tag(&format!("t{i}"), "x")).unwrap();
        }
        let view = tags.all();
        assert_eq!(view.count().unwrap(), 5);
        assert_eq!(view.count().unwrap(), 5);
        assert_eq!(view.to_vec().unwrap().len(), 5);
    }

    #[test]
    fn find_returns_first_live_match() {
        let tags = tags(None);
        tags.upsert(&tag("t1", "work")).unwrap();
        tags.soft_delete(&["t1".into()]).unwrap();
        tags.upsert(&tag("t2", "work")).unwrap();

        let found = tags.find(field("title").eq("work")).unwrap().unwrap();
        assert_eq!(found.id().as_str(), "t2");
        assert!(tags.find(field("title").eq("home")).unwrap().is_none());
    }

    #[test]
    fn reads_in_txn_see_pending_writes() {
        let tags = tags(None);
        tags.upsert(&tag("t1", "old")).unwrap();

        tags.transactions()
            .run(|txn| {
                tags.upsert_in_txn(txn, &tag("t2", "new"))?;
                tags.soft_delete_in_txn(txn, &["t1".into()])?;

                assert!(tags.exists_in_txn(txn, &"t2".into())?);
                assert!(tags.get_live_in_txn(txn, &"t1".into())?.is_none());
                assert!(tags.find_in_txn(txn, field("title").eq("new"))?.is_some());
                assert!(tags.find_in_txn(txn, field("title").eq("old"))?.is_none());
                // Committed state is untouched until commit.
                assert!(!tags.exists(&"t2".into())?);
                Ok(())
            })
            .unwrap();

        assert!(tags.exists(&"t2".into()).unwrap());
    }

    #[test]
    fn select_in_txn_includes_tombstones() {
        let tags = tags(None);
        tags.upsert(&tag("t1", "work")).unwrap();
        tags.soft_delete(&["t1".into()]).unwrap();

        let wtxn = tags.transactions().begin_write().unwrap();
        let found = tags.select_in_txn(&wtxn, &field("title").eq("work")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_deleted());
    }
}
