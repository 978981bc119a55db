//! Titled items that group notes through relations.

use crate::collection::{sanitize_title, Collection, FilteredView, ItemDraft};
use crate::entity::{Item, ItemKind, ItemReference, Note, TitledItem};
use crate::error::{CoreError, CoreResult};
use crate::id::ItemId;
use crate::relations::Relations;
use crate::transaction::Transaction;
use notedb_storage::field;

/// A titled collection whose items link to notes.
///
/// Links go from the grouping item to the note, with the item's kind
/// (`"tag"`, `"notebook"`) as relation type. Removing items unlinks them
/// from every note in the same transaction.
pub struct Grouping<T: TitledItem> {
    collection: Collection<T>,
    notes: Collection<Note>,
    relations: Relations,
}

impl<T: TitledItem> Clone for Grouping<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            notes: self.notes.clone(),
            relations: self.relations.clone(),
        }
    }
}

impl<T: TitledItem> Grouping<T> {
    /// Creates a grouping.
    pub fn new(collection: Collection<T>, notes: Collection<Note>, relations: Relations) -> Self {
        Self {
            collection,
            notes,
            relations,
        }
    }

    /// Returns the relation type used for note links.
    #[must_use]
    pub fn relation_type(&self) -> &'static str {
        T::KIND.as_str()
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    /// Gets an item by id, including tombstoned items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn get(&self, id: &ItemId) -> CoreResult<Option<T>> {
        self.collection.get(id)
    }

    /// Finds the live item with `title` after sanitization.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn find(&self, title: &str) -> CoreResult<Option<T>> {
        self.collection
            .find(field("title").eq(sanitize_title(title)))
    }

    /// Adds an item, reusing a live item with the same title.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without a title, or a backend error.
    pub fn add_with<F>(&self, draft: ItemDraft, customize: F) -> CoreResult<ItemId>
    where
        F: FnOnce(&mut T),
    {
        self.collection.add_with(draft, customize)
    }

    /// Returns a lazy view of live items.
    #[must_use]
    pub fn all(&self) -> FilteredView<T> {
        self.collection.all()
    }

    /// Checks whether an item exists, live or tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn exists(&self, id: &ItemId) -> CoreResult<bool> {
        self.collection.exists(id)
    }

    /// Unlinks `ids` from all notes and tombstones them in one transaction.
    ///
    /// Returns how many items were tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing changes then.
    pub fn remove(&self, ids: &[ItemId]) -> CoreResult<usize> {
        self.collection
            .transactions()
            .run(|txn| self.remove_in_txn(txn, ids))
    }

    /// Unlinks and tombstones `ids` within a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn remove_in_txn(&self, txn: &mut Transaction, ids: &[ItemId]) -> CoreResult<usize> {
        self.relations
            .unlink_of_type_in_txn(txn, self.relation_type(), ids)?;
        self.collection.soft_delete_in_txn(txn, ids)
    }

    /// Links the item `id` to the note `note_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either side is missing or tombstoned.
    pub fn link_note(&self, id: &ItemId, note_id: &ItemId) -> CoreResult<ItemId> {
        self.collection.transactions().run(|txn| {
            let item = self
                .collection
                .get_live_in_txn(txn, id)?
                .ok_or_else(|| CoreError::not_found(T::KIND.table(), id.as_str()))?;
            let note = self
                .notes
                .get_live_in_txn(txn, note_id)?
                .ok_or_else(|| CoreError::not_found(ItemKind::Note.table(), note_id.as_str()))?;
            self.relations
                .link_in_txn(txn, &item.reference(), &note.reference(), self.relation_type())
        })
    }

    /// Removes the link between the item `id` and the note `note_id`.
    ///
    /// Returns false if they were not linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn unlink_note(&self, id: &ItemId, note_id: &ItemId) -> CoreResult<bool> {
        let from = ItemReference::new(id.clone(), T::KIND);
        let to = ItemReference::new(note_id.clone(), ItemKind::Note);
        self.relations.unlink(&from, &to, self.relation_type())
    }

    /// Returns the live notes linked to the item `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn notes_of(&self, id: &ItemId) -> CoreResult<Vec<Note>> {
        let from = ItemReference::new(id.clone(), T::KIND);
        let mut notes = Vec::new();
        for relation in self.relations.from(&from, ItemKind::Note).iter() {
            if let Some(note) = self.notes.get(&relation?.to_id)? {
                if !note.is_deleted() {
                    notes.push(note);
                }
            }
        }
        Ok(notes)
    }

    /// Returns the live items linked to the note `note_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn of_note(&self, note_id: &ItemId) -> CoreResult<Vec<T>> {
        let to = ItemReference::new(note_id.clone(), ItemKind::Note);
        let mut items = Vec::new();
        for relation in self.relations.to(&to, T::KIND).iter() {
            if let Some(item) = self.collection.get(&relation?.from_id)? {
                if !item.is_deleted() {
                    items.push(item);
                }
            }
        }
        Ok(items)
    }
}

impl<T: TitledItem> std::fmt::Debug for Grouping<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grouping")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
