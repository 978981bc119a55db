//! The tag collection.

use super::Grouping;
use crate::collection::{sanitize_title, Collection, FilteredView, ItemDraft};
use crate::entity::{Note, Tag};
use crate::error::CoreResult;
use crate::id::ItemId;

/// Tags, unique by title among live tags.
///
/// # Example
///
/// ```rust
/// use notedb_core::{Database, ItemDraft, NoteDraft};
///
/// let db = Database::open_in_memory().unwrap();
/// let work = db.tags().add(ItemDraft::titled("  work  ")).unwrap();
/// let note = db.notes().add(NoteDraft::new().with_content("<p>Quarterly plan</p>")).unwrap();
///
/// db.tags().link_note(&work, &note).unwrap();
/// assert_eq!(db.tags().tags_of(&note).unwrap()[0].title, "work");
///
/// db.tags().remove(&[work]).unwrap();
/// assert!(db.tags().tags_of(&note).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Tags {
    inner: Grouping<Tag>,
}

impl Tags {
    /// Creates the tag collection.
    pub fn new(inner: Grouping<Tag>) -> Self {
        Self { inner }
    }

    /// Sanitizes a tag title.
    #[must_use]
    pub fn sanitize(title: &str) -> String {
        sanitize_title(title)
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<Tag> {
        self.inner.collection()
    }

    /// Gets a tag by id, including tombstoned tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn tag(&self, id: &ItemId) -> CoreResult<Option<Tag>> {
        self.inner.get(id)
    }

    /// Finds the live tag with `title`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn find(&self, title: &str) -> CoreResult<Option<Tag>> {
        self.inner.find(title)
    }

    /// Adds a tag, or returns the id of the live tag with the same title.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without a title, or a backend error.
    pub fn add(&self, draft: ItemDraft) -> CoreResult<ItemId> {
        self.inner.add_with(draft, |_| {})
    }

    /// Returns a lazy view of live tags.
    #[must_use]
    pub fn all(&self) -> FilteredView<Tag> {
        self.inner.all()
    }

    /// Checks whether a tag exists, live or tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn exists(&self, id: &ItemId) -> CoreResult<bool> {
        self.inner.exists(id)
    }

    /// Unlinks tags from their notes and tombstones them atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing changes then.
    pub fn remove(&self, ids: &[ItemId]) -> CoreResult<usize> {
        self.inner.remove(ids)
    }

    /// Tags a note.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tag or note is missing or tombstoned.
    pub fn link_note(&self, tag: &ItemId, note: &ItemId) -> CoreResult<ItemId> {
        self.inner.link_note(tag, note)
    }

    /// Removes a tag from a note.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn unlink_note(&self, tag: &ItemId, note: &ItemId) -> CoreResult<bool> {
        self.inner.unlink_note(tag, note)
    }

    /// Returns the live notes carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn notes_of(&self, tag: &ItemId) -> CoreResult<Vec<Note>> {
        self.inner.notes_of(tag)
    }

    /// Returns the live tags of `note`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn tags_of(&self, note: &ItemId) -> CoreResult<Vec<Tag>> {
        self.inner.of_note(note)
    }
}
