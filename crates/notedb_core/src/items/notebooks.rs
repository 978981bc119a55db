//! The notebook collection.

use super::Grouping;
use crate::collection::{Collection, FilteredView, ItemDraft};
use crate::entity::{Note, Notebook};
use crate::error::CoreResult;
use crate::id::ItemId;

/// Input for [`Notebooks::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookDraft {
    /// Id and title.
    pub item: ItemDraft,
    /// New description, if it should change.
    pub description: Option<String>,
    /// New pinned flag, if it should change.
    pub pinned: Option<bool>,
}

impl NotebookDraft {
    /// Creates a draft with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            item: ItemDraft::titled(title),
            ..Self::default()
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.item = self.item.with_id(id);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the pinned flag.
    #[must_use]
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }
}

/// Notebooks, unique by title among live notebooks.
#[derive(Debug, Clone)]
pub struct Notebooks {
    inner: Grouping<Notebook>,
}

impl Notebooks {
    /// Creates the notebook collection.
    pub fn new(inner: Grouping<Notebook>) -> Self {
        Self { inner }
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<Notebook> {
        self.inner.collection()
    }

    /// Gets a notebook by id, including tombstoned notebooks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn notebook(&self, id: &ItemId) -> CoreResult<Option<Notebook>> {
        self.inner.get(id)
    }

    /// Finds the live notebook with `title`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn find(&self, title: &str) -> CoreResult<Option<Notebook>> {
        self.inner.find(title)
    }

    /// Adds a notebook, or updates the live notebook with the same title.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without a title, or a backend error.
    pub fn add(&self, draft: NotebookDraft) -> CoreResult<ItemId> {
        let NotebookDraft {
            item,
            description,
            pinned,
        } = draft;
        self.inner.add_with(item, |notebook| {
            if let Some(description) = description {
                notebook.description = Some(description).filter(|d| !d.is_empty());
            }
            if let Some(pinned) = pinned {
                notebook.pinned = pinned;
            }
        })
    }

    /// Returns a lazy view of live notebooks.
    #[must_use]
    pub fn all(&self) -> FilteredView<Notebook> {
        self.inner.all()
    }

    /// Checks whether a notebook exists, live or tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn exists(&self, id: &ItemId) -> CoreResult<bool> {
        self.inner.exists(id)
    }

    /// Unlinks notebooks from their notes and tombstones them atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing changes then.
    pub fn remove(&self, ids: &[ItemId]) -> CoreResult<usize> {
        self.inner.remove(ids)
    }

    /// Adds a note to a notebook.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the notebook or note is missing or tombstoned.
    pub fn link_note(&self, notebook: &ItemId, note: &ItemId) -> CoreResult<ItemId> {
        self.inner.link_note(notebook, note)
    }

    /// Removes a note from a notebook.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn unlink_note(&self, notebook: &ItemId, note: &ItemId) -> CoreResult<bool> {
        self.inner.unlink_note(notebook, note)
    }

    /// Returns the live notes in `notebook`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn notes_of(&self, notebook: &ItemId) -> CoreResult<Vec<Note>> {
        self.inner.notes_of(notebook)
    }

    /// Returns the live notebooks containing `note`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn notebooks_of(&self, note: &ItemId) -> CoreResult<Vec<Notebook>> {
        self.inner.of_note(note)
    }
}
