//! The note collection.

use crate::collection::{Collection, FilteredView};
use crate::entity::{Item, ItemMeta, Note, NoteContent};
use crate::error::{CoreError, CoreResult};
use crate::id::ItemId;
use crate::relations::Relations;
use crate::transaction::Transaction;
use crate::types::now_millis;
use notedb_content::{
    text, Attachment, ContentModel, ContentType, ResolvedAttachment, DEFAULT_IMAGE_MIME,
};
use notedb_storage::BlobStore;
use std::sync::Arc;
use tracing::debug;

/// Input for [`Notes::add`]. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    /// Id of the note to update or create.
    pub id: Option<ItemId>,
    /// Explicit title.
    pub title: Option<String>,
    /// Body markup, possibly with inline attachment data.
    pub content: Option<String>,
    /// Pinned flag.
    pub pinned: Option<bool>,
    /// Favorite flag.
    pub favorite: Option<bool>,
}

impl NoteDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body markup.
    #[must_use]
    pub fn with_content(mut self, markup: impl Into<String>) -> Self {
        self.content = Some(markup.into());
        self
    }

    /// Sets the pinned flag.
    #[must_use]
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    /// Sets the favorite flag.
    #[must_use]
    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }
}

/// A body after attachment extraction, with its derived views.
struct PreparedBody {
    data: String,
    title: String,
    headline: String,
    has_text: bool,
    attachments: Vec<Attachment>,
}

/// Joins the lines of a title with single spaces.
fn single_line(title: &str) -> String {
    title
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title used when neither the caller nor the body provides one.
fn fallback_title(timestamp: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(timestamp) {
        Some(date) => format!("Note {}", date.format("%Y-%m-%d %H:%M")),
        None => "Untitled note".to_string(),
    }
}

/// Notes with rich-text bodies.
///
/// Bodies are stored with attachments extracted into the blob store; the
/// title (when not given) and headline are derived from the body on every
/// save.
///
/// # Example
///
/// ```rust
/// use notedb_core::{Database, NoteDraft};
///
/// let db = Database::open_in_memory().unwrap();
/// let id = db
///     .notes()
///     .add(NoteDraft::new().with_content("<p>Call Alice. Then lunch</p>"))
///     .unwrap();
///
/// let note = db.notes().note(&id).unwrap().unwrap();
/// assert_eq!(note.headline, "Call Alice.");
/// assert_eq!(db.notes().search("alice").unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct Notes {
    collection: Collection<Note>,
    relations: Relations,
    content: Arc<ContentModel>,
    blobs: Arc<dyn BlobStore>,
}

impl Notes {
    /// Creates the note collection.
    pub fn new(
        collection: Collection<Note>,
        relations: Relations,
        content: Arc<ContentModel>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            collection,
            relations,
            content,
            blobs,
        }
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<Note> {
        &self.collection
    }

    /// Gets a note by id, including tombstoned notes.
    ///
    /// The body keeps its attachment placeholders; see [`Notes::content`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn note(&self, id: &ItemId) -> CoreResult<Option<Note>> {
        self.collection.get(id)
    }

    /// Returns a lazy view of live notes.
    #[must_use]
    pub fn all(&self) -> FilteredView<Note> {
        self.collection.all()
    }

    /// Checks whether a note exists, live or tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn exists(&self, id: &ItemId) -> CoreResult<bool> {
        self.collection.exists(id)
    }

    /// Adds or updates a note in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a new note with neither title nor content,
    /// or a backend error.
    pub fn add(&self, draft: NoteDraft) -> CoreResult<ItemId> {
        self.collection
            .transactions()
            .run(|txn| self.add_in_txn(txn, draft))
    }

    /// Adds or updates a note within a transaction.
    ///
    /// Inline attachments of the body are moved to the blob store before
    /// the note is written. Blob writes are not rolled back if the
    /// transaction later fails; blobs are content-addressed and
    /// unreferenced ones are harmless.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a new note with neither title nor content,
    /// or a backend error.
    pub fn add_in_txn(&self, txn: &mut Transaction, draft: NoteDraft) -> CoreResult<ItemId> {
        let existing = match &draft.id {
            Some(id) => self.collection.get_in_txn(txn, id)?,
            None => None,
        };
        let title = draft
            .title
            .as_deref()
            .map(single_line)
            .filter(|title| !title.is_empty());
        let body = draft
            .content
            .as_deref()
            .map(|markup| self.prepare(markup))
            .transpose()?;

        let has_body = body
            .as_ref()
            .is_some_and(|b| b.has_text || !b.attachments.is_empty());
        if existing.is_none() && title.is_none() && !has_body {
            return Err(CoreError::validation("note requires a title or content"));
        }

        let mut note = match &existing {
            Some(old) => old.clone(),
            None => Note {
                meta: ItemMeta::new(draft.id.clone().unwrap_or_else(ItemId::generate)),
                title: String::new(),
                headline: String::new(),
                content: NoteContent::default(),
                attachments: Vec::new(),
                pinned: false,
                favorite: false,
            },
        };

        let derived_title = match body {
            Some(body) => {
                let mut attachments = body.attachments;
                for attachment in &mut attachments {
                    if let Some(old) = note.attachment(&attachment.hash) {
                        attachment.merge_from(old);
                    }
                }
                note.content = NoteContent {
                    kind: ContentType::Tiny,
                    data: body.data,
                };
                note.headline = body.headline;
                note.attachments = attachments;
                Some(body.title)
            }
            None => None,
        };

        match title {
            Some(title) => note.title = title,
            None if note.title.is_empty() => {
                note.title = derived_title
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| fallback_title(now_millis()));
            }
            None => {}
        }
        if let Some(pinned) = draft.pinned {
            note.pinned = pinned;
        }
        if let Some(favorite) = draft.favorite {
            note.favorite = favorite;
        }
        note.meta.deleted = false;

        match &existing {
            Some(old) if !old.is_deleted() && *old == note => {
                debug!(id = %old.id(), "note unchanged");
            }
            Some(_) => {
                note.meta.touch();
                self.collection.upsert_in_txn(txn, &note)?;
            }
            None => self.collection.upsert_in_txn(txn, &note)?,
        }
        Ok(note.meta.id)
    }

    fn prepare(&self, markup: &str) -> CoreResult<PreparedBody> {
        let extraction = self
            .content
            .body(markup)
            .extract_attachments(self.blobs.as_ref())?;
        let (title, headline, has_text) = {
            let body = self.content.body(&extraction.data);
            (body.to_title(), body.to_headline().to_string(), !body.is_empty())
        };
        Ok(PreparedBody {
            data: extraction.data,
            title,
            headline,
            has_text,
            attachments: extraction.attachments,
        })
    }

    /// Returns the body of a note with attachment data re-inserted.
    ///
    /// Attachments missing from the blob store keep their placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or blob store fails.
    pub fn content(&self, id: &ItemId) -> CoreResult<Option<String>> {
        let Some(note) = self.collection.get(id)? else {
            return Ok(None);
        };
        let data = self
            .content
            .body(&note.content.data)
            .insert_attachments(|hash| {
                let Some(data) = self.blobs.fetch(hash)? else {
                    return Ok(None);
                };
                let mime = note
                    .attachment(hash)
                    .and_then(|a| a.mime.clone())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                Ok(Some(ResolvedAttachment { data, mime }))
            })?;
        Ok(Some(data))
    }

    /// Returns live notes whose title or body contains any word of `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn search(&self, query: &str) -> CoreResult<Vec<Note>> {
        let mut found = Vec::new();
        for note in self.collection.all().iter() {
            let note = note?;
            if text::matches_query(&note.title, query)
                || self.content.body(&note.content.data).search(query)
            {
                found.push(note);
            }
        }
        Ok(found)
    }

    /// Unlinks notes from everything and tombstones them atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing changes then.
    pub fn remove(&self, ids: &[ItemId]) -> CoreResult<usize> {
        self.collection.transactions().run(|txn| {
            self.relations.unlink_all_in_txn(txn, ids)?;
            self.collection.soft_delete_in_txn(txn, ids)
        })
    }
}

impl std::fmt::Debug for Notes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notes")
            .field("collection", &self.collection)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_single_line() {
        assert_eq!(single_line("  Plan\n  for\r\nmonday "), "Plan for monday");
        assert_eq!(single_line(" \n "), "");
    }

    #[test]
    fn fallback_title_names_the_date() {
        assert_eq!(fallback_title(0), "Note 1970-01-01 00:00");
    }
}
