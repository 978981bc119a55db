//! Entity model.
//!
//! Every stored record is one [`Entity`] variant, discriminated by its
//! `type` field. Kind-specific structs flatten the shared [`ItemMeta`] and
//! implement [`Item`], which lets [`crate::Collection`] handle them
//! generically.

mod note;
mod notebook;
mod relation;
mod tag;

pub use note::{Note, NoteContent};
pub use notebook::Notebook;
pub use relation::Relation;
pub use tag::Tag;

use crate::error::{CoreError, CoreResult};
use crate::id::ItemId;
use crate::types::{now_millis, Timestamp};
use notedb_storage::Record;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A tag.
    Tag,
    /// A notebook.
    Notebook,
    /// A note.
    Note,
    /// A relation between two items.
    Relation,
}

impl ItemKind {
    /// All kinds, in table creation order.
    pub const ALL: [ItemKind; 4] = [Self::Tag, Self::Notebook, Self::Note, Self::Relation];

    /// Returns the serialized `type` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Notebook => "notebook",
            Self::Note => "note",
            Self::Relation => "relation",
        }
    }

    /// Returns the table holding items of this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Notebook => "notebooks",
            Self::Note => "notes",
            Self::Relation => "relations",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weak reference to an item: its id and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemReference {
    /// Item id.
    pub id: ItemId,
    /// Item kind.
    pub kind: ItemKind,
}

impl ItemReference {
    /// Creates a reference.
    pub fn new(id: impl Into<ItemId>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Metadata shared by every item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    /// Unique id within the item's table.
    pub id: ItemId,
    /// Creation time in epoch milliseconds.
    pub date_created: Timestamp,
    /// Last modification time in epoch milliseconds.
    pub date_modified: Timestamp,
    /// Tombstone flag.
    #[serde(default)]
    pub deleted: bool,
}

impl ItemMeta {
    /// Creates live metadata stamped with the current time.
    pub fn new(id: ItemId) -> Self {
        let now = now_millis();
        Self {
            id,
            date_created: now,
            date_modified: now,
            deleted: false,
        }
    }

    /// Refreshes `date_modified` without letting it go backwards.
    pub fn touch(&mut self) {
        self.date_modified = self.date_modified.max(now_millis());
    }

    /// Marks the item as deleted and refreshes `date_modified`.
    pub fn tombstone(&mut self) {
        self.deleted = true;
        self.touch();
    }
}

/// A storable item.
///
/// Implemented by the kind-specific structs; `KIND` selects the table and
/// the `type` discriminator.
pub trait Item: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Kind of this item.
    const KIND: ItemKind;

    /// Returns the shared metadata.
    fn meta(&self) -> &ItemMeta;

    /// Returns the shared metadata mutably.
    fn meta_mut(&mut self) -> &mut ItemMeta;

    /// Wraps the item in an [`Entity`].
    fn into_entity(self) -> Entity;

    /// Unwraps an [`Entity`] of this kind.
    fn from_entity(entity: Entity) -> Option<Self>;

    /// Returns the item id.
    fn id(&self) -> &ItemId {
        &self.meta().id
    }

    /// Returns true if the item is tombstoned.
    fn is_deleted(&self) -> bool {
        self.meta().deleted
    }

    /// Returns a weak reference to this item.
    fn reference(&self) -> ItemReference {
        ItemReference::new(self.id().clone(), Self::KIND)
    }
}

/// An item identified by a unique title among live items of its kind.
pub trait TitledItem: Item + PartialEq {
    /// Creates an item with default fields besides `meta` and `title`.
    fn create(meta: ItemMeta, title: String) -> Self;

    /// Returns the title.
    fn title(&self) -> &str;

    /// Replaces the title.
    fn set_title(&mut self, title: String);
}

/// Any stored item, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    /// A tag.
    Tag(Tag),
    /// A notebook.
    Notebook(Notebook),
    /// A note.
    Note(Note),
    /// A relation.
    Relation(Relation),
}

impl Entity {
    /// Returns the kind of the wrapped item.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Tag(_) => ItemKind::Tag,
            Self::Notebook(_) => ItemKind::Notebook,
            Self::Note(_) => ItemKind::Note,
            Self::Relation(_) => ItemKind::Relation,
        }
    }

    /// Returns the shared metadata of the wrapped item.
    #[must_use]
    pub fn meta(&self) -> &ItemMeta {
        match self {
            Self::Tag(item) => item.meta(),
            Self::Notebook(item) => item.meta(),
            Self::Note(item) => item.meta(),
            Self::Relation(item) => item.meta(),
        }
    }
}

/// Serializes an item into a storage record, including its `type`.
pub(crate) fn encode<T: Item>(item: &T) -> CoreResult<Record> {
    let value = serde_json::to_value(item.clone().into_entity())
        .map_err(|e| CoreError::invalid_format(format!("cannot encode {}: {e}", T::KIND)))?;
    Record::from_value(value).map_err(|e| CoreError::invalid_format(e.to_string()))
}

/// Deserializes a storage record of any kind.
pub(crate) fn decode_entity(record: Record) -> CoreResult<Entity> {
    let id = record.id().to_string();
    serde_json::from_value(record.into_value())
        .map_err(|e| CoreError::invalid_format(format!("record {id}: {e}")))
}

/// Deserializes a storage record that must be of kind `T`.
pub(crate) fn decode<T: Item>(record: Record) -> CoreResult<T> {
    let entity = decode_entity(record)?;
    let found = entity.kind();
    T::from_entity(entity)
        .ok_or_else(|| CoreError::invalid_format(format!("expected {}, found {found}", T::KIND)))
}
