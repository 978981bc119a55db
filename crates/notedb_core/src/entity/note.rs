use super::{Entity, Item, ItemKind, ItemMeta};
use notedb_content::{Attachment, ContentType};
use serde::{Deserialize, Serialize};

/// Stored body of a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteContent {
    /// Body format.
    #[serde(rename = "type", default)]
    pub kind: ContentType,
    /// Markup with attachments replaced by `data-hash` placeholders.
    #[serde(default)]
    pub data: String,
}

/// A note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Shared metadata.
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// Title, supplied or derived from the body.
    #[serde(default)]
    pub title: String,
    /// First sentence or line of the body.
    #[serde(default)]
    pub headline: String,
    /// Body.
    #[serde(default)]
    pub content: NoteContent,
    /// Attachments referenced by the body.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Pinned to the top of listings.
    #[serde(default)]
    pub pinned: bool,
    /// Marked as favorite.
    #[serde(default)]
    pub favorite: bool,
}

impl Note {
    /// Returns the attachment record for `hash`, if any.
    #[must_use]
    pub fn attachment(&self, hash: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.hash == hash)
    }
}

impl Item for Note {
    const KIND: ItemKind = ItemKind::Note;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }

    fn into_entity(self) -> Entity {
        Entity::Note(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Note(note) => Some(note),
            _ => None,
        }
    }
}
