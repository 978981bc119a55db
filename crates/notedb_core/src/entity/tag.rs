use super::{Entity, Item, ItemKind, ItemMeta, TitledItem};
use serde::{Deserialize, Serialize};

/// A tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Shared metadata.
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// Sanitized title, unique among live tags.
    pub title: String,
}

impl Item for Tag {
    const KIND: ItemKind = ItemKind::Tag;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }

    fn into_entity(self) -> Entity {
        Entity::Tag(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

impl TitledItem for Tag {
    fn create(meta: ItemMeta, title: String) -> Self {
        Self { meta, title }
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }
}
