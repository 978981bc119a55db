use super::{Entity, Item, ItemKind, ItemMeta, TitledItem};
use serde::{Deserialize, Serialize};

/// A notebook grouping notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Shared metadata.
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// Sanitized title, unique among live notebooks.
    pub title: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pinned to the top of listings.
    #[serde(default)]
    pub pinned: bool,
}

impl Item for Notebook {
    const KIND: ItemKind = ItemKind::Notebook;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }

    fn into_entity(self) -> Entity {
        Entity::Notebook(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Notebook(notebook) => Some(notebook),
            _ => None,
        }
    }
}

impl TitledItem for Notebook {
    fn create(meta: ItemMeta, title: String) -> Self {
        Self {
            meta,
            title,
            description: None,
            pinned: false,
        }
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }
}
