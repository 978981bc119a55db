use super::{Entity, Item, ItemKind, ItemMeta, ItemReference};
use crate::id::ItemId;
use serde::{Deserialize, Serialize};

/// A directed, typed edge between two items.
///
/// Endpoints are weak: tombstoning either side leaves the relation record
/// intact until it is unlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Shared metadata.
    #[serde(flatten)]
    pub meta: ItemMeta,
    /// Source id.
    pub from_id: ItemId,
    /// Source kind.
    pub from_type: ItemKind,
    /// Target id.
    pub to_id: ItemId,
    /// Target kind.
    pub to_type: ItemKind,
    /// Edge type, e.g. `"tag"` for tag-to-note links.
    pub relation_type: String,
}

impl Relation {
    /// Returns the source endpoint.
    #[must_use]
    pub fn source(&self) -> ItemReference {
        ItemReference::new(self.from_id.clone(), self.from_type)
    }

    /// Returns the target endpoint.
    #[must_use]
    pub fn target(&self) -> ItemReference {
        ItemReference::new(self.to_id.clone(), self.to_type)
    }

    /// Returns the endpoint opposite to `id`, or `None` if `id` is neither.
    #[must_use]
    pub fn other_end(&self, id: &ItemId) -> Option<ItemReference> {
        if &self.from_id == id {
            Some(self.target())
        } else if &self.to_id == id {
            Some(self.source())
        } else {
            None
        }
    }
}

impl Item for Relation {
    const KIND: ItemKind = ItemKind::Relation;

    fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }

    fn into_entity(self) -> Entity {
        Entity::Relation(self)
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}
