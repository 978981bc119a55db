//! Relation graph.
//!
//! Relations are typed, directed edges stored in their own soft-delete
//! collection. Unlinking tombstones the edge; linking the same endpoints
//! again revives it instead of creating a duplicate.

use crate::change_feed::ChangeType;
use crate::collection::{Collection, FilteredView};
use crate::entity::{Item, ItemKind, ItemMeta, ItemReference, Relation};
use crate::error::CoreResult;
use crate::id::ItemId;
use crate::transaction::Transaction;
use notedb_storage::{and, field, or, Predicate};
use tracing::debug;

fn edge(from: &ItemReference, to: &ItemReference, relation_type: &str) -> Predicate {
    and([
        field("fromId").eq(from.id.as_str()),
        field("fromType").eq(from.kind.as_str()),
        field("toId").eq(to.id.as_str()),
        field("toType").eq(to.kind.as_str()),
        field("relationType").eq(relation_type),
    ])
}

fn touching(ids: &[ItemId]) -> Predicate {
    let ids: Vec<&str> = ids.iter().map(ItemId::as_str).collect();
    or([
        field("fromId").is_in(ids.iter().copied()),
        field("toId").is_in(ids.iter().copied()),
    ])
}

/// Typed many-to-many links between items.
#[derive(Debug, Clone)]
pub struct Relations {
    collection: Collection<Relation>,
}

impl Relations {
    /// Creates the relation graph over `collection`.
    pub fn new(collection: Collection<Relation>) -> Self {
        Self { collection }
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<Relation> {
        &self.collection
    }

    /// Links `from` to `to` in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn link(
        &self,
        from: &ItemReference,
        to: &ItemReference,
        relation_type: &str,
    ) -> CoreResult<ItemId> {
        self.collection
            .transactions()
            .run(|txn| self.link_in_txn(txn, from, to, relation_type))
    }

    /// Links `from` to `to` within a transaction.
    ///
    /// Returns the id of the live edge. An existing live edge is returned
    /// as-is; a tombstoned one is revived.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn link_in_txn(
        &self,
        txn: &mut Transaction,
        from: &ItemReference,
        to: &ItemReference,
        relation_type: &str,
    ) -> CoreResult<ItemId> {
        let existing = self
            .collection
            .select_in_txn(txn, &edge(from, to, relation_type))?;

        if let Some(live) = existing.iter().find(|r| !r.is_deleted()) {
            return Ok(live.id().clone());
        }
        if let Some(mut relation) = existing.into_iter().next() {
            relation.meta.deleted = false;
            relation.meta.touch();
            self.collection
                .write_in_txn(txn, &relation, ChangeType::Update)?;
            debug!(id = %relation.id(), relation_type, "relation revived");
            return Ok(relation.meta.id);
        }

        let relation = Relation {
            meta: ItemMeta::new(ItemId::generate()),
            from_id: from.id.clone(),
            from_type: from.kind,
            to_id: to.id.clone(),
            to_type: to.kind,
            relation_type: relation_type.to_string(),
        };
        self.collection
            .write_in_txn(txn, &relation, ChangeType::Insert)?;
        Ok(relation.meta.id)
    }

    /// Tombstones the edge from `from` to `to`. Returns false if there was
    /// no live edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn unlink(
        &self,
        from: &ItemReference,
        to: &ItemReference,
        relation_type: &str,
    ) -> CoreResult<bool> {
        self.collection.transactions().run(|txn| {
            let ids = self.live_ids_in_txn(txn, edge(from, to, relation_type))?;
            Ok(self.collection.soft_delete_in_txn(txn, &ids)? > 0)
        })
    }

    /// Tombstones every live edge of `relation_type` touching `ids`, in its
    /// own transaction. Returns the number of edges removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing is removed then.
    pub fn unlink_of_type(&self, relation_type: &str, ids: &[ItemId]) -> CoreResult<usize> {
        self.collection
            .transactions()
            .run(|txn| self.unlink_of_type_in_txn(txn, relation_type, ids))
    }

    /// Tombstones every live edge of `relation_type` touching `ids` within
    /// a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn unlink_of_type_in_txn(
        &self,
        txn: &mut Transaction,
        relation_type: &str,
        ids: &[ItemId],
    ) -> CoreResult<usize> {
        let predicate = field("relationType").eq(relation_type).and(touching(ids));
        let edges = self.live_ids_in_txn(txn, predicate)?;
        self.collection.soft_delete_in_txn(txn, &edges)
    }

    /// Tombstones every live edge touching `ids` regardless of type.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; nothing is removed then.
    pub fn unlink_all(&self, ids: &[ItemId]) -> CoreResult<usize> {
        self.collection
            .transactions()
            .run(|txn| self.unlink_all_in_txn(txn, ids))
    }

    /// Tombstones every live edge touching `ids` within a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn unlink_all_in_txn(&self, txn: &mut Transaction, ids: &[ItemId]) -> CoreResult<usize> {
        let edges = self.live_ids_in_txn(txn, touching(ids))?;
        self.collection.soft_delete_in_txn(txn, &edges)
    }

    fn live_ids_in_txn(&self, txn: &Transaction, predicate: Predicate) -> CoreResult<Vec<ItemId>> {
        let live = field("deleted").is_false().and(predicate);
        Ok(self
            .collection
            .select_in_txn(txn, &live)?
            .into_iter()
            .map(|r| r.meta.id)
            .collect())
    }

    /// Returns a lazy view of the live edges touching `id`.
    #[must_use]
    pub fn relations_for(&self, id: &ItemId) -> FilteredView<Relation> {
        self.collection
            .all()
            .filter(touching(std::slice::from_ref(id)))
    }

    /// Returns the other endpoint of every live edge touching `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn linked(&self, id: &ItemId) -> CoreResult<Vec<ItemReference>> {
        self.relations_for(id)
            .iter()
            .filter_map(|relation| match relation {
                Ok(relation) => relation.other_end(id).map(Ok),
                Err(err) => Some(Err(err)),
            })
            .collect()
    }

    /// Returns a lazy view of the live edges leaving `from` towards items of
    /// kind `to_kind`.
    #[must_use]
    pub fn from(&self, from: &ItemReference, to_kind: ItemKind) -> FilteredView<Relation> {
        self.collection.all().filter(and([
            field("fromId").eq(from.id.as_str()),
            field("fromType").eq(from.kind.as_str()),
            field("toType").eq(to_kind.as_str()),
        ]))
    }

    /// Returns a lazy view of the live edges arriving at `to` from items of
    /// kind `from_kind`.
    #[must_use]
    pub fn to(&self, to: &ItemReference, from_kind: ItemKind) -> FilteredView<Relation> {
        self.collection.all().filter(and([
            field("toId").eq(to.id.as_str()),
            field("toType").eq(to.kind.as_str()),
            field("fromType").eq(from_kind.as_str()),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::ChangeFeed;
    use crate::transaction::TransactionManager;
    use notedb_storage::{InMemoryBackend, StorageBackend};
    use std::sync::Arc;

    fn relations() -> Relations {
        let backend = Arc::new(InMemoryBackend::new());
        backend.init("relations").unwrap();
        let txns = Arc::new(TransactionManager::new(backend, Arc::new(ChangeFeed::new())));
        Relations::new(Collection::new(txns, None))
    }

    fn tag(id: &str) -> ItemReference {
        ItemReference::new(id, ItemKind::Tag)
    }

    fn note(id: &str) -> ItemReference {
        ItemReference::new(id, ItemKind::Note)
    }

    #[test]
    fn link_is_idempotent() {
        let relations = relations();
        let first = relations.link(&tag("t1"), &note("n1"), "tag").unwrap();
        let second = relations.link(&tag("t1"), &note("n1"), "tag").unwrap();

        assert_eq!(first, second);
        assert_eq!(relations.collection().all().count().unwrap(), 1);
    }

    #[test]
    fn relink_revives_tombstoned_edge() {
        let relations = relations();
        let id = relations.link(&tag("t1"), &note("n1"), "tag").unwrap();
        assert!(relations.unlink(&tag("t1"), &note("n1"), "tag").unwrap());
        assert!(!relations.unlink(&tag("t1"), &note("n1"), "tag").unwrap());

        let revived = relations.link(&tag("t1"), &note("n1"), "tag").unwrap();
        assert_eq!(revived, id);
        assert!(!relations.collection().get(&id).unwrap().unwrap().is_deleted());
    }

    #[test]
    fn unlink_of_type_only_touches_that_type() {
        let relations = relations();
        relations.link(&tag("t1"), &note("n1"), "tag").unwrap();
        relations.link(&tag("t1"), &note("n2"), "tag").unwrap();
        let other = ItemReference::new("b1", ItemKind::Notebook);
        relations.link(&other, &note("n1"), "notebook").unwrap();

        let removed = relations.unlink_of_type("tag", &["t1".into()]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(relations.linked(&"n1".into()).unwrap(), vec![other]);
    }

    #[test]
    fn unlink_all_removes_both_directions() {
        let relations = relations();
        relations.link(&tag("t1"), &note("n1"), "tag").unwrap();
        relations
            .link(&note("n1"), &note("n2"), "note")
            .unwrap();
        relations.link(&tag("t2"), &note("n2"), "tag").unwrap();

        assert_eq!(relations.unlink_all(&["n1".into()]).unwrap(), 2);
        assert_eq!(relations.collection().all().count().unwrap(), 1);
    }

    #[test]
    fn endpoint_queries() {
        let relations = relations();
        relations.link(&tag("t1"), &note("n1"), "tag").unwrap();
        relations.link(&tag("t1"), &note("n2"), "tag").unwrap();
        relations.link(&tag("t2"), &note("n1"), "tag").unwrap();

        let notes: Vec<_> = relations
            .from(&tag("t1"), ItemKind::Note)
            .to_vec()
            .unwrap()
            .into_iter()
            .map(|r| r.to_id)
            .collect();
        assert_eq!(notes.len(), 2);

        let tags = relations.to(&note("n1"), ItemKind::Tag).count().unwrap();
        assert_eq!(tags, 2);
        assert_eq!(relations.relations_for(&"t1".into()).count().unwrap(), 2);
    }
}
