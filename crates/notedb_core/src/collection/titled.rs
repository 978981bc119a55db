//! Title-deduplicated add for tags and notebooks.

use super::Collection;
use crate::change_feed::ChangeType;
use crate::entity::{ItemMeta, TitledItem};
use crate::error::{CoreError, CoreResult};
use crate::id::ItemId;
use crate::transaction::Transaction;
use notedb_storage::field;
use tracing::debug;

/// Input for [`Collection::add`].
///
/// With an id, the item with that id is updated (or created). Without one,
/// the live item with the same title is reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    /// Id of the item to update or create.
    pub id: Option<ItemId>,
    /// Title before sanitization.
    pub title: Option<String>,
}

impl ItemDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a draft with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self::new().with_title(title)
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
}

/// Trims leading and trailing whitespace on every line and drops lines
/// left empty.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl<T: TitledItem> Collection<T> {
    /// Adds or updates a titled item in its own transaction.
    ///
    /// See [`Collection::add_with_in_txn`].
    ///
    /// # Errors
    ///
    /// Returns `Validation` if no title can be resolved, or a backend error.
    pub fn add(&self, draft: ItemDraft) -> CoreResult<ItemId> {
        self.add_with(draft, |_| {})
    }

    /// Like [`Collection::add`], applying `customize` to the item before it
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if no title can be resolved, or a backend error.
    pub fn add_with<F>(&self, draft: ItemDraft, customize: F) -> CoreResult<ItemId>
    where
        F: FnOnce(&mut T),
    {
        self.transactions()
            .run(|txn| self.add_with_in_txn(txn, draft, customize))
    }

    /// Adds a titled item within a transaction.
    ///
    /// The existing item is resolved by id when the draft has one (live or
    /// tombstoned), otherwise by live title. If the resolved item is live
    /// and would not change, its id is returned without writing. Otherwise
    /// the item is written live, keeping `dateCreated` and refreshing
    /// `dateModified`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if neither the draft nor the resolved item has
    /// a title.
    pub fn add_with_in_txn<F>(
        &self,
        txn: &mut Transaction,
        draft: ItemDraft,
        customize: F,
    ) -> CoreResult<ItemId>
    where
        F: FnOnce(&mut T),
    {
        let title = draft
            .title
            .as_deref()
            .map(sanitize_title)
            .filter(|title| !title.is_empty());

        let existing = match (&draft.id, &title) {
            (Some(id), _) => self.get_in_txn(txn, id)?,
            (None, Some(title)) => self.find_in_txn(txn, field("title").eq(title.as_str()))?,
            (None, None) => None,
        };

        let title = match (title, &existing) {
            (Some(title), _) => title,
            (None, Some(old)) => old.title().to_string(),
            (None, None) => {
                return Err(CoreError::validation(format!("{} title is required", T::KIND)))
            }
        };

        let mut item = match &existing {
            Some(old) => old.clone(),
            None => {
                let id = draft.id.clone().unwrap_or_else(ItemId::generate);
                T::create(ItemMeta::new(id), String::new())
            }
        };
        item.set_title(title);
        customize(&mut item);
        item.meta_mut().deleted = false;

        let change_type = match &existing {
            Some(old) if !old.is_deleted() && *old == item => {
                debug!(table = self.table(), id = %old.id(), "add left item unchanged");
                return Ok(old.id().clone());
            }
            Some(_) => {
                item.meta_mut().touch();
                ChangeType::Update
            }
            None => ChangeType::Insert,
        };

        self.write_in_txn(txn, &item, change_type)?;
        Ok(item.id().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::ChangeFeed;
    use crate::entity::{Item, Notebook, Tag};
    use crate::transaction::TransactionManager;
    use notedb_storage::{InMemoryBackend, StorageBackend};
    use std::sync::Arc;

    fn collection<T: TitledItem>() -> Collection<T> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.init(T::KIND.table()).unwrap();
        let txns = Arc::new(TransactionManager::new(backend, Arc::new(ChangeFeed::new())));
        Collection::new(txns, None)
    }

    #[test]
    fn sanitize_trims_every_line() {
        assert_eq!(sanitize_title("  spaced  "), "spaced");
        assert_eq!(sanitize_title(" a \n  b "), "a\nb");
        assert_eq!(sanitize_title(" \n\t "), "");
    }

    #[test]
    fn adding_same_title_twice_returns_same_id() {
        let tags = collection::<Tag>();
        let rx = tags.transactions().feed().subscribe();

        let first = tags.add(ItemDraft::titled("work")).unwrap();
        let second = tags.add(ItemDraft::titled("  work ")).unwrap();

        assert_eq!(first, second);
        assert_eq!(tags.all().count().unwrap(), 1);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn titles_match_case_sensitively() {
        let tags = collection::<Tag>();
        let lower = tags.add(ItemDraft::titled("work")).unwrap();
        let upper = tags.add(ItemDraft::titled("Work")).unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn missing_title_is_a_validation_error() {
        let tags = collection::<Tag>();
        assert!(matches!(
            tags.add(ItemDraft::new()),
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            tags.add(ItemDraft::titled("   ")),
            Err(CoreError::Validation { .. })
        ));
        assert_eq!(tags.all().count().unwrap(), 0);
    }

    #[test]
    fn add_by_id_renames() {
        let tags = collection::<Tag>();
        let id = tags.add(ItemDraft::titled("work")).unwrap();
        let created = tags.get(&id).unwrap().unwrap().meta.date_created;

        let same = tags
            .add(ItemDraft::titled("office").with_id(id.clone()))
            .unwrap();
        assert_eq!(same, id);

        let tag = tags.get(&id).unwrap().unwrap();
        assert_eq!(tag.title, "office");
        assert_eq!(tag.meta.date_created, created);
        assert!(tag.meta.date_modified >= created);
    }

    #[test]
    fn add_by_id_without_title_keeps_existing_title() {
        let tags = collection::<Tag>();
        let id = tags.add(ItemDraft::titled("work")).unwrap();
        assert_eq!(tags.add(ItemDraft::new().with_id(id.clone())).unwrap(), id);
        assert!(matches!(
            tags.add(ItemDraft::new().with_id("unknown")),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn add_by_id_revives_tombstone() {
        let tags = collection::<Tag>();
        let id = tags.add(ItemDraft::titled("work")).unwrap();
        tags.soft_delete(&[id.clone()]).unwrap();

        tags.add(ItemDraft::new().with_id(id.clone())).unwrap();
        assert!(!tags.get(&id).unwrap().unwrap().is_deleted());
    }

    #[test]
    fn tombstoned_title_does_not_deduplicate() {
        let tags = collection::<Tag>();
        let old = tags.add(ItemDraft::titled("work")).unwrap();
        tags.soft_delete(&[old.clone()]).unwrap();

        let new = tags.add(ItemDraft::titled("work")).unwrap();
        assert_ne!(old, new);
        assert_eq!(tags.all().count().unwrap(), 1);
    }

    #[test]
    fn customize_changes_are_written() {
        let notebooks = collection::<Notebook>();
        let id = notebooks.add(ItemDraft::titled("Journal")).unwrap();

        let same = notebooks
            .add_with(ItemDraft::titled("Journal"), |nb| {
                nb.description = Some("daily".into());
            })
            .unwrap();
        assert_eq!(same, id);
        assert_eq!(
            notebooks.get(&id).unwrap().unwrap().description.as_deref(),
            Some("daily")
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn add_is_idempotent(title in "[ \\t]{0,3}[a-zA-Z0-9]{1,12}[ \\t]{0,3}", repeats in 1usize..4) {
                let tags = collection::<Tag>();
                let first = tags.add(ItemDraft::titled(title.clone())).unwrap();
                for _ in 0..repeats {
                    prop_assert_eq!(tags.add(ItemDraft::titled(title.clone())).unwrap(), first.clone());
                }
                prop_assert_eq!(tags.all().count().unwrap(), 1);
            }

            #[test]
            fn sanitized_titles_have_no_edge_whitespace(title in "\\PC{0,30}") {
                let clean = sanitize_title(&title);
                for line in clean.lines() {
                    prop_assert_eq!(line, line.trim());
                    prop_assert!(!line.is_empty());
                }
            }
        }
    }
}
