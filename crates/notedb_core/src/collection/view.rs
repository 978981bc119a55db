//! Lazy filtered views over a collection.

use crate::entity::{decode, Item};
use crate::error::CoreResult;
use crate::id::ItemId;
use notedb_storage::{Predicate, QueryIter, StorageBackend};
use std::marker::PhantomData;
use std::sync::Arc;

/// A lazy, restartable query over one collection.
///
/// Nothing is read until [`FilteredView::iter`] (or a consuming helper) is
/// called; each call starts a fresh scan that fetches records in chunks of
/// the configured batch size.
pub struct FilteredView<T: Item> {
    backend: Arc<dyn StorageBackend>,
    table: &'static str,
    predicate: Predicate,
    batch_size: Option<usize>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Item> Clone for FilteredView<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            table: self.table,
            predicate: self.predicate.clone(),
            batch_size: self.batch_size,
            _marker: PhantomData,
        }
    }
}

impl<T: Item> FilteredView<T> {
    pub(crate) fn new(
        backend: Arc<dyn StorageBackend>,
        predicate: Predicate,
        batch_size: Option<usize>,
    ) -> Self {
        Self {
            backend,
            table: T::KIND.table(),
            predicate,
            batch_size,
            _marker: PhantomData,
        }
    }

    /// Returns the predicate of this view.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Narrows the view with another predicate.
    #[must_use]
    pub fn filter(&self, predicate: Predicate) -> Self {
        Self {
            predicate: self.predicate.clone().and(predicate),
            ..self.clone()
        }
    }

    /// Starts a new scan.
    pub fn iter(&self) -> ViewIter<'_, T> {
        ViewIter {
            inner: self
                .backend
                .query_all(self.table, self.predicate.clone(), self.batch_size),
            _marker: PhantomData,
        }
    }

    /// Returns the first matching item.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn find(&self) -> CoreResult<Option<T>> {
        self.iter().next().transpose()
    }

    /// Counts matching items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn count(&self) -> CoreResult<usize> {
        self.iter().try_fold(0, |n, item| item.map(|_| n + 1))
    }

    /// Collects the ids of matching items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn ids(&self) -> CoreResult<Vec<ItemId>> {
        self.iter().map(|item| item.map(|i| i.id().clone())).collect()
    }

    /// Collects all matching items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub fn to_vec(&self) -> CoreResult<Vec<T>> {
        self.iter().collect()
    }
}

impl<T: Item> std::fmt::Debug for FilteredView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredView")
            .field("table", &self.table)
            .field("predicate", &self.predicate)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Iterator returned by [`FilteredView::iter`].
///
/// Yields decoded items; after an error the iterator is exhausted.
pub struct ViewIter<'a, T> {
    inner: QueryIter<'a>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Item> Iterator for ViewIter<'_, T> {
    type Item = CoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|record| record.map_err(Into::into).and_then(decode::<T>))
    }
}
