//! Storage backend trait definition.

use crate::error::StorageResult;
use crate::query::Predicate;
use crate::record::Record;
use std::collections::VecDeque;

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    /// Target table.
    pub table: String,
    /// Full record to upsert.
    pub record: Record,
}

impl WriteOp {
    /// Creates an upsert of `record` into `table`.
    pub fn upsert(table: impl Into<String>, record: Record) -> Self {
        Self {
            table: table.into(),
            record,
        }
    }
}

/// An ordered group of writes applied atomically.
pub type WriteBatch = Vec<WriteOp>;

/// A keyed record store for notedb.
///
/// Backends persist records in named tables and answer predicate queries.
/// They do not interpret record contents beyond evaluating predicates;
/// tombstones, deduplication and timestamps are handled by `notedb_core`.
///
/// # Invariants
///
/// - `apply` is all-or-nothing: on error no record of the batch is visible
/// - Readers observe a record either before or after a write, never a mix
/// - `query_page` returns records ordered by ascending `id`
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For tests and ephemeral stores
pub trait StorageBackend: Send + Sync {
    /// Prepares `table` for use. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    fn init(&self, table: &str) -> StorageResult<()>;

    /// Reads one record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown or the read fails.
    fn get_by_id(&self, table: &str, id: &str) -> StorageResult<Option<Record>>;

    /// Checks whether a record with `id` exists (live or tombstoned).
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown or the read fails.
    fn exists_by_id(&self, table: &str, id: &str) -> StorageResult<bool> {
        Ok(self.get_by_id(table, id)?.is_some())
    }

    /// Returns up to `limit` records matching `predicate` whose id sorts
    /// strictly after `after`, ordered by id. `None` means no limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown or the read fails.
    fn query_page(
        &self,
        table: &str,
        predicate: &Predicate,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> StorageResult<Vec<Record>>;

    /// Applies every write of `batch` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any write is rejected; nothing is applied then.
    fn apply(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Inserts or replaces one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown or the write is rejected.
    fn upsert(&self, table: &str, record: Record) -> StorageResult<()> {
        self.apply(vec![WriteOp::upsert(table, record)])
    }
}

impl dyn StorageBackend + '_ {
    /// Lazily iterates all records matching `predicate`, fetching them in
    /// chunks of `batch_size` (one page when `None`).
    ///
    /// The iterator issues a new page query whenever its buffer runs dry,
    /// so records committed between pages may be observed.
    pub fn query_all(
        &self,
        table: &str,
        predicate: Predicate,
        batch_size: Option<usize>,
    ) -> QueryIter<'_> {
        QueryIter::new(self, table, predicate, batch_size)
    }
}

/// Lazy, batched iterator over a predicate query.
///
/// Yields `StorageResult<Record>`; after an error the iterator is exhausted.
pub struct QueryIter<'a> {
    backend: &'a dyn StorageBackend,
    table: String,
    predicate: Predicate,
    batch_size: Option<usize>,
    buffer: VecDeque<Record>,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a> QueryIter<'a> {
    /// Creates an iterator over `table`.
    pub fn new(
        backend: &'a dyn StorageBackend,
        table: &str,
        predicate: Predicate,
        batch_size: Option<usize>,
    ) -> Self {
        Self {
            backend,
            table: table.to_string(),
            predicate,
            // A zero batch would never make progress.
            batch_size: batch_size.filter(|size| *size > 0),
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> StorageResult<()> {
        let page = self.backend.query_page(
            &self.table,
            &self.predicate,
            self.cursor.as_deref(),
            self.batch_size,
        )?;

        match self.batch_size {
            Some(size) if page.len() >= size => {}
            _ => self.exhausted = true,
        }
        if let Some(last) = page.last() {
            self.cursor = Some(last.id().to_string());
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for QueryIter<'_> {
    type Item = StorageResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fill() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

impl std::fmt::Debug for QueryIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryIter")
            .field("table", &self.table)
            .field("batch_size", &self.batch_size)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
