//! In-memory storage backend for testing.

use crate::backend::{StorageBackend, WriteBatch};
use crate::error::{StorageError, StorageResult};
use crate::query::Predicate;
use crate::record::Record;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

type Table = BTreeMap<String, Record>;

/// An in-memory storage backend.
///
/// This backend keeps every table in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// All tables sit behind one `RwLock`. A batch is validated first and then
/// applied under a single write guard, so concurrent readers see either the
/// state before the batch or after it.
///
/// # Example
///
/// ```rust
/// use notedb_storage::{InMemoryBackend, Record, StorageBackend};
/// use serde_json::json;
///
/// let backend = InMemoryBackend::new();
/// backend.init("notes").unwrap();
/// backend
///     .upsert("notes", Record::from_value(json!({ "id": "n1" })).unwrap())
///     .unwrap();
/// assert!(backend.exists_by_id("notes", "n1").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records (live or tombstoned) in `table`.
    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    /// Returns true if `table` holds no records.
    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Returns the names of all initialized tables.
    #[must_use]
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl StorageBackend for InMemoryBackend {
    fn init(&self, table: &str) -> StorageResult<()> {
        if table.is_empty() {
            return Err(StorageError::constraint(table, "table name must not be empty"));
        }
        self.tables.write().entry(table.to_string()).or_default();
        Ok(())
    }

    fn get_by_id(&self, table: &str, id: &str) -> StorageResult<Option<Record>> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;
        Ok(rows.get(id).cloned())
    }

    fn exists_by_id(&self, table: &str, id: &str) -> StorageResult<bool> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;
        Ok(rows.contains_key(id))
    }

    fn query_page(
        &self,
        table: &str,
        predicate: &Predicate,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> StorageResult<Vec<Record>> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;

        let lower = match after {
            Some(id) => Bound::Excluded(id.to_string()),
            None => Bound::Unbounded,
        };
        let matching = rows
            .range((lower, Bound::Unbounded))
            .map(|(_, record)| record)
            .filter(|record| predicate.matches(record));

        let page = match limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(page)
    }

    fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut tables = self.tables.write();

        // Validate the whole batch before touching any table.
        for op in &batch {
            if !tables.contains_key(&op.table) {
                return Err(StorageError::unknown_table(&op.table));
            }
            if op.record.id().is_empty() {
                return Err(StorageError::constraint(&op.table, "record without id"));
            }
        }

        for op in batch {
            if let Some(rows) = tables.get_mut(&op.table) {
                rows.insert(op.record.id().to_string(), op.record);
            }
        }
        Ok(())
    }
}
