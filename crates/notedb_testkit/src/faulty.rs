//! Failure injection.
//!
//! [`FaultyBackend`] and [`FaultyBlobStore`] wrap the in-memory stores and
//! fail on demand, for testing that failed commits leave no trace.

use notedb_storage::{
    BlobEncoding, BlobMetadata, BlobStore, InMemoryBackend, InMemoryBlobStore, Predicate, Record,
    StorageBackend, StorageError, StorageResult, WriteBatch,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An in-memory backend whose next `apply` can be made to fail.
#[derive(Debug, Default)]
pub struct FaultyBackend {
    inner: InMemoryBackend,
    fail_next_apply: AtomicBool,
    applied: AtomicUsize,
    rejected: AtomicUsize,
}

impl FaultyBackend {
    /// Creates a backend that does not fail until armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `apply` fail with [`StorageError::Unavailable`].
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    /// Number of batches applied successfully.
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    /// Number of batches rejected by injection.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Number of records in `table`, live or tombstoned.
    pub fn len(&self, table: &str) -> usize {
        self.inner.len(table)
    }

    /// Returns true if `table` holds no records.
    pub fn is_empty(&self, table: &str) -> bool {
        self.inner.is_empty(table)
    }
}

impl StorageBackend for FaultyBackend {
    fn init(&self, table: &str) -> StorageResult<()> {
        self.inner.init(table)
    }

    fn get_by_id(&self, table: &str, id: &str) -> StorageResult<Option<Record>> {
        self.inner.get_by_id(table, id)
    }

    fn exists_by_id(&self, table: &str, id: &str) -> StorageResult<bool> {
        self.inner.exists_by_id(table, id)
    }

    fn query_page(
        &self,
        table: &str,
        predicate: &Predicate,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> StorageResult<Vec<Record>> {
        self.inner.query_page(table, predicate, after, limit)
    }

    fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::unavailable("injected apply failure"));
        }
        self.inner.apply(batch)?;
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An in-memory blob store whose next `store` can be made to fail.
#[derive(Debug, Default)]
pub struct FaultyBlobStore {
    inner: InMemoryBlobStore,
    fail_next_store: AtomicBool,
}

impl FaultyBlobStore {
    /// Creates a blob store that does not fail until armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `store` fail with [`StorageError::Unavailable`].
    pub fn fail_next_store(&self) {
        self.fail_next_store.store(true, Ordering::SeqCst);
    }

    /// Number of distinct blobs stored.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no blob is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl BlobStore for FaultyBlobStore {
    fn store(&self, data: &[u8], encoding: BlobEncoding) -> StorageResult<BlobMetadata> {
        if self.fail_next_store.swap(false, Ordering::SeqCst) {
            return Err(StorageError::unavailable("injected store failure"));
        }
        self.inner.store(data, encoding)
    }

    fn fetch(&self, hash: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.fetch(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notedb_storage::WriteOp;

    fn record(id: &str) -> Record {
        Record::from_value(serde_json::json!({ "id": id })).unwrap()
    }

    #[test]
    fn armed_apply_fails_once() {
        let backend = FaultyBackend::new();
        backend.init("tags").unwrap();

        backend.fail_next_apply();
        assert!(backend.apply(vec![WriteOp::upsert("tags", record("a"))]).is_err());
        assert!(backend.is_empty("tags"));

        backend.apply(vec![WriteOp::upsert("tags", record("a"))]).unwrap();
        assert_eq!(backend.len("tags"), 1);
        assert_eq!((backend.applied(), backend.rejected()), (1, 1));
    }

    #[test]
    fn armed_store_fails_once() {
        let blobs = FaultyBlobStore::new();
        blobs.fail_next_store();
        assert!(blobs.store(b"x", BlobEncoding::Raw).is_err());
        assert!(blobs.store(b"x", BlobEncoding::Raw).is_ok());
        assert_eq!(blobs.len(), 1);
    }
}
