//! Transaction state.

use crate::change_feed::{ChangeType, CollectionChange};
use crate::error::{CoreError, CoreResult};
use crate::id::ItemId;
use crate::types::TransactionId;
use notedb_storage::{Record, WriteBatch, WriteOp};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::thread::ThreadId;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can buffer writes.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// A buffered record write.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    /// Target table.
    pub table: String,
    /// Full record to upsert.
    pub record: Record,
    /// How the write changes the record, folded over repeated writes.
    pub change_type: ChangeType,
}

/// A transaction buffer.
///
/// Reads through a collection's `*_in_txn` methods see the buffered
/// records before the committed ones. Writing the same record twice keeps
/// one entry in its original position.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    writes: Vec<PendingWrite>,
    /// (table, record id) -> position in `writes`.
    index: HashMap<(String, String), usize>,
}

impl Transaction {
    /// Creates a new transaction.
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            writes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Buffers an upsert of `record` into `table`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the transaction is no longer active.
    pub fn put(&mut self, table: &str, record: Record, change_type: ChangeType) -> CoreResult<()> {
        self.ensure_active()?;
        let key = (table.to_string(), record.id().to_string());
        match self.index.get(&key) {
            Some(&slot) => {
                let write = &mut self.writes[slot];
                write.change_type = write.change_type.then(change_type);
                write.record = record;
            }
            None => {
                self.index.insert(key, self.writes.len());
                self.writes.push(PendingWrite {
                    table: table.to_string(),
                    record,
                    change_type,
                });
            }
        }
        Ok(())
    }

    /// Gets the buffered record for `id`, if any.
    #[must_use]
    pub fn get_pending(&self, table: &str, id: &str) -> Option<&Record> {
        self.index
            .get(&(table.to_string(), id.to_string()))
            .map(|&slot| &self.writes[slot].record)
    }

    /// Returns the buffered records of `table` in write order.
    pub fn pending_in<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.writes
            .iter()
            .filter(move |w| w.table == table)
            .map(|w| &w.record)
    }

    /// Returns all pending writes in write order.
    pub fn pending_writes(&self) -> impl Iterator<Item = &PendingWrite> {
        self.writes.iter()
    }

    /// Returns the number of pending writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Groups the pending writes by table and change type, in order of
    /// first appearance.
    #[must_use]
    pub fn changes(&self) -> Vec<CollectionChange> {
        let mut changes: Vec<CollectionChange> = Vec::new();
        for write in &self.writes {
            let id = ItemId::new(write.record.id());
            match changes
                .iter_mut()
                .find(|c| c.collection == write.table && c.change_type == write.change_type)
            {
                Some(change) => change.ids.push(id),
                None => changes.push(CollectionChange {
                    collection: write.table.clone(),
                    change_type: write.change_type,
                    ids: vec![id],
                }),
            }
        }
        changes
    }

    /// Drains the buffer into a backend batch.
    pub(crate) fn take_batch(&mut self) -> WriteBatch {
        self.index.clear();
        std::mem::take(&mut self.writes)
            .into_iter()
            .map(|w| WriteOp::upsert(w.table, w.record))
            .collect()
    }

    /// Marks the transaction as committed.
    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
    }

    /// Marks the transaction as aborted and discards its writes.
    pub(crate) fn mark_aborted(&mut self) {
        self.state = TransactionState::Aborted;
        self.writes.clear();
        self.index.clear();
    }

    /// Ensures the transaction is active.
    pub(crate) fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }
}

/// A write transaction holding the manager's write lock.
///
/// The lock is released when this value is dropped, whether or not the
/// transaction was committed.
pub struct WriteTransaction<'a> {
    txn: Transaction,
    writer: &'a Mutex<Option<ThreadId>>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(
        txn: Transaction,
        writer: &'a Mutex<Option<ThreadId>>,
        guard: MutexGuard<'a, ()>,
    ) -> Self {
        Self {
            txn,
            writer,
            _guard: guard,
        }
    }

    /// Returns the inner transaction.
    pub fn inner_mut(&mut self) -> &mut Transaction {
        &mut self.txn
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        // Runs before the guard field is dropped.
        *self.writer.lock() = None;
    }
}

impl Deref for WriteTransaction<'_> {
    type Target = Transaction;

    fn deref(&self) -> &Transaction {
        &self.txn
    }
}

impl DerefMut for WriteTransaction<'_> {
    fn deref_mut(&mut self) -> &mut Transaction {
        &mut self.txn
    }
}

impl std::fmt::Debug for WriteTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransaction")
            .field("txn", &self.txn)
            .finish_non_exhaustive()
    }
}
