//! Transaction manager.

use crate::change_feed::{ChangeEvent, ChangeFeed};
use crate::error::{CoreError, CoreResult};
use crate::transaction::state::{Transaction, WriteTransaction};
use crate::types::{SequenceNumber, TransactionId};
use notedb_storage::StorageBackend;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};

/// Coordinates write transactions against one backend.
///
/// The transaction manager provides:
/// - Single-writer concurrency control via `begin_write()`
/// - All-or-nothing commits through [`StorageBackend::apply`]
/// - Commit ordering via sequence numbers
/// - One [`ChangeEvent`] per commit that wrote something
///
/// ## Single-Writer Guarantee
///
/// Only one write transaction can be active at a time. `begin_write()`
/// acquires an exclusive lock that is held for the transaction's lifetime.
/// Beginning a second write transaction on the same thread is rejected
/// instead of deadlocking; compose steps with the `*_in_txn` methods.
pub struct TransactionManager {
    backend: Arc<dyn StorageBackend>,
    feed: Arc<ChangeFeed>,
    next_txid: AtomicU64,
    next_seq: AtomicU64,
    committed_seq: AtomicU64,
    write_lock: Mutex<()>,
    /// Thread currently holding `write_lock`.
    writer: Mutex<Option<ThreadId>>,
}

impl TransactionManager {
    /// Creates a new transaction manager.
    pub fn new(backend: Arc<dyn StorageBackend>, feed: Arc<ChangeFeed>) -> Self {
        Self {
            backend,
            feed,
            next_txid: AtomicU64::new(1),
            next_seq: AtomicU64::new(1),
            committed_seq: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            writer: Mutex::new(None),
        }
    }

    /// Begins a new write transaction with the exclusive write lock.
    ///
    /// Blocks while another thread holds a write transaction. The lock is
    /// released when the returned value is dropped.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut wtx = tm.begin_write()?;
    /// wtx.put("tags", record, ChangeType::Insert)?;
    /// tm.commit_write(&mut wtx)?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the calling thread already holds a
    /// write transaction.
    pub fn begin_write(&self) -> CoreResult<WriteTransaction<'_>> {
        let current = thread::current().id();
        if *self.writer.lock() == Some(current) {
            return Err(CoreError::invalid_operation(
                "nested write transaction on the same thread",
            ));
        }

        let guard = self.write_lock.lock();
        *self.writer.lock() = Some(current);

        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        debug!(txn = %txid, "transaction started");
        Ok(WriteTransaction::new(Transaction::new(txid), &self.writer, guard))
    }

    /// Commits a write transaction.
    ///
    /// The buffered writes are applied in one batch and one change event is
    /// published before the write lock is released. A transaction without
    /// writes commits without touching the backend and publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the transaction is not active, or the
    /// backend error if the batch was rejected. The transaction is aborted
    /// in the latter case.
    pub fn commit_write(&self, wtxn: &mut WriteTransaction<'_>) -> CoreResult<SequenceNumber> {
        self.commit_inner(wtxn.inner_mut())
    }

    fn commit_inner(&self, txn: &mut Transaction) -> CoreResult<SequenceNumber> {
        txn.ensure_active()?;
        let txid = txn.id();

        if txn.is_empty() {
            txn.mark_committed();
            debug!(txn = %txid, "empty transaction committed");
            return Ok(self.committed_seq());
        }

        let changes = txn.changes();
        let batch = txn.take_batch();
        let writes = batch.len();
        if let Err(err) = self.backend.apply(batch) {
            txn.mark_aborted();
            warn!(txn = %txid, error = %err, "commit rejected by backend");
            return Err(err.into());
        }

        let sequence = SequenceNumber::new(self.next_seq.fetch_add(1, Ordering::SeqCst));
        self.committed_seq.store(sequence.as_u64(), Ordering::SeqCst);
        txn.mark_committed();

        self.feed.emit(ChangeEvent::new(sequence.as_u64(), changes));
        info!(txn = %txid, sequence = %sequence, writes, "transaction committed");
        Ok(sequence)
    }

    /// Aborts a write transaction, discarding its writes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the transaction is not active.
    pub fn abort_write(&self, wtxn: &mut WriteTransaction<'_>) -> CoreResult<()> {
        let txn = wtxn.inner_mut();
        txn.ensure_active()?;
        txn.mark_aborted();
        debug!(txn = %txn.id(), "transaction aborted");
        Ok(())
    }

    /// Runs `f` in a write transaction.
    ///
    /// Commits when `f` returns `Ok`. When `f` fails the transaction is
    /// aborted and the original error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, of the commit, or of `begin_write`.
    pub fn run<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction) -> CoreResult<T>,
    {
        let mut wtxn = self.begin_write()?;
        match f(wtxn.inner_mut()) {
            Ok(value) => {
                self.commit_write(&mut wtxn)?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.abort_write(&mut wtxn);
                Err(err)
            }
        }
    }

    /// Returns the sequence number of the last commit.
    #[must_use]
    pub fn committed_seq(&self) -> SequenceNumber {
        SequenceNumber::new(self.committed_seq.load(Ordering::SeqCst))
    }

    /// Returns the change feed events are published to.
    #[must_use]
    pub fn feed(&self) -> &Arc<ChangeFeed> {
        &self.feed
    }

    /// Returns the backend commits are applied to.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("committed_seq", &self.committed_seq())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::ChangeType;
    use notedb_storage::{InMemoryBackend, Record};
    use serde_json::json;
    use std::time::Duration;

    fn manager() -> (TransactionManager, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.init("tags").unwrap();
        let tm = TransactionManager::new(backend.clone(), Arc::new(ChangeFeed::new()));
        (tm, backend)
    }

    fn record(id: &str) -> Record {
        Record::from_value(json!({ "id": id })).unwrap()
    }

    #[test]
    fn commit_applies_and_publishes_once() {
        let (tm, backend) = manager();
        let rx = tm.feed().subscribe();

        tm.run(|txn| {
            txn.put("tags", record("a"), ChangeType::Insert)?;
            txn.put("tags", record("b"), ChangeType::Insert)
        })
        .unwrap();

        assert_eq!(backend.len("tags"), 2);
        assert_eq!(tm.committed_seq(), SequenceNumber::new(1));

        let event = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event.sequence, 1);
        assert_eq!(event.len(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn failing_step_applies_nothing() {
        let (tm, backend) = manager();
        let rx = tm.feed().subscribe();

        let result: CoreResult<()> = tm.run(|txn| {
            txn.put("tags", record("a"), ChangeType::Insert)?;
            Err(CoreError::validation("boom"))
        });

        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert!(backend.is_empty("tags"));
        assert!(rx.try_recv().is_err());
        assert_eq!(tm.committed_seq(), SequenceNumber::new(0));
    }

    #[test]
    fn backend_rejection_aborts() {
        let (tm, backend) = manager();
        let rx = tm.feed().subscribe();

        let result = tm.run(|txn| {
            txn.put("tags", record("a"), ChangeType::Insert)?;
            txn.put("unknown", record("b"), ChangeType::Insert)
        });

        assert!(matches!(result, Err(CoreError::Backend(_))));
        assert!(backend.is_empty("tags"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn empty_transaction_publishes_nothing() {
        let (tm, _backend) = manager();
        let rx = tm.feed().subscribe();

        tm.run(|_| Ok(())).unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(tm.committed_seq(), SequenceNumber::new(0));
    }

    #[test]
    fn explicit_begin_commit() {
        let (tm, backend) = manager();
        let mut wtxn = tm.begin_write().unwrap();
        wtxn.put("tags", record("a"), ChangeType::Insert).unwrap();
        let seq = tm.commit_write(&mut wtxn).unwrap();

        assert_eq!(seq.as_u64(), 1);
        assert_eq!(backend.len("tags"), 1);
        assert!(tm.commit_write(&mut wtxn).is_err());
    }

    #[test]
    fn explicit_abort_discards() {
        let (tm, backend) = manager();
        let mut wtxn = tm.begin_write().unwrap();
        wtxn.put("tags", record("a"), ChangeType::Insert).unwrap();
        tm.abort_write(&mut wtxn).unwrap();
        drop(wtxn);

        assert!(backend.is_empty("tags"));
        assert!(tm.begin_write().is_ok());
    }

    #[test]
    fn nested_write_on_same_thread_is_rejected() {
        let (tm, _backend) = manager();
        let result = tm.run(|_| tm.begin_write().map(|_| ()));
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn writers_are_serialized_and_sequences_increase() {
        let (tm, backend) = manager();
        let tm = Arc::new(tm);
        let rx = tm.feed().subscribe();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tm = Arc::clone(&tm);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        tm.run(|txn| txn.put("tags", record(&format!("{t}-{i}")), ChangeType::Insert))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(backend.len("tags"), 40);
        let sequences: Vec<u64> = rx.try_iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (1..=40).collect::<Vec<_>>());
    }
}
