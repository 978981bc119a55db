//! Change feed for observing committed transactions.
//!
//! Every commit that wrote something produces exactly one [`ChangeEvent`]
//! listing the affected ids grouped by collection and change type. Events
//! are emitted while the writer still holds the write lock, so subscribers
//! see them in commit order.
//!
//! # Usage
//!
//! ```rust
//! use notedb_core::{ChangeType, Database, ItemDraft};
//!
//! let db = Database::open_in_memory().unwrap();
//! let receiver = db.subscribe();
//!
//! db.tags().add(ItemDraft::titled("work")).unwrap();
//!
//! let event = receiver.recv().unwrap();
//! assert_eq!(event.ids_for("tags", ChangeType::Insert).len(), 1);
//! ```

use crate::config::DEFAULT_CHANGE_HISTORY;
use crate::id::ItemId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

/// Type of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Record was inserted (no previous version existed).
    Insert,
    /// Record was updated (previous version existed).
    Update,
    /// Record was tombstoned.
    Delete,
}

impl ChangeType {
    /// Folds a later write to the same record into this one.
    ///
    /// A record inserted and then updated in one transaction is still an
    /// insert; otherwise the later write wins.
    #[must_use]
    pub const fn then(self, later: ChangeType) -> ChangeType {
        match (self, later) {
            (Self::Insert, Self::Update) => Self::Insert,
            (_, later) => later,
        }
    }
}

/// Ids of one collection that changed the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionChange {
    /// Table name.
    pub collection: String,
    /// Type of change.
    pub change_type: ChangeType,
    /// Affected ids, in write order.
    pub ids: Vec<ItemId>,
}

/// All changes of one committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Sequence number of the commit.
    pub sequence: u64,
    /// Changes grouped by collection and type, in order of first appearance.
    pub changes: Vec<CollectionChange>,
}

impl ChangeEvent {
    /// Creates an event.
    pub fn new(sequence: u64, changes: Vec<CollectionChange>) -> Self {
        Self { sequence, changes }
    }

    /// Returns the ids of `collection` that changed with `change_type`.
    pub fn ids_for(&self, collection: &str, change_type: ChangeType) -> Vec<&ItemId> {
        self.changes
            .iter()
            .filter(|c| c.collection == collection && c.change_type == change_type)
            .flat_map(|c| c.ids.iter())
            .collect()
    }

    /// Returns true if the event touches `collection`.
    pub fn touches(&self, collection: &str) -> bool {
        self.changes.iter().any(|c| c.collection == collection)
    }

    /// Returns the total number of changed records.
    pub fn len(&self) -> usize {
        self.changes.iter().map(|c| c.ids.len()).sum()
    }

    /// Returns true if no record changed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distributes committed changes to subscribers.
///
/// The change feed:
/// - Emits only committed transactions
/// - Preserves commit order
/// - Supports multiple subscribers
/// - Keeps a bounded history for catch-up polling
pub struct ChangeFeed {
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
    history: RwLock<Vec<ChangeEvent>>,
    max_history: usize,
}

impl ChangeFeed {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_CHANGE_HISTORY)
    }

    /// Creates a change feed with a specific history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Subscribes to the change feed.
    ///
    /// Returns a receiver for all future events. Dropping the receiver
    /// unsubscribes on the next emit.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all subscribers.
    ///
    /// Called by the transaction manager after a successful commit.
    pub fn emit(&self, event: ChangeEvent) {
        {
            let mut history = self.history.write();
            history.push(event.clone());
            if history.len() > self.max_history {
                let excess = history.len() - self.max_history;
                history.drain(0..excess);
            }
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns events with `sequence > cursor`, up to `limit`.
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<ChangeEvent> {
        let history = self.history.read();
        history
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns the latest sequence number in history.
    pub fn latest_sequence(&self) -> u64 {
        self.history.read().last().map(|e| e.sequence).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of events in history.
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .field("history", &self.history_len())
            .field("max_history", &self.max_history)
            .finish()
    }
}
