//! # notedb Core
//!
//! Local-first store for notes, notebooks, tags and the relations between
//! them.
//!
//! This crate provides:
//! - Generic soft-delete collections over a pluggable [`StorageBackend`]
//! - A relation graph with typed, revivable edges
//! - Transactions that commit atomically and publish one change event
//! - The tag, notebook and note collections, with note bodies run through
//!   the [`notedb_content`] model
//!
//! ## Example
//!
//! ```rust
//! use notedb_core::{Database, ItemDraft};
//!
//! let db = Database::open_in_memory().unwrap();
//! let id = db.tags().add(ItemDraft::titled("work")).unwrap();
//! assert_eq!(db.tags().add(ItemDraft::titled("work")).unwrap(), id);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod collection;
mod config;
mod database;
mod entity;
mod error;
mod id;
mod items;
mod relations;
mod transaction;
mod types;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeType, CollectionChange};
pub use collection::{sanitize_title, Collection, FilteredView, ItemDraft, ViewIter};
pub use config::{Config, DEFAULT_CHANGE_HISTORY};
pub use database::Database;
pub use entity::{
    Entity, Item, ItemKind, ItemMeta, ItemReference, Note, NoteContent, Notebook, Relation, Tag,
    TitledItem,
};
pub use error::{CoreError, CoreResult};
pub use id::ItemId;
pub use items::{Grouping, NoteDraft, NotebookDraft, Notebooks, Notes, Tags};
pub use relations::Relations;
pub use transaction::{PendingWrite, Transaction, TransactionManager, TransactionState, WriteTransaction};
pub use types::{now_millis, SequenceNumber, Timestamp, TransactionId};

pub use notedb_storage::StorageBackend;
