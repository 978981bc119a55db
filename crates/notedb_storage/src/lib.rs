//! # notedb Storage
//!
//! Storage backend traits and the record model for notedb.
//!
//! This crate is the lowest layer of notedb. Backends store **records**
//! (JSON objects keyed by a string `id`) in named tables and answer
//! predicate queries. They know nothing about tombstones, titles or
//! relations; that policy lives in `notedb_core`.
//!
//! ## Design Principles
//!
//! - Backends are keyed record stores (get, exists, paged query, batch apply)
//! - A batch is applied atomically: all records become visible or none do
//! - Must be `Send + Sync` for concurrent access
//! - Binary attachment bytes go to a separate content-addressed [`BlobStore`]
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and ephemeral stores
//! - [`InMemoryBlobStore`] - SHA-256 addressed blob store kept in memory
//!
//! ## Example
//!
//! ```rust
//! use notedb_storage::{field, InMemoryBackend, Record, StorageBackend};
//! use serde_json::json;
//!
//! let backend = InMemoryBackend::new();
//! backend.init("tags").unwrap();
//!
//! let record = Record::from_value(json!({ "id": "t1", "title": "work", "deleted": false })).unwrap();
//! backend.upsert("tags", record).unwrap();
//!
//! let backend: &dyn StorageBackend = &backend;
//! let live: Vec<_> = backend
//!     .query_all("tags", field("deleted").is_false(), None)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(live.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod blob;
mod error;
mod memory;
mod query;
mod record;

pub use backend::{QueryIter, StorageBackend, WriteBatch, WriteOp};
pub use blob::{content_hash, BlobEncoding, BlobMetadata, BlobStore, InMemoryBlobStore, HASH_TYPE};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
pub use query::{and, field, not, or, CompareOp, Field, Predicate};
pub use record::Record;
