//! # notedb Testkit
//!
//! Test utilities for notedb.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Failure-injecting backend and blob store
//! - Sample note markup
//! - Property-based test generators using proptest
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust
//! use notedb_testkit::prelude::*;
//! use notedb_core::ItemDraft;
//!
//! with_temp_db(|db| {
//!     db.tags().add(ItemDraft::titled("work")).unwrap();
//!     assert_eq!(db.tags().all().count().unwrap(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod markup;
pub mod trace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::markup::*;
    pub use crate::trace::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
pub use markup::*;
pub use trace::*;
