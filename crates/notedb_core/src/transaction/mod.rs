//! Transactions over the storage backend.
//!
//! A transaction buffers record writes. On commit the buffer is applied to
//! the backend as one atomic batch and one aggregated change event is
//! published; on abort, or when the backend rejects the batch, nothing is
//! applied and nothing is published.
//!
//! - **Atomicity**: all buffered writes become visible or none do
//! - **Single writer**: one write transaction at a time, held from begin
//!   to commit or abort
//! - **Ordering**: events are published in commit order

mod manager;
mod state;

pub use manager::TransactionManager;
pub use state::{PendingWrite, Transaction, TransactionState, WriteTransaction};
