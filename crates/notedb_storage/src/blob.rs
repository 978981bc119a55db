//! Content-addressed blob storage for attachment bytes.

use crate::error::{StorageError, StorageResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Name of the hash function used for blob addresses.
pub const HASH_TYPE: &str = "sha256";

/// Encoding of the bytes handed to [`BlobStore::store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobEncoding {
    /// Raw bytes.
    Raw,
    /// ASCII base64 text (standard alphabet, padded).
    Base64,
}

/// Metadata returned when a blob is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    /// Content hash (lowercase hex).
    pub hash: String,
    /// Hash function name, see [`HASH_TYPE`].
    pub hash_type: String,
    /// Size of the decoded bytes.
    pub size: u64,
}

/// A content-addressed byte store.
///
/// # Invariants
///
/// - Identical bytes always produce the same hash
/// - Storing bytes that already exist does not create a second copy
pub trait BlobStore: Send + Sync {
    /// Stores `data` (interpreted according to `encoding`) and returns its
    /// address.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be decoded or the write fails.
    fn store(&self, data: &[u8], encoding: BlobEncoding) -> StorageResult<BlobMetadata>;

    /// Fetches the bytes stored under `hash`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails. A missing hash is `Ok(None)`.
    fn fetch(&self, hash: &str) -> StorageResult<Option<Vec<u8>>>;
}

/// Computes the content hash of `bytes`.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode(data: &[u8], encoding: BlobEncoding) -> StorageResult<Vec<u8>> {
    match encoding {
        BlobEncoding::Raw => Ok(data.to_vec()),
        BlobEncoding::Base64 => STANDARD
            .decode(data)
            .map_err(|err| StorageError::InvalidEncoding(err.to_string())),
    }
}

/// A blob store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if no blob is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for InMemoryBlobStore {
    fn store(&self, data: &[u8], encoding: BlobEncoding) -> StorageResult<BlobMetadata> {
        let bytes = decode(data, encoding)?;
        let hash = content_hash(&bytes);
        let size = bytes.len() as u64;

        self.blobs.write().entry(hash.clone()).or_insert(bytes);

        Ok(BlobMetadata {
            hash,
            hash_type: HASH_TYPE.to_string(),
            size,
        })
    }

    fn fetch(&self, hash: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(hash).cloned())
    }
}
