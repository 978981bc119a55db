//! Attachment extraction and re-insertion.
//!
//! Inline `data:` images are moved out of the markup into a
//! content-addressed [`BlobStore`]; the element keeps only a `data-hash`
//! marker. Insertion is the inverse: hashed images get their `src` back as
//! a `data:` URL built from the resolved bytes.

use crate::dataurl;
use crate::error::{ContentError, ContentResult};
use crate::markup::{Element, Fragment};
use notedb_storage::{BlobEncoding, BlobStore, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Media type assumed for inline images that declare none.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Class marking non-image attachment elements.
pub const ATTACHMENT_CLASS: &str = "attachment";

/// An attachment reference kept alongside a note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Content hash of the bytes.
    pub hash: String,
    /// Declared media type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Original file name, if the editor recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Hash function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_type: Option<String>,
    /// Size of the bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Attachment {
    /// A bare reference to already stored bytes.
    pub fn reference(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            mime: None,
            filename: None,
            hash_type: None,
            size: None,
        }
    }

    /// Returns true if only the hash is known.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.mime.is_none() && self.filename.is_none() && self.size.is_none()
    }

    /// Fills missing fields from `other` (same hash).
    pub fn merge_from(&mut self, other: &Attachment) {
        if self.hash != other.hash {
            return;
        }
        self.mime = self.mime.take().or_else(|| other.mime.clone());
        self.filename = self.filename.take().or_else(|| other.filename.clone());
        self.hash_type = self.hash_type.take().or_else(|| other.hash_type.clone());
        self.size = self.size.or(other.size);
    }
}

/// Bytes returned by an attachment resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    /// Raw bytes.
    pub data: Vec<u8>,
    /// Media type used for the `data:` URL.
    pub mime: String,
}

/// Why an attachment element was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An image with neither `data-hash` nor `src`.
    MissingSource,
    /// An image whose `src` is not a `data:` URL.
    ExternalSource,
    /// A `data:` URL without payload.
    EmptyPayload,
    /// The payload could not be decoded.
    InvalidPayload(String),
    /// A non-image attachment element without `data-hash`.
    MissingHash,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource => f.write_str("no hash and no source"),
            Self::ExternalSource => f.write_str("source is not inline data"),
            Self::EmptyPayload => f.write_str("inline data is empty"),
            Self::InvalidPayload(reason) => write!(f, "inline data is invalid: {reason}"),
            Self::MissingHash => f.write_str("attachment element has no hash"),
        }
    }
}

/// A soft failure: one element could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    /// Tag name of the skipped element.
    pub element: String,
    /// What was wrong with it.
    pub reason: SkipReason,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped <{}>: {}", self.element, self.reason)
    }
}

/// Result of attachment extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Rewritten markup.
    pub data: String,
    /// One entry per attachment element, in document order.
    pub attachments: Vec<Attachment>,
    /// Elements that were skipped.
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    /// Returns true if every attachment element was handled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Hashes of all attachments, without duplicates.
    #[must_use]
    pub fn hashes(&self) -> Vec<&str> {
        let mut hashes: Vec<&str> = Vec::new();
        for attachment in &self.attachments {
            if !hashes.contains(&attachment.hash.as_str()) {
                hashes.push(&attachment.hash);
            }
        }
        hashes
    }
}

fn is_attachment_element(element: &Element) -> bool {
    element.name() == "img" || element.has_class(ATTACHMENT_CLASS)
}

enum Outcome {
    Found(Attachment),
    Skipped(SkipReason),
}

fn extract_image(element: &mut Element, store: &dyn BlobStore) -> ContentResult<Outcome> {
    if let Some(hash) = element.data("hash") {
        let attachment = Attachment::reference(hash);
        element.remove_attr("src");
        return Ok(Outcome::Found(attachment));
    }

    let Some(src) = element.attr("src").filter(|src| !src.trim().is_empty()) else {
        return Ok(Outcome::Skipped(SkipReason::MissingSource));
    };
    let Some(url) = dataurl::parse(src) else {
        return Ok(Outcome::Skipped(SkipReason::ExternalSource));
    };
    let payload = url.payload();
    if payload.is_empty() {
        return Ok(Outcome::Skipped(SkipReason::EmptyPayload));
    }

    let mime = element
        .data("mime")
        .or(url.mime)
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();
    let encoding = if url.base64 {
        BlobEncoding::Base64
    } else {
        BlobEncoding::Raw
    };

    let metadata = match store.store(&payload, encoding) {
        Ok(metadata) => metadata,
        Err(StorageError::InvalidEncoding(reason)) => {
            return Ok(Outcome::Skipped(SkipReason::InvalidPayload(reason)))
        }
        Err(err) => return Err(err.into()),
    };
    debug!(hash = %metadata.hash, size = metadata.size, mime = %mime, "stored inline attachment");

    element.set_data("hash", metadata.hash.clone());
    let filename = element.data("filename").map(str::to_string);
    element.remove_attr("src");

    Ok(Outcome::Found(Attachment {
        hash: metadata.hash,
        mime: Some(mime),
        filename,
        hash_type: Some(metadata.hash_type),
        size: Some(metadata.size),
    }))
}

/// What [`extract`] found in a fragment.
pub(crate) struct Extracted {
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) warnings: Vec<ExtractionWarning>,
    /// False if no element was modified.
    pub(crate) rewritten: bool,
}

/// Moves inline attachment data out of `fragment` into `store`.
///
/// The fragment is rewritten in place. Blob store failures other than
/// undecodable payloads abort the extraction.
pub(crate) fn extract(fragment: &mut Fragment, store: &dyn BlobStore) -> ContentResult<Extracted> {
    let mut attachments = Vec::new();
    let mut warnings = Vec::new();
    let mut rewritten = false;
    let mut failure: Option<ContentError> = None;

    fragment.for_each_element_mut(|element| {
        if failure.is_some() || !is_attachment_element(element) {
            return;
        }

        let outcome = if element.name() == "img" {
            let before = element.attrs().to_vec();
            match extract_image(element, store) {
                Ok(outcome) => {
                    rewritten |= element.attrs() != before.as_slice();
                    outcome
                }
                Err(err) => {
                    failure = Some(err);
                    return;
                }
            }
        } else {
            match element.data("hash") {
                Some(hash) => Outcome::Found(Attachment::reference(hash)),
                None => Outcome::Skipped(SkipReason::MissingHash),
            }
        };

        match outcome {
            Outcome::Found(attachment) => attachments.push(attachment),
            Outcome::Skipped(reason) => {
                warn!(element = element.name(), reason = %reason, "skipped attachment element");
                warnings.push(ExtractionWarning {
                    element: element.name().to_string(),
                    reason,
                });
            }
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(Extracted {
            attachments,
            warnings,
            rewritten,
        }),
    }
}

/// Restores `src` on hashed images using `get`.
///
/// Images whose hash cannot be resolved are left unchanged. Returns the
/// number of images that were resolved.
pub(crate) fn insert<F>(fragment: &mut Fragment, mut get: F) -> ContentResult<usize>
where
    F: FnMut(&str) -> ContentResult<Option<ResolvedAttachment>>,
{
    let mut resolved = 0;
    let mut failure: Option<ContentError> = None;

    fragment.for_each_element_mut(|element| {
        if failure.is_some() || element.name() != "img" {
            return;
        }
        let Some(hash) = element.data("hash").map(str::to_string) else {
            return;
        };

        match get(&hash) {
            Ok(Some(attachment)) => {
                element.set_attr("src", dataurl::format(&attachment.mime, &attachment.data));
                resolved += 1;
            }
            Ok(None) => warn!(hash = %hash, "attachment not found, leaving placeholder"),
            Err(err) => failure = Some(err),
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(resolved),
    }
}
