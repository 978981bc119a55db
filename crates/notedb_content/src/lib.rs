//! # notedb Content
//!
//! The content model for note bodies.
//!
//! A body is HTML produced by a rich-text editor. This crate derives views
//! from it (plain text, markdown, title, headline, emptiness, search match)
//! and separates embedded binary attachments from the text by content
//! hash:
//!
//! - [`RichText::extract_attachments`] moves inline `data:` images into a
//!   [`notedb_storage::BlobStore`] and leaves `data-hash` placeholders
//! - [`RichText::insert_attachments`] resolves the placeholders back into
//!   inline data
//!
//! Parsing is a capability: a [`ContentModel`] holds an optional
//! [`MarkupEngine`]. [`HtmlEngine`], the built-in one, parses with html5ever.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attachment;
mod error;
mod model;

pub mod dataurl;
pub mod markdown;
pub mod markup;
pub mod text;

pub use attachment::{
    Attachment, ExtractionWarning, Extraction, ResolvedAttachment, SkipReason, ATTACHMENT_CLASS,
    DEFAULT_IMAGE_MIME,
};
pub use error::{ContentError, ContentResult};
pub use markdown::{Flavor, MarkdownConverter};
pub use markup::{Element, Fragment, HtmlEngine, MarkupEngine, Node};
pub use model::{ContentModel, ContentType, RichText};
