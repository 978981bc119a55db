//! The content model and its per-body view.

use crate::attachment::{self, Extraction, ResolvedAttachment};
use crate::error::ContentResult;
use crate::markdown::{Flavor, MarkdownConverter};
use crate::markup::{Fragment, HtmlEngine, MarkupEngine};
use crate::text;
use notedb_storage::BlobStore;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Kind of a stored content body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// HTML produced by the rich-text editor.
    #[default]
    Tiny,
}

impl ContentType {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives text views from rich-text bodies and moves attachments in and
/// out of them.
///
/// The markup engine is optional. Without one, plain text is empty and
/// attachment extraction and insertion leave the markup unchanged;
/// markdown conversion always works.
///
/// # Example
///
/// ```rust
/// use notedb_content::ContentModel;
///
/// let model = ContentModel::new();
/// let body = model.body("<p>Groceries. Milk and eggs</p>");
/// assert_eq!(body.to_plain_text(), "Groceries. Milk and eggs");
/// assert_eq!(body.to_headline(), "Groceries.");
/// assert!(body.search("EGGS"));
/// ```
#[derive(Clone)]
pub struct ContentModel {
    engine: Option<Arc<dyn MarkupEngine>>,
    markdown: MarkdownConverter,
}

impl Default for ContentModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentModel")
            .field("has_markup", &self.has_markup())
            .field("markdown", &self.markdown)
            .finish()
    }
}

impl ContentModel {
    /// Creates a model with the built-in [`HtmlEngine`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_engine(Some(Arc::new(HtmlEngine::new())))
    }

    /// Creates a model with the given engine, or none.
    #[must_use]
    pub fn with_engine(engine: Option<Arc<dyn MarkupEngine>>) -> Self {
        Self {
            engine,
            markdown: MarkdownConverter::new(Flavor::Original),
        }
    }

    /// Creates a model without a markup engine.
    #[must_use]
    pub fn without_markup() -> Self {
        Self::with_engine(None)
    }

    /// Returns true if a markup engine is installed.
    #[must_use]
    pub fn has_markup(&self) -> bool {
        self.engine.is_some()
    }

    /// Returns the markdown converter.
    #[must_use]
    pub const fn markdown(&self) -> &MarkdownConverter {
        &self.markdown
    }

    /// Returns a view over one body.
    #[must_use]
    pub fn body<'a>(&'a self, data: &'a str) -> RichText<'a> {
        RichText {
            model: self,
            data,
            text: OnceCell::new(),
        }
    }

    fn parse(&self, data: &str) -> Option<Fragment> {
        self.engine.as_ref().map(|engine| engine.parse(data))
    }
}

/// A view over one rich-text body.
///
/// Plain text is computed once and reused by the title, headline, emptiness
/// and search views.
pub struct RichText<'a> {
    model: &'a ContentModel,
    data: &'a str,
    text: OnceCell<String>,
}

impl fmt::Debug for RichText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichText")
            .field("len", &self.data.len())
            .field("text_cached", &self.text.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> RichText<'a> {
    /// Returns the markup unchanged.
    #[must_use]
    pub fn to_html(&self) -> &'a str {
        self.data
    }

    /// Returns the trimmed text content, or `""` without a markup engine.
    #[must_use]
    pub fn to_plain_text(&self) -> &str {
        self.text.get_or_init(|| match self.model.parse(self.data) {
            Some(fragment) => fragment.text_content().trim().to_string(),
            None => String::new(),
        })
    }

    /// Converts the markup to markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        self.model.markdown.convert(self.data)
    }

    /// Derives a title, see [`text::title_from_text`].
    #[must_use]
    pub fn to_title(&self) -> String {
        text::title_from_text(self.to_plain_text())
    }

    /// Derives a headline, see [`text::headline_from_text`].
    #[must_use]
    pub fn to_headline(&self) -> &str {
        text::headline_from_text(self.to_plain_text())
    }

    /// Returns true if the plain text is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_plain_text().trim().is_empty()
    }

    /// Returns true if any word of `query` occurs in the plain text.
    #[must_use]
    pub fn search(&self, query: &str) -> bool {
        text::matches_query(self.to_plain_text(), query)
    }

    /// Moves inline attachment data into `store`.
    ///
    /// Without a markup engine the markup is returned unchanged with no
    /// attachments.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store fails. Undecodable embeds are
    /// reported in [`Extraction::warnings`] instead.
    pub fn extract_attachments(&self, store: &dyn BlobStore) -> ContentResult<Extraction> {
        let Some(mut fragment) = self.model.parse(self.data) else {
            return Ok(Extraction {
                data: self.data.to_string(),
                ..Extraction::default()
            });
        };
        let extracted = attachment::extract(&mut fragment, store)?;
        let data = if extracted.rewritten {
            fragment.inner_html()
        } else {
            self.data.to_string()
        };
        Ok(Extraction {
            data,
            attachments: extracted.attachments,
            warnings: extracted.warnings,
        })
    }

    /// Restores inline data for hashed images using `get`.
    ///
    /// Images `get` cannot resolve keep their placeholder. Without a markup
    /// engine the markup is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `get`.
    pub fn insert_attachments<F>(&self, get: F) -> ContentResult<String>
    where
        F: FnMut(&str) -> ContentResult<Option<ResolvedAttachment>>,
    {
        let Some(mut fragment) = self.model.parse(self.data) else {
            return Ok(self.data.to_string());
        };
        if attachment::insert(&mut fragment, get)? == 0 {
            return Ok(self.data.to_string());
        }
        Ok(fragment.inner_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notedb_storage::InMemoryBlobStore;
    use std::collections::HashMap;

    #[test]
    fn plain_text_is_trimmed_text_content() {
        let model = ContentModel::new();
        assert_eq!(model.body("  <p> Hi <b>there</b> </p>\n").to_plain_text(), "Hi there");
        assert_eq!(model.body("").to_plain_text(), "");
        assert!(model.body("<p>&nbsp;</p>").is_empty());
    }

    #[test]
    fn title_and_headline_use_plain_text() {
        let model = ContentModel::new();
        let body = model.body("<p>Shopping list for the weekend</p><p>eggs</p>");
        assert_eq!(body.to_title(), "Shopping list for the ");
        assert_eq!(body.to_headline(), "Shopping list for the weekendeggs");

        let body = model.body("<p>Plan</p>\n<p>Details</p>");
        assert_eq!(body.to_headline(), "Plan");
    }

    #[test]
    fn without_engine_text_views_degrade() {
        let model = ContentModel::without_markup();
        let body = model.body("<p>Hello <b>world</b></p>");

        assert_eq!(body.to_plain_text(), "");
        assert!(body.is_empty());
        assert!(!body.search("hello"));
        assert_eq!(body.to_html(), "<p>Hello <b>world</b></p>");
        assert_eq!(body.to_markdown(), "Hello **world**");

        let store = InMemoryBlobStore::new();
        let extraction = body.extract_attachments(&store).unwrap();
        assert_eq!(extraction.data, body.to_html());
        assert!(extraction.attachments.is_empty());
        assert_eq!(body.insert_attachments(|_| Ok(None)).unwrap(), body.to_html());
    }

    #[test]
    fn search_is_case_insensitive_token_match() {
        let model = ContentModel::new();
        assert!(model.body("<p>my todo list</p>").search("urgent TODO"));
        assert!(!model.body("<p>groceries</p>").search("urgent TODO"));
    }

    #[test]
    fn attachments_round_trip_through_the_store() {
        let model = ContentModel::new();
        let store = InMemoryBlobStore::new();
        let original = r#"<p>pic</p><img src="data:image/png;base64,iVBORw0KGgo=">"#;

        let extraction = model.body(original).extract_attachments(&store).unwrap();
        assert!(extraction.is_complete());
        assert!(!extraction.data.contains("base64"));
        let mimes: HashMap<_, _> = extraction
            .attachments
            .iter()
            .map(|a| (a.hash.clone(), a.mime.clone().unwrap_or_default()))
            .collect();

        let restored = model
            .body(&extraction.data)
            .insert_attachments(|hash| {
                Ok(store.fetch(hash)?.map(|data| ResolvedAttachment {
                    data,
                    mime: mimes[hash].clone(),
                }))
            })
            .unwrap();
        assert!(restored.contains(r#"src="data:image/png;base64,iVBORw0KGgo=""#));

        let again = model.body(&extraction.data).extract_attachments(&store).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(again.data, extraction.data);
        assert_eq!(again.hashes(), extraction.hashes());
    }

    #[test]
    fn markup_without_attachments_is_preserved_byte_for_byte() {
        let model = ContentModel::new();
        let store = InMemoryBlobStore::new();
        let html = concat!(
            "<p>Caf&eacute; cr&egrave;me &amp; th&eacute; caf&eacute x</p>\n",
            "<ul><li>a<br>b</li><li>c</ul>",
            r#"<p><a href="/q?a=1&amp;b=2" title='single'>link</a><img src="https://example.com/a.png"></p>"#,
        );
        let body = model.body(html);

        let extraction = body.extract_attachments(&store).unwrap();
        assert_eq!(extraction.data, html);
        assert!(store.is_empty());
        assert_eq!(body.insert_attachments(|_| Ok(None)).unwrap(), html);
        assert!(body.search("CAFÉ"));
        assert!(body.to_plain_text().starts_with("Café crème & thé café x"));
    }

    #[test]
    fn content_type_serializes_lowercase() {
        assert_eq!(ContentType::Tiny.to_string(), "tiny");
        assert_eq!(ContentType::default(), ContentType::Tiny);
    }
}
