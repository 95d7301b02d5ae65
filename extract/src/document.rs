//! Parsed HTML documents and the selector queries run against them.

use scraper::{ElementRef, Html, Selector};

use crate::error::{DocumentError, SelectorError};

/// Number of characters echoed back when rejecting non-markup input.
const PREVIEW_CHARS: usize = 40;

/// A parsed, navigable HTML node tree.
///
/// Wraps a [`scraper::Html`] tree. The tree is not `Send`, so documents are
/// parsed and queried inside a single synchronous call and never held across
/// an `.await`.
pub struct HtmlDocument {
    html: Html,
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument")
            .field("recovered_errors", &self.html.errors.len())
            .finish_non_exhaustive()
    }
}

impl HtmlDocument {
    /// Parses markup into a document.
    ///
    /// The HTML parser recovers from any malformed input, so the only
    /// rejections are blank input and input with no element tags at all.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Empty`] for blank input and
    /// [`DocumentError::NotMarkup`] when no tag is present.
    pub fn parse(markup: &str) -> Result<Self, DocumentError> {
        if markup.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        if !contains_tag(markup) {
            return Err(DocumentError::NotMarkup {
                preview: markup.trim().chars().take(PREVIEW_CHARS).collect(),
            });
        }

        let html = Html::parse_document(markup);
        tracing::debug!(
            event = "document_parsed",
            bytes = markup.len(),
            recovered_errors = html.errors.len(),
            "document_parsed"
        );
        Ok(Self { html })
    }

    /// Returns the text content of every node matching `css`, in document order.
    ///
    /// Text is the concatenation of the node and all its descendants with outer
    /// whitespace trimmed. Nodes whose text is empty are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if `css` is not a valid selector.
    pub fn select_text(&self, css: &str) -> Result<Vec<String>, SelectorError> {
        let selector = compile(css)?;
        Ok(self
            .html
            .select(&selector)
            .map(node_text)
            .filter(|text| !text.is_empty())
            .collect())
    }

    /// Returns the trimmed value of `attr` on every node matching `css`.
    ///
    /// Nodes without the attribute, or with a blank value, are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if `css` is not a valid selector.
    pub fn select_attr(&self, css: &str, attr: &str) -> Result<Vec<String>, SelectorError> {
        let selector = compile(css)?;
        Ok(self
            .html
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect())
    }
}

fn compile(css: &str) -> Result<Selector, SelectorError> {
    Selector::parse(css).map_err(|e| SelectorError {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn node_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// True if the input holds at least one start or end tag.
fn contains_tag(markup: &str) -> bool {
    markup.as_bytes().windows(2).any(|pair| {
        pair[0] == b'<' && (pair[1].is_ascii_alphabetic() || pair[1] == b'/' || pair[1] == b'!')
    })
}
