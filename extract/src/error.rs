//! Error types for document parsing and per-field extraction.

use serde::Serialize;
use thiserror::Error;

/// Fatal errors raised when markup cannot be turned into a navigable document.
///
/// These are the only failures that abort an extraction; everything that goes
/// wrong inside a single field is reported as a [`FieldError`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The input was empty or whitespace only.
    #[error("document is empty")]
    Empty,

    /// The input contains no element tags at all.
    #[error("document contains no markup (first bytes: {preview:?})")]
    NotMarkup {
        /// Leading characters of the rejected input, for diagnostics.
        preview: String,
    },
}

/// A selector that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid selector `{selector}`: {message}")]
pub struct SelectorError {
    /// The selector source text.
    pub selector: String,
    /// Parser message.
    pub message: String,
}

/// Recoverable diagnostic for a single record field.
///
/// The pipeline records one of these per field that fell back to its default,
/// so callers can tell an absent field from one that was present but garbled.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    /// No strategy matched any node with text.
    #[error("no selector matched ({tried} tried)")]
    Missing {
        /// Number of strategies attempted.
        tried: usize,
        /// Strategies that failed to compile along the way.
        selector_errors: Vec<SelectorError>,
    },

    /// A node matched but its text could not be normalized.
    #[error("could not parse {raw:?} as {expected}")]
    Unparsable {
        /// The matched text.
        raw: String,
        /// What the normalizer was looking for (e.g. "price").
        expected: &'static str,
    },
}
