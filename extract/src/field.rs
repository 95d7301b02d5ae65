//! Ordered-fallback field extraction.
//!
//! A field is located by a list of [`Strategy`] values tried in priority order.
//! A strategy that fails to compile or matches nothing is a miss; the first
//! strategy that yields text wins. Alternate page layouts are handled by
//! listing their selectors after the preferred one.

use crate::document::HtmlDocument;
use crate::error::{FieldError, SelectorError};

/// One way of locating a field's text inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Text content of nodes matching a CSS selector.
    Text {
        /// CSS selector.
        css: String,
    },
    /// Value of an attribute on nodes matching a CSS selector.
    Attr {
        /// CSS selector.
        css: String,
        /// Attribute name.
        attr: String,
    },
    /// A split amount rendered as separate whole and fraction nodes, joined
    /// with a decimal point.
    ///
    /// Trailing dots on the whole part are dropped before joining, and a
    /// missing fraction yields the whole part alone.
    Joined {
        /// Selector for the whole-number part.
        whole: String,
        /// Selector for the fractional part.
        fraction: String,
    },
}

impl Strategy {
    /// Text-content strategy.
    #[must_use]
    pub fn text(css: impl Into<String>) -> Self {
        Self::Text { css: css.into() }
    }

    /// Attribute strategy.
    #[must_use]
    pub fn attr(css: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::Attr {
            css: css.into(),
            attr: attr.into(),
        }
    }

    /// Whole + fraction strategy.
    #[must_use]
    pub fn joined(whole: impl Into<String>, fraction: impl Into<String>) -> Self {
        Self::Joined {
            whole: whole.into(),
            fraction: fraction.into(),
        }
    }

    /// Runs the strategy, returning every non-empty match in document order.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] if any selector of the strategy is invalid.
    pub fn evaluate(&self, doc: &HtmlDocument) -> Result<Vec<String>, SelectorError> {
        match self {
            Self::Text { css } => doc.select_text(css),
            Self::Attr { css, attr } => doc.select_attr(css, attr),
            Self::Joined { whole, fraction } => {
                let whole = doc.select_text(whole)?;
                let fraction = doc.select_text(fraction)?;
                let Some(whole) = whole.first() else {
                    return Ok(Vec::new());
                };
                let whole = whole.trim_end_matches('.').trim();
                if whole.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![fraction.first().map_or_else(
                    || whole.to_string(),
                    |fraction| format!("{whole}.{fraction}"),
                )])
            }
        }
    }
}

/// Result of running a field's strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    /// A strategy matched.
    Found(T),
    /// Every strategy missed.
    Missing {
        /// Number of strategies attempted.
        tried: usize,
        /// Strategies that failed to compile.
        selector_errors: Vec<SelectorError>,
    },
}

impl<T> FieldOutcome<T> {
    /// Returns the matched value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing { .. } => None,
        }
    }

    /// Returns the matched value or `default`.
    pub fn or_default(self, default: T) -> T {
        self.found().unwrap_or(default)
    }

    /// Converts a miss into a [`FieldError::Missing`] diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Missing`] when no strategy matched.
    pub fn into_result(self) -> Result<T, FieldError> {
        match self {
            Self::Found(value) => Ok(value),
            Self::Missing {
                tried,
                selector_errors,
            } => Err(FieldError::Missing {
                tried,
                selector_errors,
            }),
        }
    }
}

/// Returns the first match of the first strategy that matches anything.
pub fn extract_first(doc: &HtmlDocument, strategies: &[Strategy]) -> FieldOutcome<String> {
    first_hit(doc, strategies, |matches| matches.into_iter().next())
}

/// Returns every match of the first strategy that matches anything.
///
/// Used for list-valued fields; the order of the matches is document order.
pub fn extract_all(doc: &HtmlDocument, strategies: &[Strategy]) -> FieldOutcome<Vec<String>> {
    first_hit(doc, strategies, |matches| {
        (!matches.is_empty()).then_some(matches)
    })
}

/// Runs `strategies` and returns the first match, or `default` when all miss.
#[must_use]
pub fn extract(doc: &HtmlDocument, strategies: &[Strategy], default: &str) -> String {
    extract_first(doc, strategies).or_default(default.to_string())
}

fn first_hit<T>(
    doc: &HtmlDocument,
    strategies: &[Strategy],
    pick: impl Fn(Vec<String>) -> Option<T>,
) -> FieldOutcome<T> {
    let mut selector_errors = Vec::new();

    for (index, strategy) in strategies.iter().enumerate() {
        match strategy.evaluate(doc) {
            Ok(matches) => {
                if let Some(value) = pick(matches) {
                    tracing::trace!(event = "strategy_matched", strategy = index, "strategy_matched");
                    return FieldOutcome::Found(value);
                }
            }
            Err(e) => {
                tracing::debug!(
                    event = "selector_invalid",
                    strategy = index,
                    selector = %e.selector,
                    error = %e.message,
                    "selector_invalid"
                );
                selector_errors.push(e);
            }
        }
    }

    FieldOutcome::Missing {
        tried: strategies.len(),
        selector_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(markup: &str) -> HtmlDocument {
        HtmlDocument::parse(markup).unwrap()
    }

    #[test]
    fn test_first_matching_strategy_wins() {
        let d = doc(r#"<p class="a">first</p><p class="b">second</p>"#);
        let outcome = extract_first(&d, &[Strategy::text("p.b"), Strategy::text("p.a")]);
        assert_eq!(outcome, FieldOutcome::Found("second".to_string()));
    }

    #[test]
    fn test_misses_fall_through_in_order() {
        let d = doc(r#"<p class="a">first</p>"#);
        let outcome = extract_first(
            &d,
            &[
                Strategy::text("#nope"),
                Strategy::attr("p.a", "title"),
                Strategy::text("p.a"),
            ],
        );
        assert_eq!(outcome.found().as_deref(), Some("first"));
    }

    #[test]
    fn test_invalid_selector_is_skipped_and_reported() {
        let d = doc(r#"<p class="a">first</p>"#);
        let outcome = extract_first(&d, &[Strategy::text("p[["), Strategy::text("p.a")]);
        assert_eq!(outcome.found().as_deref(), Some("first"));

        let missing = extract_first(&d, &[Strategy::text("p[["), Strategy::text("#x")]);
        match missing.into_result() {
            Err(FieldError::Missing {
                tried,
                selector_errors,
            }) => {
                assert_eq!(tried, 2);
                assert_eq!(selector_errors.len(), 1);
                assert_eq!(selector_errors[0].selector, "p[[");
            }
            other => panic!("expected missing, got {other:?}"),
        }
    }

    #[test]
    fn test_default_when_all_miss() {
        let d = doc("<div></div>");
        assert_eq!(extract(&d, &[Strategy::text("span")], "N/A"), "N/A");
        assert_eq!(extract(&d, &[], "N/A"), "N/A");
    }

    #[test]
    fn test_whitespace_only_node_is_a_miss() {
        let d = doc(r#"<span id="t">   </span><span class="t">ok</span>"#);
        let outcome = extract_first(&d, &[Strategy::text("#t"), Strategy::text(".t")]);
        assert_eq!(outcome.found().as_deref(), Some("ok"));
    }

    #[test]
    fn test_extract_all_keeps_order() {
        let d = doc("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let outcome = extract_all(&d, &[Strategy::text("li")]);
        assert_eq!(outcome.found().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_joined_strips_decimal_marker() {
        let d = doc(
            r#"<span class="w">1,049<span class="dec">.</span></span><span class="f">95</span>"#,
        );
        let outcome = extract_first(&d, &[Strategy::joined(".w", ".f")]);
        assert_eq!(outcome.found().as_deref(), Some("1,049.95"));
    }

    #[test]
    fn test_joined_without_fraction_uses_whole() {
        let d = doc(r#"<span class="w">12.</span>"#);
        let outcome = extract_first(&d, &[Strategy::joined(".w", ".f")]);
        assert_eq!(outcome.found().as_deref(), Some("12"));
    }

    #[test]
    fn test_joined_without_whole_is_a_miss() {
        let d = doc(r#"<span class="f">95</span><span class="o">$3.00</span>"#);
        let outcome = extract_first(&d, &[Strategy::joined(".w", ".f"), Strategy::text(".o")]);
        assert_eq!(outcome.found().as_deref(), Some("$3.00"));
    }
}
