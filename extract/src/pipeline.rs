//! Composes per-field extraction into a [`ProductRecord`].
//!
//! Each field is resolved independently from its own strategy list. A field
//! that is missing or unparsable falls back to its default and leaves a
//! [`FieldError`] behind; the other fields are unaffected. Only a
//! document-level [`DocumentError`] aborts a run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::document::HtmlDocument;
use crate::error::{DocumentError, FieldError};
use crate::field::{extract_all, extract_first, FieldOutcome, Strategy};
use crate::normalize::{parse_count, parse_price, parse_rating, NOT_AVAILABLE};
use crate::record::{ProductFields, ProductRecord};

/// Identifies a directly extracted field of [`ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// `title`
    Title,
    /// `price`
    Price,
    /// `original_price`
    OriginalPrice,
    /// `rating_stars`
    RatingStars,
    /// `review_count`
    ReviewCount,
    /// `features`
    Features,
    /// `availability`
    Availability,
}

impl Field {
    /// The serialized field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::OriginalPrice => "original_price",
            Self::RatingStars => "rating_stars",
            Self::ReviewCount => "review_count",
            Self::Features => "features",
            Self::Availability => "availability",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field diagnostics, ordered by field.
pub type FieldErrors = BTreeMap<Field, FieldError>;

/// Strategy lists for every extracted field.
///
/// The default table targets the product page layout (`#productTitle`,
/// split `a-price-whole` / `a-price-fraction` prices, and so on), with
/// alternate layouts listed after the preferred selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelectors {
    /// Strategies for `title`.
    pub title: Vec<Strategy>,
    /// Strategies for `price`.
    pub price: Vec<Strategy>,
    /// Strategies for `original_price`.
    pub original_price: Vec<Strategy>,
    /// Strategies for `rating_stars`.
    pub rating_stars: Vec<Strategy>,
    /// Strategies for `review_count`.
    pub review_count: Vec<Strategy>,
    /// Strategies for `features`; every match of the winning strategy is kept.
    pub features: Vec<Strategy>,
    /// Strategies for `availability`.
    pub availability: Vec<Strategy>,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            title: vec![
                Strategy::text("#productTitle"),
                Strategy::text("#title"),
                Strategy::attr(r#"meta[name="title"]"#, "content"),
            ],
            price: vec![
                Strategy::joined("span.a-price-whole", "span.a-price-fraction"),
                Strategy::text("span.a-price:not(.a-text-price) span.a-offscreen"),
                Strategy::text("#priceblock_ourprice"),
                Strategy::text("#priceblock_dealprice"),
            ],
            original_price: vec![
                Strategy::text("span.a-price.a-text-price span.a-offscreen"),
                Strategy::text("span.basisPrice span.a-offscreen"),
                Strategy::text("#listPrice"),
            ],
            rating_stars: vec![
                Strategy::attr("#acrPopover", "title"),
                Strategy::text("#acrPopover span.a-icon-alt"),
                Strategy::text("i.a-icon-star span.a-icon-alt"),
            ],
            review_count: vec![Strategy::text("#acrCustomerReviewText")],
            features: vec![
                Strategy::text("#feature-bullets li span.a-list-item"),
                Strategy::text("#feature-bullets li"),
            ],
            availability: vec![
                Strategy::text("#availability span"),
                Strategy::text("#availability"),
            ],
        }
    }
}

/// A record plus the diagnostics of every field that fell back to its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    /// The extracted record.
    pub record: ProductRecord,
    /// Why each defaulted field was not filled.
    pub field_errors: FieldErrors,
}

/// Turns parsed documents into [`ProductRecord`]s.
///
/// The pipeline holds no per-call state; one instance can serve any number of
/// documents, including from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct ExtractionPipeline {
    selectors: FieldSelectors,
}

impl ExtractionPipeline {
    /// Creates a pipeline with the default selector table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipeline with a custom selector table.
    #[must_use]
    pub const fn with_selectors(selectors: FieldSelectors) -> Self {
        Self { selectors }
    }

    /// Returns the selector table in use.
    #[must_use]
    pub const fn selectors(&self) -> &FieldSelectors {
        &self.selectors
    }

    /// Parses `markup` and extracts a record from it.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] if the markup cannot be parsed at all.
    pub fn run_html(&self, markup: &str) -> Result<Extraction, DocumentError> {
        let doc = HtmlDocument::parse(markup)?;
        Ok(self.run(&doc))
    }

    /// Extracts a record from a parsed document.
    #[must_use]
    pub fn run(&self, doc: &HtmlDocument) -> Extraction {
        let s = &self.selectors;
        let mut errors = FieldErrors::new();

        let title = resolve(
            Field::Title,
            extract_first(doc, &s.title),
            |raw| Some(raw.to_string()),
            "text",
            &mut errors,
        );
        let price = resolve(
            Field::Price,
            extract_first(doc, &s.price),
            parse_price,
            "price",
            &mut errors,
        );
        let original_price = resolve(
            Field::OriginalPrice,
            extract_first(doc, &s.original_price),
            parse_price,
            "price",
            &mut errors,
        );
        let rating_stars = resolve(
            Field::RatingStars,
            extract_first(doc, &s.rating_stars),
            parse_rating,
            "rating",
            &mut errors,
        );
        let review_count = resolve(
            Field::ReviewCount,
            extract_first(doc, &s.review_count),
            parse_count,
            "count",
            &mut errors,
        );
        let features = extract_all(doc, &s.features)
            .into_result()
            .unwrap_or_else(|e| {
                errors.insert(Field::Features, e);
                Vec::new()
            });
        let availability = resolve(
            Field::Availability,
            extract_first(doc, &s.availability),
            |raw| Some(raw.to_string()),
            "text",
            &mut errors,
        );

        let record = ProductRecord::from(ProductFields {
            title: title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price,
            original_price,
            rating_stars,
            review_count,
            features,
            availability: availability.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        });

        tracing::debug!(
            event = "extraction_finished",
            defaulted_fields = errors.len(),
            has_price = record.price().is_some(),
            "extraction_finished"
        );

        Extraction {
            record,
            field_errors: errors,
        }
    }
}

fn resolve<T>(
    field: Field,
    outcome: FieldOutcome<String>,
    parse: impl Fn(&str) -> Option<T>,
    expected: &'static str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = match outcome.into_result() {
        Ok(raw) => raw,
        Err(e) => {
            errors.insert(field, e);
            return None;
        }
    };
    let parsed = parse(&raw);
    if parsed.is_none() {
        tracing::debug!(event = "field_unparsable", field = %field, raw = %raw, "field_unparsable");
        errors.insert(field, FieldError::Unparsable { raw, expected });
    }
    parsed
}
