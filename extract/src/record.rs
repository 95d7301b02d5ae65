//! The typed product record produced by the extraction pipeline.

use serde::Serialize;

use crate::normalize::{compute_discount, NOT_AVAILABLE};

/// Base fields resolved directly from a document.
///
/// Converted into a [`ProductRecord`], which adds the derived discount.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    /// Product title, or [`NOT_AVAILABLE`].
    pub title: String,
    /// Current price.
    pub price: Option<f64>,
    /// List price before any discount.
    pub original_price: Option<f64>,
    /// Average star rating.
    pub rating_stars: Option<f64>,
    /// Number of customer reviews.
    pub review_count: Option<u64>,
    /// Feature bullet points, in page order.
    pub features: Vec<String>,
    /// Availability text, or [`NOT_AVAILABLE`].
    pub availability: String,
}

impl Default for ProductFields {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            price: None,
            original_price: None,
            rating_stars: None,
            review_count: None,
            features: Vec::new(),
            availability: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Structured product data extracted from one page.
///
/// Every key is always present when serialized: unknown strings hold
/// [`NOT_AVAILABLE`] and unknown numbers serialize as `null`.
/// `discount_percent` is computed from the prices at construction and cannot
/// be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    title: String,
    price: Option<f64>,
    original_price: Option<f64>,
    discount_percent: Option<u32>,
    rating_stars: Option<f64>,
    review_count: Option<u64>,
    features: Vec<String>,
    availability: String,
}

impl From<ProductFields> for ProductRecord {
    fn from(fields: ProductFields) -> Self {
        Self {
            discount_percent: compute_discount(fields.price, fields.original_price),
            title: fields.title,
            price: fields.price,
            original_price: fields.original_price,
            rating_stars: fields.rating_stars,
            review_count: fields.review_count,
            features: fields.features,
            availability: fields.availability,
        }
    }
}

impl Default for ProductRecord {
    fn default() -> Self {
        ProductFields::default().into()
    }
}

impl ProductRecord {
    /// Product title, or [`NOT_AVAILABLE`].
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current price.
    #[must_use]
    pub const fn price(&self) -> Option<f64> {
        self.price
    }

    /// List price before any discount.
    #[must_use]
    pub const fn original_price(&self) -> Option<f64> {
        self.original_price
    }

    /// Whole-percent saving of `price` against `original_price`.
    #[must_use]
    pub const fn discount_percent(&self) -> Option<u32> {
        self.discount_percent
    }

    /// Average star rating.
    #[must_use]
    pub const fn rating_stars(&self) -> Option<f64> {
        self.rating_stars
    }

    /// Number of customer reviews.
    #[must_use]
    pub const fn review_count(&self) -> Option<u64> {
        self.review_count
    }

    /// Feature bullet points, in page order.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Availability text, or [`NOT_AVAILABLE`].
    #[must_use]
    pub fn availability(&self) -> &str {
        &self.availability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_is_derived_from_prices() {
        let record = ProductRecord::from(ProductFields {
            price: Some(19.99),
            original_price: Some(29.99),
            ..ProductFields::default()
        });
        assert_eq!(record.discount_percent(), Some(33));

        let no_sale = ProductRecord::from(ProductFields {
            price: Some(29.99),
            original_price: Some(19.99),
            ..ProductFields::default()
        });
        assert_eq!(no_sale.discount_percent(), None);
    }

    #[test]
    fn test_unknown_record_serializes_every_key() {
        let value = serde_json::to_value(ProductRecord::default()).unwrap();
        let object = value.as_object().unwrap();

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        for key in [
            "title",
            "price",
            "original_price",
            "discount_percent",
            "rating_stars",
            "review_count",
            "features",
            "availability",
        ] {
            assert!(keys.contains(&key), "missing key {key}");
        }
        assert_eq!(object["title"], "N/A");
        assert!(object["price"].is_null());
        assert!(object["discount_percent"].is_null());
        assert_eq!(object["features"], serde_json::json!([]));
    }
}
