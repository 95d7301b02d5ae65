//! Fault-tolerant extraction of product records from HTML pages.
//!
//! Pages are parsed into an [`HtmlDocument`], each record field is located by
//! an ordered list of selector [`Strategy`] values, and the raw text is run
//! through the [`normalize`] functions. A field that cannot be found or parsed
//! falls back to its default and is reported in [`Extraction::field_errors`];
//! it never prevents the other fields from being extracted.
//!
//! ```
//! use rig_scrape_extract::prelude::*;
//!
//! let html = r#"<span id="productTitle"> Desk Lamp </span>
//!               <span id="acrCustomerReviewText">1,234 ratings</span>"#;
//! let extraction = ExtractionPipeline::new().run_html(html)?;
//!
//! assert_eq!(extraction.record.title(), "Desk Lamp");
//! assert_eq!(extraction.record.review_count(), Some(1234));
//! assert!(extraction.field_errors.contains_key(&Field::Price));
//! # Ok::<(), DocumentError>(())
//! ```

pub mod document;
pub mod error;
pub mod field;
pub mod normalize;
pub mod pipeline;
pub mod record;

pub use document::HtmlDocument;
pub use error::{DocumentError, FieldError, SelectorError};
pub use field::{extract, extract_all, extract_first, FieldOutcome, Strategy};
pub use pipeline::{Extraction, ExtractionPipeline, Field, FieldErrors, FieldSelectors};
pub use record::{ProductFields, ProductRecord};

/// Common imports for extraction callers.
pub mod prelude {
    pub use crate::document::HtmlDocument;
    pub use crate::error::{DocumentError, FieldError};
    pub use crate::normalize::NOT_AVAILABLE;
    pub use crate::pipeline::{Extraction, ExtractionPipeline, Field, FieldSelectors};
    pub use crate::record::ProductRecord;
}
