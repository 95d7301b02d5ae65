//! Building blocks of the `rig-scrape-provider` binary.

pub mod errors;

use std::path::Path;

use rig_scrape_extract::{Extraction, ExtractionPipeline};

use crate::errors::ProviderError;

/// System preamble for `ask`: how the model should use the product tools.
pub const ASK_PREAMBLE: &str = "You extract product data from web pages. \
To answer, call fetch_page with the product URL, then call extract_info. \
Report only what extract_info returned; fields listed in field_errors are unknown.";

/// Extracts a product record from a saved HTML page.
pub fn extract_file(path: &Path) -> Result<Extraction, ProviderError> {
    let markup = std::fs::read_to_string(path)?;
    let extraction = ExtractionPipeline::new().run_html(&markup)?;
    tracing::info!(
        event = "file_extracted",
        path = %path.display(),
        defaulted_fields = extraction.field_errors.len(),
        "file_extracted"
    );
    Ok(extraction)
}

/// Renders an extraction as JSON.
pub fn render_extraction(extraction: &Extraction, pretty: bool) -> Result<String, ProviderError> {
    let json = if pretty {
        serde_json::to_string_pretty(extraction)?
    } else {
        serde_json::to_string(extraction)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extract_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<html><body><span id="productTitle">Desk Lamp</span></body></html>"#
        )
        .unwrap();

        let extraction = extract_file(file.path()).unwrap();
        assert_eq!(extraction.record.title(), "Desk Lamp");

        let compact = render_extraction(&extraction, false).unwrap();
        assert!(!compact.contains('\n'));
        let pretty = render_extraction(&extraction, true).unwrap();
        assert!(pretty.contains("\n  \"record\""));
    }

    #[test]
    fn test_extract_file_errors() {
        let missing = extract_file(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(missing, ProviderError::Io(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "502 Bad Gateway").unwrap();
        let not_markup = extract_file(file.path()).unwrap_err();
        assert!(matches!(not_markup, ProviderError::Document(_)));
    }
}
