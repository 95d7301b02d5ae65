//! Normalizers turning scraped text into typed values.
//!
//! Every function here is total: malformed input maps to `None`, never a panic.

/// Sentinel used for string fields that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Parses a currency amount such as `"$1,299.00"` or `"29.99"`.
///
/// Every character that is not an ASCII digit or a decimal point is dropped
/// before parsing, so currency symbols and thousands separators are ignored.
/// A split `"whole"` + `"fraction"` price must be joined with `.` first.
///
/// # Examples
///
/// ```
/// use rig_scrape_extract::normalize::parse_price;
///
/// assert_eq!(parse_price("1,299.00"), Some(1299.0));
/// assert_eq!(parse_price("N/A"), None);
/// ```
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    if text.trim() == NOT_AVAILABLE {
        return None;
    }
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Reads the leading decimal number of a phrase like `"4.5 out of 5 stars"`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let token = leading_token(text, |c| c.is_ascii_digit() || c == '.');
    if token.is_empty() {
        return None;
    }
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Reads the leading integer of a phrase like `"1,234 ratings"`.
///
/// Thousands separators inside the leading token are removed.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    let token = leading_token(text, |c| c.is_ascii_digit() || c == ',');
    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Percentage saved relative to `original`, rounded to the nearest integer
/// with halves going to the even neighbour.
///
/// Defined only when both amounts are known, `price` is non-negative and
/// `original` is strictly greater than `price`.
///
/// # Examples
///
/// ```
/// use rig_scrape_extract::normalize::compute_discount;
///
/// assert_eq!(compute_discount(Some(19.99), Some(29.99)), Some(33));
/// assert_eq!(compute_discount(Some(29.99), Some(19.99)), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute_discount(price: Option<f64>, original: Option<f64>) -> Option<u32> {
    let (price, original) = (price?, original?);
    if !price.is_finite() || !original.is_finite() || price < 0.0 || original <= price {
        return None;
    }
    let percent = ((original - price) / original * 100.0).round_ties_even();
    // 0 <= price < original bounds the ratio to (0, 100].
    Some(percent as u32)
}

fn leading_token(text: &str, accept: impl Fn(char) -> bool) -> &str {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|&(_, c)| !accept(c))
        .map_or(text.len(), |(index, _)| index);
    &text[..end]
}
