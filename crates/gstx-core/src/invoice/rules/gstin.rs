//! GSTIN (GST Identification Number) normalization and shape checks.

use super::patterns::GSTIN_SHAPE;

/// Upper-case a recovered GSTIN and drop interior whitespace.
pub fn normalize_gstin(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Check the 15-character GSTIN shape: 2-digit state code, PAN-like body
/// (5 letters, 4 digits, 1 letter), entity digit, `Z`, check digit.
///
/// Only the shape is checked; the check digit itself is not verified.
pub fn validate_gstin_format(gstin: &str) -> bool {
    GSTIN_SHAPE.is_match(gstin)
}
