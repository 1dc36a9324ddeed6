//! Date normalization for OCR'd invoice dates.

use chrono::{Datelike, NaiveDate};

/// Known OCR misreadings of month abbreviations, applied before parsing.
const MONTH_FIXES: &[(&str, &str)] = &[("doc", "dec"), ("0ct", "oct"), ("sept", "sep")];

/// Earliest year accepted; anything older is a truncated OCR token.
const MIN_YEAR: i32 = 1900;

/// Formats tried in order; the first one that parses wins.
///
/// Two-digit years come first: `%Y` would otherwise accept "25" as year 25.
const DATE_TEMPLATES: &[&str] = &[
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d%b%y",
    "%d%b%Y",
];

/// Normalize a matched date token such as "26-02-2025", "26 Doc 24" or
/// "5/Sept/2024". Returns `None` when no template fits.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let mut token: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            '/' | '.' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    for (wrong, right) in MONTH_FIXES {
        token = token.replace(wrong, right);
    }

    DATE_TEMPLATES.iter().find_map(|template| {
        NaiveDate::parse_from_str(&token, template)
            .ok()
            .filter(|date| date.year() >= MIN_YEAR)
    })
}
