//! Rule-based field extractors for GST invoices.

pub mod amounts;
pub mod dates;
pub mod gstin;
pub mod patterns;
pub mod table;
pub mod tax_lines;

use std::fmt;

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub use amounts::{
    checked_sum, format_amount, parse_amount, parse_rate, round_half_up, round_money,
};
pub use dates::normalize_date;
pub use gstin::{normalize_gstin, validate_gstin_format};
pub use table::RuleTable;
pub use tax_lines::TaxLineExtractor;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A matched value together with where it came from.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Label of the rule that produced it.
    pub rule: String,
    /// Byte span of the whole match in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            value,
            rule: rule.into(),
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Replace the value, keeping provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            rule: self.rule,
            position: self.position,
            source: self.source,
        }
    }
}

/// Single-valued record fields that have their own rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    InvoiceNo,
    Date,
    TotalAmount,
    TaxableValue,
    IgstAmount,
    CgstAmount,
    SgstAmount,
    IgstRate,
    CgstRate,
    SgstRate,
    CustomerGstin,
}

impl ScalarField {
    pub const ALL: [ScalarField; 11] = [
        ScalarField::InvoiceNo,
        ScalarField::Date,
        ScalarField::TotalAmount,
        ScalarField::TaxableValue,
        ScalarField::IgstAmount,
        ScalarField::CgstAmount,
        ScalarField::SgstAmount,
        ScalarField::IgstRate,
        ScalarField::CgstRate,
        ScalarField::SgstRate,
        ScalarField::CustomerGstin,
    ];

    /// Record field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarField::InvoiceNo => "invoice_no",
            ScalarField::Date => "date",
            ScalarField::TotalAmount => "total_amount",
            ScalarField::TaxableValue => "taxable_value",
            ScalarField::IgstAmount => "igst_amount",
            ScalarField::CgstAmount => "cgst_amount",
            ScalarField::SgstAmount => "sgst_amount",
            ScalarField::IgstRate => "igst_rate",
            ScalarField::CgstRate => "cgst_rate",
            ScalarField::SgstRate => "sgst_rate",
            ScalarField::CustomerGstin => "customer_gstin",
        }
    }
}

impl fmt::Display for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pattern alternative for a field.
#[derive(Debug, Clone)]
pub struct Rule {
    label: String,
    regex: Regex,
    /// Word that must not directly precede a match (`Total` inside `Sub Total`).
    not_after: Option<&'static str>,
}

impl Rule {
    pub fn new(label: impl Into<String>, regex: Regex) -> Self {
        Self {
            label: label.into(),
            regex,
            not_after: None,
        }
    }

    /// Compile a user-supplied pattern, case-insensitively.
    pub fn compile(label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self::new(label, regex))
    }

    pub fn not_after(mut self, word: &'static str) -> Self {
        self.not_after = Some(word);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Admissible captures, in text order.
    pub fn captures_iter<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = Captures<'t>> + 'r
    where
        't: 'r,
    {
        self.regex
            .captures_iter(text)
            .filter(move |caps| caps.get(0).is_some_and(|m| !self.is_excluded(text, m.start())))
    }

    /// First admissible match, valued by its first non-empty capture group.
    pub fn find<'t>(&self, text: &'t str) -> Option<ExtractionMatch<&'t str>> {
        let caps = self.captures_iter(text).next()?;
        let whole = caps.get(0)?;
        let value = (1..caps.len())
            .filter_map(|i| caps.get(i))
            .find(|m| !m.as_str().trim().is_empty())
            .unwrap_or(whole);

        Some(
            ExtractionMatch::new(value.as_str().trim(), self.label.as_str(), whole.as_str())
                .with_position(whole.start(), whole.end()),
        )
    }

    fn is_excluded(&self, text: &str, start: usize) -> bool {
        let Some(word) = self.not_after else {
            return false;
        };

        let before = text[..start].trim_end_matches(|c: char| c.is_whitespace() || c == '-');
        let Some(split) = before.len().checked_sub(word.len()) else {
            return false;
        };
        if !before.is_char_boundary(split) {
            return false;
        }
        let (head, tail) = before.split_at(split);
        tail.eq_ignore_ascii_case(word)
            && !head.chars().next_back().is_some_and(char::is_alphanumeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_group() {
        let rule = Rule::compile("alt", r"total\s*rs\.\s*(\d+)|grand\s*total\s*(\d+)").unwrap();
        let m = rule.find("Grand Total 1180").unwrap();
        assert_eq!(m.value, "1180");
        assert_eq!(m.rule, "alt");
        assert_eq!(m.position, Some((0, 16)));
    }

    #[test]
    fn test_not_after_skips_prefixed_match() {
        let rule = Rule::compile("total", r"\btotal\b\s*(\d+)").unwrap().not_after("sub");
        let m = rule.find("Sub Total 1000\nTotal 1180").unwrap();
        assert_eq!(m.value, "1180");

        let m = rule.find("Sub-Total 1000\nTotal 1180").unwrap();
        assert_eq!(m.value, "1180");

        // "club" is not "sub"
        let m = rule.find("Club Total 50").unwrap();
        assert_eq!(m.value, "50");
    }

    #[test]
    fn test_compile_is_case_insensitive() {
        let rule = Rule::compile("bill", r"bill\s*#\s*(\S+)").unwrap();
        assert_eq!(rule.find("BILL # A-17").unwrap().value, "A-17");
        assert!(Rule::compile("broken", r"(unclosed").is_err());
    }

    #[test]
    fn test_scalar_field_names() {
        assert_eq!(ScalarField::CustomerGstin.to_string(), "customer_gstin");
        let json = serde_json::to_string(&ScalarField::TaxableValue).unwrap();
        assert_eq!(json, "\"taxable_value\"");
    }
}
