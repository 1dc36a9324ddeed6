//! Ordered extraction rules per field, selected by profile.

use std::collections::HashMap;

use regex::Regex;

use crate::error::ExtractionError;
use crate::models::config::RuleProfile;
use crate::models::record::TaxType;

use super::patterns::*;
use super::{Rule, ScalarField};

/// Ordered rule alternatives for every field.
///
/// For scalar fields, earlier rules win. Tax-line rules run in `TaxType::ALL`
/// order so that CGST spans are claimed before SGST look-alikes are considered.
#[derive(Debug, Clone)]
pub struct RuleTable {
    profile: RuleProfile,
    scalar: HashMap<ScalarField, Vec<Rule>>,
    custom_counts: HashMap<ScalarField, usize>,
    lines: Vec<(TaxType, Rule)>,
}

impl RuleTable {
    /// Built-in rules for a profile.
    pub fn for_profile(profile: RuleProfile) -> Self {
        let scalar = ScalarField::ALL
            .iter()
            .map(|field| {
                let rules = match profile {
                    RuleProfile::Strict => strict_rules(*field),
                    RuleProfile::NoisyOcr => noisy_rules(*field),
                };
                (*field, rules)
            })
            .collect();

        let lines = match profile {
            RuleProfile::Strict => Vec::new(),
            RuleProfile::NoisyOcr => vec![
                (TaxType::Cgst, rule("cgst_line", &CGST_LINE)),
                (TaxType::Sgst, rule("sgst_line", &SGST_LINE)),
                (TaxType::Igst, rule("igst_line", &IGST_LINE)),
            ],
        };

        Self {
            profile,
            scalar,
            custom_counts: HashMap::new(),
            lines,
        }
    }

    /// Add a user pattern ahead of the built-in rules for `field`.
    ///
    /// Custom rules keep the order they were added in.
    pub fn with_custom_rule(
        mut self,
        field: ScalarField,
        pattern: &str,
    ) -> Result<Self, ExtractionError> {
        let count = self.custom_counts.entry(field).or_insert(0);
        let custom = Rule::compile(format!("custom_{}_{}", field, *count + 1), pattern).map_err(
            |source| ExtractionError::InvalidPattern {
                field: field.to_string(),
                source,
            },
        )?;

        self.scalar.entry(field).or_default().insert(*count, custom);
        *count += 1;
        Ok(self)
    }

    pub fn profile(&self) -> RuleProfile {
        self.profile
    }

    /// Alternatives for a field, highest priority first.
    pub fn rules(&self, field: ScalarField) -> &[Rule] {
        self.scalar.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Multi-occurrence tax-line rules.
    pub fn line_rules(&self) -> &[(TaxType, Rule)] {
        &self.lines
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::for_profile(RuleProfile::default())
    }
}

fn rule(label: &str, regex: &Regex) -> Rule {
    Rule::new(label, regex.clone())
}

fn strict_rules(field: ScalarField) -> Vec<Rule> {
    match field {
        ScalarField::InvoiceNo => vec![rule("invoice_no_labeled", &INVOICE_NO_LABELED)],
        ScalarField::Date => vec![rule("date_hyphenated", &DATE_HYPHENATED)],
        ScalarField::TotalAmount => vec![
            rule("grand_total", &GRAND_TOTAL),
            rule("total", &TOTAL_BARE).not_after("sub"),
        ],
        ScalarField::TaxableValue => vec![rule("taxable_labeled", &TAXABLE_LABELED)],
        ScalarField::IgstAmount => vec![rule("igst_amount", &IGST_AMOUNT)],
        ScalarField::CgstAmount => vec![rule("cgst_amount", &CGST_AMOUNT)],
        ScalarField::SgstAmount => vec![rule("sgst_amount", &SGST_AMOUNT)],
        ScalarField::IgstRate => vec![rule("igst_rate", &IGST_RATE)],
        ScalarField::CgstRate => vec![rule("cgst_rate", &CGST_RATE)],
        ScalarField::SgstRate => vec![rule("sgst_rate", &SGST_RATE)],
        ScalarField::CustomerGstin => vec![rule("gstin_of_recipient", &GSTIN_OF_RECIPIENT)],
    }
}

fn noisy_rules(field: ScalarField) -> Vec<Rule> {
    match field {
        ScalarField::InvoiceNo => vec![
            rule("invoice_no_labeled", &INVOICE_NO_LABELED),
            rule("invoice_no_code", &INVOICE_NO_CODE),
        ],
        ScalarField::Date => vec![
            rule("date_delimited", &DATE_DELIMITED),
            rule("date_spaced", &DATE_SPACED),
        ],
        ScalarField::TotalAmount => vec![
            rule("grand_total", &GRAND_TOTAL),
            rule("total_payable", &TOTAL_PAYABLE),
            rule("total_amount", &TOTAL_AMOUNT).not_after("sub"),
            rule("total", &TOTAL_BARE).not_after("sub"),
            rule("total_ocr_noise", &TOTAL_OCR_NOISE),
        ],
        ScalarField::TaxableValue => vec![
            rule("taxable_labeled", &TAXABLE_LABELED),
            rule("sub_total", &SUB_TOTAL),
        ],
        ScalarField::IgstAmount => vec![
            rule("igst_amount", &IGST_AMOUNT),
            rule("igst_amount_ocr", &IGST_AMOUNT_OCR),
        ],
        ScalarField::CgstAmount => vec![
            rule("cgst_amount", &CGST_AMOUNT),
            rule("percent_amt", &PERCENT_AMT_AMOUNT),
        ],
        ScalarField::SgstAmount => vec![
            rule("sgst_amount", &SGST_AMOUNT),
            rule("sgst_amount_ocr", &SGST_AMOUNT_OCR),
        ],
        ScalarField::IgstRate => vec![rule("igst_rate", &IGST_RATE)],
        ScalarField::CgstRate => vec![
            rule("cgst_rate", &CGST_RATE),
            rule("percent_amt_rate", &PERCENT_AMT_RATE),
        ],
        ScalarField::SgstRate => vec![rule("sgst_rate", &SGST_RATE)],
        ScalarField::CustomerGstin => vec![
            rule("customer_gstin", &CUSTOMER_GSTIN),
            rule("gstin_of_recipient", &GSTIN_OF_RECIPIENT),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(table: &RuleTable, field: ScalarField) -> Vec<String> {
        table
            .rules(field)
            .iter()
            .map(|r| r.label().to_string())
            .collect()
    }

    #[test]
    fn test_every_field_has_rules() {
        for profile in [RuleProfile::Strict, RuleProfile::NoisyOcr] {
            let table = RuleTable::for_profile(profile);
            for field in ScalarField::ALL {
                assert!(!table.rules(field).is_empty(), "{profile}: {field}");
            }
        }
    }

    #[test]
    fn test_profiles_differ() {
        let strict = RuleTable::for_profile(RuleProfile::Strict);
        let noisy = RuleTable::for_profile(RuleProfile::NoisyOcr);

        assert!(strict.line_rules().is_empty());
        assert_eq!(noisy.line_rules().len(), 3);
        assert!(labels(&noisy, ScalarField::TotalAmount).len() > labels(&strict, ScalarField::TotalAmount).len());
    }

    #[test]
    fn test_custom_rules_come_first_in_insertion_order() {
        let table = RuleTable::for_profile(RuleProfile::NoisyOcr)
            .with_custom_rule(ScalarField::InvoiceNo, r"bill\s*#\s*(\S+)")
            .unwrap()
            .with_custom_rule(ScalarField::InvoiceNo, r"ref\s*(\S+)")
            .unwrap();

        assert_eq!(
            labels(&table, ScalarField::InvoiceNo),
            vec![
                "custom_invoice_no_1",
                "custom_invoice_no_2",
                "invoice_no_labeled",
                "invoice_no_code",
            ]
        );
    }

    #[test]
    fn test_invalid_custom_rule() {
        let err = RuleTable::default()
            .with_custom_rule(ScalarField::Date, r"(\d+")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPattern { ref field, .. } if field == "date"));
    }
}
