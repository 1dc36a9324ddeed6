//! GST invoice parser: matcher, reconciler and validator in one pass.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::{GstxConfig, RuleProfile};
use crate::models::record::{ApportionedLine, InvoiceRecord};
use crate::models::report::ValidationReport;

use super::liability::TaxLiability;
use super::matcher::FieldMatcher;
use super::reconcile::Reconciler;
use super::rules::RuleTable;
use super::validate::Validator;
use super::Result;

/// Result of invoice extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Finalized record.
    pub record: InvoiceRecord,
    /// Validation report for the record.
    pub report: ValidationReport,
    /// Taxable value shares per tax line (empty for single-rate invoices).
    pub apportioned_lines: Vec<ApportionedLine>,
    pub liability: TaxLiability,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse invoice from text.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}

/// Rule-based GST invoice parser.
#[derive(Debug, Clone, Default)]
pub struct GstInvoiceParser {
    matcher: FieldMatcher,
    reconciler: Reconciler,
    validator: Validator,
}

impl GstInvoiceParser {
    /// Create a parser with the default `noisy_ocr` rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the built-in rules of another profile.
    pub fn with_profile(mut self, profile: RuleProfile) -> Self {
        self.matcher = FieldMatcher::for_profile(profile);
        self
    }

    /// Set the mismatch tolerance used by validation.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.validator = self.validator.with_tolerance(tolerance);
        self
    }

    /// Build a parser from configuration, compiling any custom rules.
    pub fn from_config(config: &GstxConfig) -> Result<Self> {
        let mut table = RuleTable::for_profile(config.extraction.profile);
        for custom in &config.extraction.custom_rules {
            table = table.with_custom_rule(custom.field, &custom.pattern)?;
        }

        Ok(Self {
            matcher: FieldMatcher::new(table),
            reconciler: Reconciler::new(),
            validator: Validator::new().with_tolerance(config.validation.mismatch_tolerance),
        })
    }

    pub fn profile(&self) -> RuleProfile {
        self.matcher.table().profile()
    }
}

impl InvoiceParser for GstInvoiceParser {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::NoData);
        }

        info!("Parsing invoice from {} characters of text", text.len());

        let matched = self.matcher.match_text(text);
        let record = self.reconciler.finish(matched);
        let report = self.validator.validate(&record);
        let apportioned_lines = self.reconciler.apportion(&record);
        let liability = TaxLiability::from_record(&record, self.validator.tolerance());

        if report.errors.len() == 4 {
            warn!("No mandatory invoice fields found; input may not be an invoice");
        }

        debug!(
            "Extracted invoice {} with {} errors, {} warnings",
            record.invoice_no.as_deref().unwrap_or("<unknown>"),
            report.errors.len(),
            report.warnings.len()
        );

        Ok(ExtractionResult {
            record,
            report,
            apportioned_lines,
            liability,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::rules::ScalarField;
    use crate::models::config::CustomRule;
    use crate::models::record::TaxType;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_complete_invoice() {
        let text = r#"
            TAX INVOICE
            Invoice No: INV-2025-001
            Date: 26-02-2025

            Buyer: Acme Traders
            GSTIN: 22AAAAA0000A1Z5

            Taxable Value 1000
            IGST 18% 180
            Total 1180
        "#;

        let result = GstInvoiceParser::new().parse(text).unwrap();
        let record = &result.record;

        assert_eq!(record.invoice_no.as_deref(), Some("INV-2025-001"));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 2, 26));
        assert_eq!(record.taxable_value, Some(d("1000")));
        assert_eq!(record.igst_amount, Some(d("180")));
        assert_eq!(record.igst_rate, Some(18));
        assert_eq!(record.total_amount, Some(d("1180")));
        assert_eq!(record.customer_gstin.as_deref(), Some("22AAAAA0000A1Z5"));
        assert!(result.report.is_clean(), "{:?}", result.report);
        assert!(result.liability.is_consistent());
        assert!(result.apportioned_lines.is_empty());
    }

    #[test]
    fn test_parse_multi_rate_invoice() {
        let text = "Invoice No: 80XB0EZ0-8BP000\nDate: 14 Doc 2024\n\
                    CGST@9% 434.52\nSGST@9% 434.52\n\
                    CGST@2.5% 244.20\nSGST@2.5% 244.20\n\
                    Grand Total 12084.54";

        let result = GstInvoiceParser::new().parse(text).unwrap();
        let record = &result.record;

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 12, 14));
        assert_eq!(record.cgst_amount, Some(d("678.72")));
        assert_eq!(record.sgst_amount, Some(d("678.72")));
        assert_eq!(record.taxable_value, Some(d("10727.10")));
        assert_eq!(record.cgst_rate, Some(9));
        assert_eq!(record.sgst_rate, Some(9));

        assert_eq!(result.apportioned_lines.len(), 4);
        let cgst_shares: Decimal = result
            .apportioned_lines
            .iter()
            .filter(|l| l.tax_type == TaxType::Cgst)
            .map(|l| l.taxable_share)
            .sum();
        assert!((cgst_shares - d("10727.10")).abs() <= d("0.01"));
        assert!(result.report.is_clean(), "{:?}", result.report);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let err = GstInvoiceParser::new().parse("  \n\t ").unwrap_err();
        assert!(matches!(err, ExtractionError::NoData));
    }

    #[test]
    fn test_non_invoice_text_reports_errors() {
        let result = GstInvoiceParser::new().parse("hello world").unwrap();
        assert_eq!(result.report.errors.len(), 4);
        assert_eq!(result.record.igst_amount, Some(Decimal::ZERO));
    }

    #[test]
    fn test_shop_name_is_not_a_tax_label() {
        let result = GstInvoiceParser::new()
            .parse(
                "Sold by BIGSTAR Retail, Shop 12\nInvoice No: INV-9\nDate: 26-02-2025\n\
                 Taxable Value 1000\nCGST 9% 90\nSGST 9% 90\nTotal 1180",
            )
            .unwrap();

        assert_eq!(result.record.igst_amount, Some(Decimal::ZERO));
        assert_eq!(result.record.igst_rate, Some(0));
        assert!(result.report.is_clean(), "{:?}", result.report);
    }

    #[test]
    fn test_huge_amounts_are_reported_not_fatal() {
        let parser = GstInvoiceParser::new();

        let result = parser
            .parse("Taxable Value 1\nIGST 79228162514264337593543950335\nTotal 5")
            .unwrap();
        assert_eq!(result.record.igst_rate, Some(0));
        assert_eq!(result.report.warnings.len(), 1);

        let result = parser
            .parse("CGST 79228162514264337593543950335\nSGST 79228162514264337593543950335\nTotal 5")
            .unwrap();
        assert_eq!(result.record.taxable_value, None);
        assert_eq!(result.liability.total_tax_liability, Decimal::MAX);
        assert!(result.report.warnings[0].ends_with("(out of range)"));
    }

    #[test]
    fn test_strict_profile_ignores_ocr_variants() {
        let text = "Taxable Value 1000\niesr 180\nTotal 1180";

        let noisy = GstInvoiceParser::new().parse(text).unwrap();
        assert_eq!(noisy.record.igst_amount, Some(d("180")));

        let strict = GstInvoiceParser::new()
            .with_profile(RuleProfile::Strict)
            .parse(text)
            .unwrap();
        assert_eq!(strict.record.igst_amount, Some(Decimal::ZERO));
    }

    #[test]
    fn test_from_config() {
        let mut config = GstxConfig::default();
        config.extraction.custom_rules.push(CustomRule {
            field: ScalarField::InvoiceNo,
            pattern: r"bill\s*ref\s*(\S+)".to_string(),
        });
        let parser = GstInvoiceParser::from_config(&config).unwrap();
        let result = parser.parse("Bill Ref BR/77\nTotal 100").unwrap();
        assert_eq!(result.record.invoice_no.as_deref(), Some("BR/77"));

        config.extraction.custom_rules[0].pattern = "(".to_string();
        assert!(matches!(
            GstInvoiceParser::from_config(&config),
            Err(ExtractionError::InvalidPattern { .. })
        ));
    }
}
