//! Consistency checks over a finalized record.

use rust_decimal::Decimal;

use crate::models::record::InvoiceRecord;
use crate::models::report::ValidationReport;

use super::rules::{format_amount, validate_gstin_format};

/// Checks a record for missing mandatory fields and arithmetic consistency.
#[derive(Debug, Clone)]
pub struct Validator {
    tolerance: Decimal,
}

impl Validator {
    /// Validator with the default tolerance of 0.01.
    pub fn new() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
        }
    }

    /// Allowed difference between the total and taxable value plus taxes.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Validate a record. Never fails and never modifies the record.
    pub fn validate(&self, record: &InvoiceRecord) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mandatory = [
            ("invoice_no", record.invoice_no.as_deref().is_some_and(|s| !s.trim().is_empty())),
            ("date", record.date.is_some()),
            ("total_amount", record.total_amount.is_some_and(|a| !a.is_zero())),
            ("taxable_value", record.taxable_value.is_some_and(|a| !a.is_zero())),
        ];
        for (field, present) in mandatory {
            if !present {
                report.errors.push(format!("Missing or empty field: {field}"));
            }
        }

        if let Some(gstin) = record.customer_gstin.as_deref().filter(|g| !g.is_empty()) {
            if !validate_gstin_format(gstin) {
                report.warnings.push(format!("Invalid GSTIN format: {gstin}"));
            }
        }

        let total = record.total_amount.unwrap_or_default();
        let expected = record
            .tax_total()
            .and_then(|tax| record.taxable_value.unwrap_or_default().checked_add(tax));
        let within_tolerance = expected
            .and_then(|expected| total.checked_sub(expected))
            .is_some_and(|diff| diff.abs() <= self.tolerance);
        if !within_tolerance {
            let expected = expected.map_or_else(|| "out of range".to_string(), format_amount);
            report.warnings.push(format!(
                "Mismatch: Total amount ({}) does not match taxable value + taxes ({})",
                format_amount(total),
                expected
            ));
        }

        report
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a record with the default tolerance.
pub fn validate_record(record: &InvoiceRecord) -> ValidationReport {
    Validator::new().validate(record)
}
