//! Per-invoice tax liability summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::record::{InvoiceRecord, TaxType};

/// Tax owed on one invoice, computed two ways.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLiability {
    /// CGST + SGST + IGST.
    pub total_tax_liability: Decimal,
    /// Total amount minus taxable value.
    pub net_tax_payable: Decimal,
    pub notes: Vec<String>,
}

impl TaxLiability {
    /// Summarize a finalized record. Absent amounts count as zero; sums
    /// that overflow saturate at `Decimal::MAX`.
    pub fn from_record(record: &InvoiceRecord, tolerance: Decimal) -> Self {
        let total_tax_liability = TaxType::ALL
            .iter()
            .filter_map(|t| record.amount(*t))
            .fold(Decimal::ZERO, Decimal::saturating_add);
        let net_tax_payable = record
            .total_amount
            .unwrap_or_default()
            .saturating_sub(record.taxable_value.unwrap_or_default());

        let mut notes = Vec::new();
        let agrees = net_tax_payable
            .checked_sub(total_tax_liability)
            .is_some_and(|diff| diff.abs() <= tolerance);
        if !agrees {
            notes.push("Net tax payable does not match total tax liability".to_string());
        }

        Self {
            total_tax_liability,
            net_tax_payable,
            notes,
        }
    }

    /// Whether both computations agree.
    pub fn is_consistent(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_consistent_liability() {
        let record = InvoiceRecord {
            total_amount: Some(d("1180")),
            taxable_value: Some(d("1000")),
            igst_amount: Some(d("180")),
            ..Default::default()
        };
        let liability = TaxLiability::from_record(&record, d("0.01"));

        assert_eq!(liability.total_tax_liability, d("180"));
        assert_eq!(liability.net_tax_payable, d("180"));
        assert!(liability.is_consistent());
    }

    #[test]
    fn test_inconsistent_liability_noted() {
        let record = InvoiceRecord {
            total_amount: Some(d("15953.44")),
            taxable_value: Some(d("14596.00")),
            cgst_amount: Some(d("922.92")),
            sgst_amount: Some(d("494.52")),
            ..Default::default()
        };
        let liability = TaxLiability::from_record(&record, d("0.01"));

        assert_eq!(liability.total_tax_liability, d("1417.44"));
        assert_eq!(liability.net_tax_payable, d("1357.44"));
        assert_eq!(liability.notes.len(), 1);
    }

    #[test]
    fn test_overflowing_liability_saturates() {
        let record = InvoiceRecord {
            total_amount: Some(d("5")),
            taxable_value: Some(d("1")),
            cgst_amount: Some(Decimal::MAX),
            sgst_amount: Some(Decimal::MAX),
            ..Default::default()
        };
        let liability = TaxLiability::from_record(&record, d("0.01"));

        assert_eq!(liability.total_tax_liability, Decimal::MAX);
        assert_eq!(liability.net_tax_payable, d("4"));
        assert!(!liability.is_consistent());
    }
}
