//! GST invoice record model.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::rules::checked_sum;

/// GST component a tax amount belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxType {
    /// Central GST (intrastate, paired with SGST).
    #[serde(rename = "CGST")]
    Cgst,
    /// State GST (intrastate, paired with CGST).
    #[serde(rename = "SGST")]
    Sgst,
    /// Integrated GST (interstate).
    #[serde(rename = "IGST")]
    Igst,
}

impl TaxType {
    /// All tax types, in the order spans are claimed during line matching.
    pub const ALL: [TaxType; 3] = [TaxType::Cgst, TaxType::Sgst, TaxType::Igst];

    /// Label as printed on invoices.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxType::Cgst => "CGST",
            TaxType::Sgst => "SGST",
            TaxType::Igst => "IGST",
        }
    }
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rate band printed on a multi-rate invoice.
///
/// Lines with equal rates are kept apart: each one is a separate line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    pub tax_type: TaxType,
    /// Percentage as printed (may be fractional, e.g. 2.5).
    pub rate: Decimal,
    pub amount: Decimal,
}

impl TaxLine {
    pub fn new(tax_type: TaxType, rate: Decimal, amount: Decimal) -> Self {
        Self {
            tax_type,
            rate,
            amount,
        }
    }
}

/// Fields recovered from a single GST invoice.
///
/// Built up by the field matcher, completed by the reconciler, then read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice number/identifier.
    pub invoice_no: Option<String>,

    /// Invoice date.
    pub date: Option<NaiveDate>,

    /// Grand total.
    pub total_amount: Option<Decimal>,

    /// Pre-tax base amount.
    pub taxable_value: Option<Decimal>,

    pub igst_amount: Option<Decimal>,
    pub igst_rate: Option<u32>,

    pub cgst_amount: Option<Decimal>,
    pub cgst_rate: Option<u32>,

    pub sgst_amount: Option<Decimal>,
    pub sgst_rate: Option<u32>,

    /// Per-rate tax lines, in the order they appear in the text.
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,

    /// Recipient's 15-character GSTIN, exactly as recovered.
    pub customer_gstin: Option<String>,
}

impl InvoiceRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tax amount for a component.
    pub fn amount(&self, tax_type: TaxType) -> Option<Decimal> {
        match tax_type {
            TaxType::Cgst => self.cgst_amount,
            TaxType::Sgst => self.sgst_amount,
            TaxType::Igst => self.igst_amount,
        }
    }

    /// Integer percentage rate for a component.
    pub fn rate(&self, tax_type: TaxType) -> Option<u32> {
        match tax_type {
            TaxType::Cgst => self.cgst_rate,
            TaxType::Sgst => self.sgst_rate,
            TaxType::Igst => self.igst_rate,
        }
    }

    pub(crate) fn amount_mut(&mut self, tax_type: TaxType) -> &mut Option<Decimal> {
        match tax_type {
            TaxType::Cgst => &mut self.cgst_amount,
            TaxType::Sgst => &mut self.sgst_amount,
            TaxType::Igst => &mut self.igst_amount,
        }
    }

    pub(crate) fn rate_mut(&mut self, tax_type: TaxType) -> &mut Option<u32> {
        match tax_type {
            TaxType::Cgst => &mut self.cgst_rate,
            TaxType::Sgst => &mut self.sgst_rate,
            TaxType::Igst => &mut self.igst_rate,
        }
    }

    /// Tax lines of one component.
    pub fn lines(&self, tax_type: TaxType) -> impl Iterator<Item = &TaxLine> {
        self.tax_lines.iter().filter(move |l| l.tax_type == tax_type)
    }

    /// Whether any component tax amount is known.
    pub fn has_tax_amount(&self) -> bool {
        TaxType::ALL.iter().any(|t| self.amount(*t).is_some())
    }

    /// Sum of all component tax amounts, absent ones counting as zero.
    ///
    /// `None` if the sum overflows.
    pub fn tax_total(&self) -> Option<Decimal> {
        checked_sum(TaxType::ALL.iter().filter_map(|t| self.amount(*t)))
    }
}

/// Share of the taxable value attributed to one tax line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApportionedLine {
    pub tax_type: TaxType,
    pub rate: Decimal,
    pub amount: Decimal,
    /// Portion of the invoice's taxable value this line was charged on.
    pub taxable_share: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_tax_total_ignores_absent() {
        let record = InvoiceRecord {
            cgst_amount: Some(d("90.00")),
            sgst_amount: Some(d("90.00")),
            ..Default::default()
        };
        assert_eq!(record.tax_total(), Some(d("180.00")));
        assert!(record.has_tax_amount());
        assert!(!InvoiceRecord::new().has_tax_amount());
    }

    #[test]
    fn test_tax_total_overflow() {
        let record = InvoiceRecord {
            cgst_amount: Some(Decimal::MAX),
            sgst_amount: Some(Decimal::MAX),
            ..Default::default()
        };
        assert_eq!(record.tax_total(), None);
    }

    #[test]
    fn test_lines_keep_duplicate_rates() {
        let record = InvoiceRecord {
            tax_lines: vec![
                TaxLine::new(TaxType::Cgst, d("2.5"), d("244.20")),
                TaxLine::new(TaxType::Sgst, d("2.5"), d("244.20")),
                TaxLine::new(TaxType::Cgst, d("2.5"), d("244.20")),
            ],
            ..Default::default()
        };
        assert_eq!(record.lines(TaxType::Cgst).count(), 2);
        assert_eq!(record.lines(TaxType::Sgst).count(), 1);
    }

    #[test]
    fn test_tax_type_serializes_as_label() {
        let json = serde_json::to_string(&TaxType::Igst).unwrap();
        assert_eq!(json, "\"IGST\"");
        assert_eq!(TaxType::Sgst.to_string(), "SGST");
    }
}
