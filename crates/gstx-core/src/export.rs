//! Flattened, spreadsheet-friendly view of a record and the sink interface
//! writers implement.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::invoice::rules::format_amount;
use crate::models::record::{InvoiceRecord, TaxType};

/// Date format used in flattened rows.
pub const FLAT_DATE_FORMAT: &str = "%d-%m-%Y";

/// One row per invoice: scalar fields plus comma-joined tax line summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub invoice_no: String,
    pub date: String,
    pub total_amount: String,
    pub taxable_value: String,
    pub cgst_amount: String,
    pub sgst_amount: String,
    pub igst_amount: String,
    pub cgst_rate: u32,
    pub sgst_rate: u32,
    pub igst_rate: u32,
    pub cgst_rates: String,
    pub cgst_amounts: String,
    pub sgst_rates: String,
    pub sgst_amounts: String,
    pub igst_rates: String,
    pub igst_amounts: String,
    pub customer_gstin: String,
}

impl FlatRecord {
    /// Key rows are deduplicated on.
    pub fn dedup_key(&self) -> (String, String) {
        (self.invoice_no.clone(), self.date.clone())
    }
}

impl From<&InvoiceRecord> for FlatRecord {
    fn from(record: &InvoiceRecord) -> Self {
        let amount = |v: Option<Decimal>| format_amount(v.unwrap_or_default());
        let (cgst_rates, cgst_amounts) = tax_line_summary(record, TaxType::Cgst);
        let (sgst_rates, sgst_amounts) = tax_line_summary(record, TaxType::Sgst);
        let (igst_rates, igst_amounts) = tax_line_summary(record, TaxType::Igst);

        Self {
            invoice_no: record.invoice_no.clone().unwrap_or_default(),
            date: record
                .date
                .map(|d| d.format(FLAT_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            total_amount: amount(record.total_amount),
            taxable_value: amount(record.taxable_value),
            cgst_amount: amount(record.cgst_amount),
            sgst_amount: amount(record.sgst_amount),
            igst_amount: amount(record.igst_amount),
            cgst_rate: record.cgst_rate.unwrap_or_default(),
            sgst_rate: record.sgst_rate.unwrap_or_default(),
            igst_rate: record.igst_rate.unwrap_or_default(),
            cgst_rates,
            cgst_amounts,
            sgst_rates,
            sgst_amounts,
            igst_rates,
            igst_amounts,
            customer_gstin: record.customer_gstin.clone().unwrap_or_default(),
        }
    }
}

/// Comma-joined rates and amounts of one component's tax lines, e.g.
/// `("9, 2.5", "434.52, 244.20")`. Both empty without lines.
pub fn tax_line_summary(record: &InvoiceRecord, tax_type: TaxType) -> (String, String) {
    let rates: Vec<String> = record
        .lines(tax_type)
        .map(|l| l.rate.normalize().to_string())
        .collect();
    let amounts: Vec<String> = record
        .lines(tax_type)
        .map(|l| format_amount(l.amount))
        .collect();
    (rates.join(", "), amounts.join(", "))
}

/// Destination for flattened rows (spreadsheet, CSV file, ...).
pub trait RecordSink {
    /// Append a row. Returns whether it was actually written.
    fn append(&mut self, row: &FlatRecord) -> Result<bool>;
}

impl RecordSink for Vec<FlatRecord> {
    fn append(&mut self, row: &FlatRecord) -> Result<bool> {
        self.push(row.clone());
        Ok(true)
    }
}

/// Skips rows whose `(invoice_no, date)` was already written.
///
/// Rows without an invoice number are always passed through: there is
/// nothing to identify them by.
pub struct DedupSink<S> {
    inner: S,
    seen: HashSet<(String, String)>,
    skipped: usize,
}

impl<S: RecordSink> DedupSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
            skipped: 0,
        }
    }

    /// Seed with rows already present in the destination.
    pub fn with_existing<'a>(mut self, rows: impl IntoIterator<Item = &'a FlatRecord>) -> Self {
        self.seen.extend(
            rows.into_iter()
                .filter(|r| !r.invoice_no.is_empty())
                .map(FlatRecord::dedup_key),
        );
        self
    }

    /// Number of rows skipped as duplicates.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordSink> RecordSink for DedupSink<S> {
    fn append(&mut self, row: &FlatRecord) -> Result<bool> {
        if !row.invoice_no.is_empty() && !self.seen.insert(row.dedup_key()) {
            info!(
                "Duplicate entry for invoice {} on {} skipped",
                row.invoice_no, row.date
            );
            self.skipped += 1;
            return Ok(false);
        }
        self.inner.append(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::TaxLine;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(invoice_no: &str, day: u32) -> InvoiceRecord {
        InvoiceRecord {
            invoice_no: Some(invoice_no.to_string()),
            date: NaiveDate::from_ymd_opt(2025, 2, day),
            total_amount: Some(d("1180")),
            taxable_value: Some(d("1000")),
            igst_amount: Some(d("180")),
            igst_rate: Some(18),
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_record_zero_fills() {
        let flat = FlatRecord::from(&record("INV-1", 26));

        assert_eq!(flat.date, "26-02-2025");
        assert_eq!(flat.total_amount, "1180.00");
        assert_eq!(flat.cgst_amount, "0.00");
        assert_eq!(flat.cgst_rate, 0);
        assert_eq!(flat.igst_rate, 18);
        assert_eq!(flat.cgst_rates, "");
        assert_eq!(flat.dedup_key(), ("INV-1".to_string(), "26-02-2025".to_string()));
    }

    #[test]
    fn test_tax_line_summary() {
        let record = InvoiceRecord {
            tax_lines: vec![
                TaxLine::new(TaxType::Cgst, d("9"), d("434.52")),
                TaxLine::new(TaxType::Sgst, d("9"), d("434.52")),
                TaxLine::new(TaxType::Cgst, d("2.50"), d("244.2")),
            ],
            ..Default::default()
        };

        assert_eq!(
            tax_line_summary(&record, TaxType::Cgst),
            ("9, 2.5".to_string(), "434.52, 244.20".to_string())
        );
        assert_eq!(
            tax_line_summary(&record, TaxType::Igst),
            (String::new(), String::new())
        );
    }

    #[test]
    fn test_dedup_sink() {
        let mut sink = DedupSink::new(Vec::<FlatRecord>::new());

        assert!(sink.append(&FlatRecord::from(&record("INV-1", 26))).unwrap());
        assert!(!sink.append(&FlatRecord::from(&record("INV-1", 26))).unwrap());
        // same number, different date
        assert!(sink.append(&FlatRecord::from(&record("INV-1", 27))).unwrap());

        assert_eq!(sink.skipped(), 1);
        assert_eq!(sink.into_inner().len(), 2);
    }

    #[test]
    fn test_dedup_sink_keeps_unnumbered_rows() {
        let unnumbered = FlatRecord::from(&InvoiceRecord::default());
        let mut sink = DedupSink::new(Vec::<FlatRecord>::new());

        assert!(sink.append(&unnumbered).unwrap());
        assert!(sink.append(&unnumbered).unwrap());
        assert_eq!(sink.skipped(), 0);
    }

    #[test]
    fn test_dedup_sink_with_existing() {
        let existing = vec![FlatRecord::from(&record("INV-9", 1))];
        let mut sink = DedupSink::new(Vec::<FlatRecord>::new()).with_existing(&existing);

        assert!(!sink.append(&existing[0]).unwrap());
        assert!(sink.into_inner().is_empty());
    }
}
