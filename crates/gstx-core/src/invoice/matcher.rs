//! Field matching: applies the rule table to raw OCR text.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::RuleProfile;
use crate::models::record::{InvoiceRecord, TaxType};

use super::rules::{
    checked_sum, normalize_date, normalize_gstin, parse_amount, parse_rate, round_half_up,
    ExtractionMatch, FieldExtractor, RuleTable, ScalarField, TaxLineExtractor,
};
use super::rules::patterns::{CGST_LABEL, IGST_LABEL, SGST_LABEL};

/// Textual evidence that is not itself a record field.
///
/// Explicit rates are kept here rather than written into the record: the
/// reconciler decides whether they apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    pub igst_rate: Option<u32>,
    pub cgst_rate: Option<u32>,
    pub sgst_rate: Option<u32>,
    /// Literal `IGST` keyword somewhere in the text.
    pub mentions_igst: bool,
    pub mentions_cgst: bool,
    pub mentions_sgst: bool,
}

impl Evidence {
    /// Explicitly printed rate for a component.
    pub fn rate_hint(&self, tax_type: TaxType) -> Option<u32> {
        match tax_type {
            TaxType::Cgst => self.cgst_rate,
            TaxType::Sgst => self.sgst_rate,
            TaxType::Igst => self.igst_rate,
        }
    }

    pub fn mentions(&self, tax_type: TaxType) -> bool {
        match tax_type {
            TaxType::Cgst => self.mentions_cgst,
            TaxType::Sgst => self.mentions_sgst,
            TaxType::Igst => self.mentions_igst,
        }
    }

    fn rate_hint_mut(&mut self, tax_type: TaxType) -> &mut Option<u32> {
        match tax_type {
            TaxType::Cgst => &mut self.cgst_rate,
            TaxType::Sgst => &mut self.sgst_rate,
            TaxType::Igst => &mut self.igst_rate,
        }
    }
}

/// Partial record straight from the matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchedInvoice {
    pub record: InvoiceRecord,
    pub evidence: Evidence,
}

/// Applies a [`RuleTable`] to text.
#[derive(Debug, Clone, Default)]
pub struct FieldMatcher {
    table: RuleTable,
}

impl FieldMatcher {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn for_profile(profile: RuleProfile) -> Self {
        Self::new(RuleTable::for_profile(profile))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// First rule for `field` whose match also normalizes.
    pub fn first_match<T>(
        &self,
        field: ScalarField,
        text: &str,
        normalize: impl Fn(&str) -> Option<T>,
    ) -> Option<ExtractionMatch<T>> {
        for rule in self.table.rules(field) {
            let Some(found) = rule.find(text) else {
                continue;
            };
            match normalize(found.value) {
                Some(value) => {
                    debug!(%field, rule = rule.label(), raw = found.value, "field matched");
                    return Some(found.map(|_| value));
                }
                None => debug!(%field, rule = rule.label(), raw = found.value, "match did not normalize"),
            }
        }
        None
    }

    fn amount(&self, field: ScalarField, text: &str) -> Option<Decimal> {
        self.first_match(field, text, parse_amount).map(|m| m.value)
    }

    fn rate(&self, field: ScalarField, text: &str) -> Option<u32> {
        self.first_match(field, text, |raw| parse_rate(raw).and_then(round_half_up))
            .map(|m| m.value)
    }

    /// Run every rule against `text`.
    pub fn match_text(&self, text: &str) -> MatchedInvoice {
        let mut record = InvoiceRecord {
            invoice_no: self
                .first_match(ScalarField::InvoiceNo, text, |raw| Some(raw.to_string()))
                .map(|m| m.value),
            date: self
                .first_match(ScalarField::Date, text, normalize_date)
                .map(|m| m.value),
            total_amount: self.amount(ScalarField::TotalAmount, text),
            taxable_value: self.amount(ScalarField::TaxableValue, text),
            igst_amount: self.amount(ScalarField::IgstAmount, text),
            cgst_amount: self.amount(ScalarField::CgstAmount, text),
            sgst_amount: self.amount(ScalarField::SgstAmount, text),
            customer_gstin: self
                .first_match(ScalarField::CustomerGstin, text, |raw| Some(normalize_gstin(raw)))
                .map(|m| m.value),
            ..Default::default()
        };

        let mut evidence = Evidence {
            igst_rate: self.rate(ScalarField::IgstRate, text),
            cgst_rate: self.rate(ScalarField::CgstRate, text),
            sgst_rate: self.rate(ScalarField::SgstRate, text),
            mentions_igst: IGST_LABEL.is_match(text),
            mentions_cgst: CGST_LABEL.is_match(text),
            mentions_sgst: SGST_LABEL.is_match(text),
        };

        record.tax_lines = TaxLineExtractor::new(self.table.line_rules())
            .extract_all(text)
            .into_iter()
            .map(|m| m.value)
            .collect();

        for tax_type in TaxType::ALL {
            let mut lines = record.lines(tax_type).peekable();
            let Some(first) = lines.peek() else {
                continue;
            };
            let first_rate = round_half_up(first.rate);
            let Some(sum) = checked_sum(lines.map(|l| l.amount)) else {
                debug!(%tax_type, "tax line amounts overflow, lines ignored");
                continue;
            };

            debug!(%tax_type, %sum, "amount taken from tax lines");
            *record.amount_mut(tax_type) = Some(sum);
            let hint = evidence.rate_hint_mut(tax_type);
            if hint.is_none() {
                *hint = first_rate;
            }
        }

        MatchedInvoice { record, evidence }
    }
}
