//! Tax reconciliation: fills derivable fields of a matched record.
//!
//! Every rule writes only into a field that is still absent, so running the
//! engine again on its own output changes nothing.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::record::{ApportionedLine, InvoiceRecord, TaxType};

use super::matcher::{Evidence, MatchedInvoice};
use super::rules::{checked_sum, round_half_up, round_money};

/// Applies the inference rules in a fixed order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// Complete a matched invoice and return the finalized record.
    pub fn finish(&self, matched: MatchedInvoice) -> InvoiceRecord {
        let MatchedInvoice {
            mut record,
            evidence,
        } = matched;
        self.reconcile(&mut record, &evidence);
        record
    }

    /// Fill derivable fields, then zero-fill tax amounts and rates.
    pub fn reconcile(&self, record: &mut InvoiceRecord, evidence: &Evidence) {
        self.derive_taxable_from_igst(record);
        self.derive_taxable_from_pair(record);
        self.derive_rate(record, evidence, TaxType::Igst);
        self.derive_rate(record, evidence, TaxType::Cgst);
        self.derive_sgst_rate(record, evidence);
        self.fallback_regime(record, evidence);
        self.finalize(record);
    }

    fn derive_taxable_from_igst(&self, record: &mut InvoiceRecord) {
        let (Some(total), Some(igst), None) =
            (record.total_amount, nonzero(record.igst_amount), record.taxable_value)
        else {
            return;
        };
        let Some(taxable) = total.checked_sub(igst).filter(|t| !t.is_sign_negative()) else {
            return;
        };
        debug!(%taxable, "taxable value derived from total and IGST");
        record.taxable_value = Some(taxable);
    }

    fn derive_taxable_from_pair(&self, record: &mut InvoiceRecord) {
        let (Some(total), Some(cgst), Some(sgst), None) = (
            record.total_amount,
            nonzero(record.cgst_amount),
            nonzero(record.sgst_amount),
            record.taxable_value,
        ) else {
            return;
        };
        let Some(taxable) = cgst
            .checked_add(sgst)
            .and_then(|tax| total.checked_sub(tax))
            .filter(|t| !t.is_sign_negative())
        else {
            return;
        };
        debug!(%taxable, "taxable value derived from total, CGST and SGST");
        record.taxable_value = Some(taxable);
    }

    /// Explicit rate if printed, else the amount as a percentage of taxable value.
    fn derive_rate(&self, record: &mut InvoiceRecord, evidence: &Evidence, tax_type: TaxType) {
        if record.rate(tax_type).is_some() {
            return;
        }
        let (Some(amount), Some(taxable)) = (record.amount(tax_type), record.taxable_value) else {
            return;
        };

        let rate = evidence
            .rate_hint(tax_type)
            .or_else(|| percent_of(amount, taxable));
        if let Some(rate) = rate {
            debug!(%tax_type, rate, "rate derived");
            *record.rate_mut(tax_type) = Some(rate);
        }
    }

    /// SGST follows the CGST rate unless it was printed on its own.
    fn derive_sgst_rate(&self, record: &mut InvoiceRecord, evidence: &Evidence) {
        if record.sgst_rate.is_some() {
            return;
        }
        let (Some(amount), Some(taxable)) = (record.sgst_amount, record.taxable_value) else {
            return;
        };

        let rate = evidence
            .sgst_rate
            .or(record.cgst_rate)
            .or_else(|| percent_of(amount, taxable));
        if let Some(rate) = rate {
            debug!(rate, "SGST rate derived");
            record.sgst_rate = Some(rate);
        }
    }

    /// Attribute `total - taxable` to a regime when no tax amount was printed.
    fn fallback_regime(&self, record: &mut InvoiceRecord, evidence: &Evidence) {
        if record.has_tax_amount() {
            return;
        }
        let (Some(total), Some(taxable)) = (record.total_amount, record.taxable_value) else {
            return;
        };
        let Some(tax) = total.checked_sub(taxable).filter(|t| !t.is_sign_negative()) else {
            return;
        };

        if evidence.mentions_igst {
            debug!(%tax, "unprinted tax attributed to IGST");
            record.igst_amount = Some(tax);
            if record.igst_rate.is_none() {
                record.igst_rate = percent_of(tax, taxable);
            }
        } else if evidence.mentions_cgst && evidence.mentions_sgst {
            let half = tax / Decimal::TWO;
            debug!(%half, "unprinted tax split between CGST and SGST");
            record.cgst_amount = Some(half);
            record.sgst_amount = Some(half);

            let rate = percent_of(half, taxable);
            if record.cgst_rate.is_none() {
                record.cgst_rate = rate;
            }
            if record.sgst_rate.is_none() {
                record.sgst_rate = rate;
            }
        }
    }

    /// Zero-fill tax amounts and rates.
    ///
    /// Total and taxable value stay optional: their absence is reported by
    /// the validator.
    pub fn finalize(&self, record: &mut InvoiceRecord) {
        for tax_type in TaxType::ALL {
            record.amount_mut(tax_type).get_or_insert(Decimal::ZERO);
            record.rate_mut(tax_type).get_or_insert(0);
        }
    }

    /// Share of the taxable value carried by each tax line.
    ///
    /// Empty when there are no tax lines or no taxable value. Nothing is
    /// written back into the record.
    pub fn apportion(&self, record: &InvoiceRecord) -> Vec<ApportionedLine> {
        let Some(taxable) = record.taxable_value else {
            return Vec::new();
        };

        record
            .tax_lines
            .iter()
            .map(|line| {
                let type_total = checked_sum(record.lines(line.tax_type).map(|l| l.amount));
                let share = type_total
                    .and_then(|total| line.amount.checked_div(total))
                    .and_then(|ratio| ratio.checked_mul(taxable))
                    .unwrap_or(taxable);

                ApportionedLine {
                    tax_type: line.tax_type,
                    rate: line.rate,
                    amount: line.amount,
                    taxable_share: round_money(share),
                }
            })
            .collect()
    }
}

/// Zero-filled amounts are not evidence for deriving a taxable value.
fn nonzero(amount: Option<Decimal>) -> Option<Decimal> {
    amount.filter(|a| !a.is_zero())
}

/// `amount / base * 100`, rounded half-up; `None` for a zero base or an
/// out-of-range result.
fn percent_of(amount: Decimal, base: Decimal) -> Option<u32> {
    amount
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(round_half_up)
}
