//! Multi-rate tax line extraction (`CGST@9% 434.52`, `CGST@2.5% 244.20`).

use tracing::debug;

use crate::models::record::{TaxLine, TaxType};

use super::amounts::{parse_amount, parse_rate};
use super::{ExtractionMatch, FieldExtractor, Rule};

/// Tax line extractor over an ordered list of `(tax type, rule)` pairs.
///
/// Each rule must capture the rate in group 1 and the amount in group 2.
/// A text span claimed by an earlier rule is never reused by a later one,
/// so an `SGST` rule that also accepts the `CGST` spelling cannot re-read a
/// CGST line.
pub struct TaxLineExtractor<'a> {
    rules: &'a [(TaxType, Rule)],
}

impl<'a> TaxLineExtractor<'a> {
    pub fn new(rules: &'a [(TaxType, Rule)]) -> Self {
        Self { rules }
    }
}

impl FieldExtractor for TaxLineExtractor<'_> {
    type Output = ExtractionMatch<TaxLine>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut results = Vec::new();

        for (tax_type, rule) in self.rules {
            for caps in rule.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                let span = (whole.start(), whole.end());

                if claimed.iter().any(|&(s, e)| span.0 < e && s < span.1) {
                    debug!(rule = rule.label(), line = whole.as_str(), "tax line already claimed");
                    continue;
                }

                let rate = caps.get(1).and_then(|m| parse_rate(m.as_str()));
                let amount = caps.get(2).and_then(|m| parse_amount(m.as_str()));
                let (Some(rate), Some(amount)) = (rate, amount) else {
                    continue;
                };

                claimed.push(span);
                results.push(
                    ExtractionMatch::new(
                        TaxLine::new(*tax_type, rate, amount),
                        rule.label(),
                        whole.as_str(),
                    )
                    .with_position(span.0, span.1),
                );
            }
        }

        results.sort_by_key(|m| m.position);
        results
    }
}
