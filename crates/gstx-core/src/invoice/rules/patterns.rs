//! Regex patterns for GST invoice extraction.
//!
//! Every pattern is case-insensitive. Amounts are captured as digits with
//! optional comma grouping (both `1,234,567.00` and `12,34,567.00`).

use lazy_static::lazy_static;
use regex::Regex;

/// Amount capture: digits, optional comma groups, optional fraction.
const NUM: &str = r"(\d+(?:,\d+)*(?:\.\d+)?)";

/// Percentage capture without the `%` sign.
const RATE: &str = r"(\d+(?:\.\d+)?)";

/// Optional currency marker before an amount.
const CUR: &str = r"(?:rs\.?|inr|₹)?\s*";

/// Optional rate printed between a tax label and its amount (`IGST 18% 180`).
const SKIP_RATE: &str = r"(?:\s*(?:rate\s*)?@?\s*\d+(?:\.\d+)?\s*%)?";

/// Month abbreviations, including OCR misreadings fixed up by date normalization.
const MONTHS: &str = r"jan|feb|mar|apr|may|jun|jul|aug|sept?|oct|0ct|nov|dec|doc";

fn build(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).unwrap()
}

lazy_static! {
    // Invoice number
    pub static ref INVOICE_NO_LABELED: Regex = build(
        r"\binvoice[ \t]*(?:number\b|no\b|#)\.?[ \t]*[:\-]?[ \t]*([A-Z0-9][A-Z0-9/\-]*)"
    );

    pub static ref INVOICE_NO_CODE: Regex = build(
        r"\b([A-Z0-9]{8,12}-[A-Z0-9]{6}|\d{4}-\d{2})\b"
    );

    // Dates
    pub static ref DATE_DELIMITED: Regex = build(&format!(
        r"\b(\d{{1,2}}\s*[-/.]\s*(?:\d{{1,2}}|{MONTHS})\s*[-/.]\s*(?:\d{{4}}|\d{{2}}))\b"
    ));

    pub static ref DATE_HYPHENATED: Regex = build(
        r"\b(\d{1,2}-(?:\d{1,2}|jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)-(?:\d{4}|\d{2}))\b"
    );

    pub static ref DATE_SPACED: Regex = build(&format!(
        r"\b(\d{{1,2}}\s*(?:{MONTHS})\s*,?\s*(?:\d{{4}}|\d{{2}}))\b"
    ));

    // Taxable value
    pub static ref TAXABLE_LABELED: Regex = build(&format!(
        r"taxable\s*(?:value|amount|amt)?\s*[:\-]?\s*{CUR}{NUM}"
    ));

    pub static ref SUB_TOTAL: Regex = build(&format!(
        r"sub\s*-?\s*total\s*[:\-]?\s*{CUR}{NUM}"
    ));

    // Grand total
    pub static ref GRAND_TOTAL: Regex = build(&format!(
        r"grand\s*total\s*[:\-]?\s*{CUR}{NUM}"
    ));

    pub static ref TOTAL_PAYABLE: Regex = build(&format!(
        r"total\s*(?:amount\s*)?payable\s*[:\-]?\s*{CUR}{NUM}"
    ));

    pub static ref TOTAL_AMOUNT: Regex = build(&format!(
        r"\btotal\s*(?:invoice\s*)?(?:amount|value)\s*[:\-]?\s*{CUR}{NUM}"
    ));

    pub static ref TOTAL_BARE: Regex = build(&format!(
        r"\btotal\b\s*[:\-]?\s*{CUR}{NUM}"
    ));

    /// OCR renderings of the total label seen on scanned thermal receipts.
    pub static ref TOTAL_OCR_NOISE: Regex = build(&format!(
        r"(?:ysit\s*exe\s*tie|\|=)\s*{NUM}"
    ));

    // Tax amounts
    pub static ref IGST_AMOUNT: Regex = build(&format!(
        r"\bigst{SKIP_RATE}[^\d\n]*{NUM}"
    ));

    pub static ref IGST_AMOUNT_OCR: Regex = build(&format!(
        r"\biesr{SKIP_RATE}[^\d\n]*{NUM}"
    ));

    pub static ref CGST_AMOUNT: Regex = build(&format!(
        r"\bcgst{SKIP_RATE}[^\d\n]*{NUM}"
    ));

    /// Column layout where the tax label is in the header: `9 % Amt 90.00`.
    pub static ref PERCENT_AMT_AMOUNT: Regex = build(&format!(
        r"\b\d+(?:\.\d+)?\s*%\s*amt\.?\s*{NUM}"
    ));

    pub static ref SGST_AMOUNT: Regex = build(&format!(
        r"\bsgst{SKIP_RATE}[^\d\n]*{NUM}"
    ));

    pub static ref SGST_AMOUNT_OCR: Regex = build(&format!(
        r"\bscst{SKIP_RATE}[^\d\n]*{NUM}"
    ));

    // Tax rates
    pub static ref IGST_RATE: Regex = build(&format!(
        r"\bigst\s*(?:rate\s*)?@?\s*{RATE}\s*%"
    ));

    pub static ref CGST_RATE: Regex = build(&format!(
        r"\bcgst\s*(?:rate\s*)?@?\s*{RATE}\s*%"
    ));

    pub static ref PERCENT_AMT_RATE: Regex = build(&format!(
        r"\b{RATE}\s*%\s*amt\b"
    ));

    pub static ref SGST_RATE: Regex = build(&format!(
        r"\bs[gc]st\s*(?:rate\s*)?@?\s*{RATE}\s*%"
    ));

    // Multi-rate tax lines (`CGST@2.5% 244.20`)
    pub static ref CGST_LINE: Regex = build(&format!(
        r"\bcgst\s*@\s*{RATE}\s*%\s*{NUM}"
    ));

    /// Also accepts the CGST spelling: OCR regularly turns one into the other.
    pub static ref SGST_LINE: Regex = build(&format!(
        r"\b(?:s[gc]st|[sc]gst)\s*@\s*{RATE}\s*%\s*{NUM}"
    ));

    pub static ref IGST_LINE: Regex = build(&format!(
        r"\bigst\s*@\s*{RATE}\s*%\s*{NUM}"
    ));

    // Bare tax labels, for regime evidence
    pub static ref IGST_LABEL: Regex = build(r"\bigst");
    pub static ref CGST_LABEL: Regex = build(r"\bcgst");
    pub static ref SGST_LABEL: Regex = build(r"\bsgst");

    // Recipient GSTIN
    pub static ref CUSTOMER_GSTIN: Regex = build(
        r"(?:buyer|customer|recipient|bill(?:ed)?\s*to|consignee)(?s:.){0,160}?gstin(?:\s*/\s*uin)?\s*(?:no\.?)?\s*[:\-]?\s*([0-9A-Z]{15})\b"
    );

    pub static ref GSTIN_OF_RECIPIENT: Regex = build(
        r"gstin(?:\s*/\s*uin)?\s*of\s*(?:the\s*)?(?:recipient|buyer|customer)\s*[:\-]?\s*([0-9A-Z]{15})\b"
    );

    /// Shape check: state code, PAN body, entity number, `Z`, check digit.
    pub static ref GSTIN_SHAPE: Regex = Regex::new(
        r"^\d{2}[A-Z]{5}\d{4}[A-Z]\dZ\d$"
    ).unwrap();
}
