//! Core library for GST invoice field extraction from OCR text.
//!
//! This crate provides:
//! - Amount, date and GSTIN normalizers for noisy OCR tokens
//! - A profile-based rule table and field matcher
//! - Tax reconciliation (derived taxable value, rates, regime fallback)
//! - Consistency validation and a tax liability summary
//! - A flattened row view and deduplicating sink for spreadsheet writers

pub mod error;
pub mod export;
pub mod invoice;
pub mod models;

pub use error::{ExtractionError, GstxError, Result};
pub use export::{DedupSink, FlatRecord, RecordSink};
pub use invoice::{
    validate_record, ExtractionResult, GstInvoiceParser, InvoiceParser, Reconciler, TaxLiability,
    Validator,
};
pub use models::config::{GstxConfig, RuleProfile};
pub use models::record::{ApportionedLine, InvoiceRecord, TaxLine, TaxType};
pub use models::report::ValidationReport;
