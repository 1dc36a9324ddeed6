//! Invoice field extraction module.

pub mod liability;
pub mod matcher;
mod parser;
pub mod reconcile;
pub mod rules;
pub mod validate;

pub use liability::TaxLiability;
pub use matcher::{Evidence, FieldMatcher, MatchedInvoice};
pub use parser::{ExtractionResult, GstInvoiceParser, InvoiceParser};
pub use reconcile::Reconciler;
pub use validate::{validate_record, Validator};

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
