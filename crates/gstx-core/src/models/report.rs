//! Validation report.

use serde::{Deserialize, Serialize};

/// Outcome of checking a record for completeness and consistency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Problems that must block filing.
    pub errors: Vec<String>,
    /// Informational problems; safe to proceed.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether a caller should stop, given its policy on warnings.
    pub fn is_blocking(&self, warnings_as_errors: bool) -> bool {
        self.has_errors() || (warnings_as_errors && !self.warnings.is_empty())
    }
}
