//! Configuration structures for the extraction pipeline.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GstxError, Result};
use crate::invoice::rules::ScalarField;

/// Main configuration for the gstx pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GstxConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Validation configuration.
    pub validation: ValidationConfig,
}

/// Named set of built-in extraction rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleProfile {
    /// One alternative per field; for clean, machine-generated text.
    Strict,
    /// Extra label variants and known OCR misreadings.
    #[default]
    NoisyOcr,
}

impl FromStr for RuleProfile {
    type Err = GstxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(RuleProfile::Strict),
            "noisy_ocr" | "noisy" => Ok(RuleProfile::NoisyOcr),
            other => Err(GstxError::Config(format!("unknown rule profile: {other}"))),
        }
    }
}

impl fmt::Display for RuleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleProfile::Strict => f.write_str("strict"),
            RuleProfile::NoisyOcr => f.write_str("noisy_ocr"),
        }
    }
}

/// User-supplied pattern tried before the profile's own rules for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub field: ScalarField,
    /// Regex; the first non-empty capture group is the value.
    pub pattern: String,
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Built-in rule profile.
    pub profile: RuleProfile,

    /// Additional rules, highest priority first.
    pub custom_rules: Vec<CustomRule>,
}

/// Consistency check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Allowed difference between the total and taxable value plus taxes.
    pub mismatch_tolerance: Decimal,

    /// Treat warnings as blocking.
    pub warnings_as_errors: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mismatch_tolerance: Decimal::new(1, 2),
            warnings_as_errors: false,
        }
    }
}

impl GstxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parsing() {
        assert_eq!(RuleProfile::from_str("strict").unwrap(), RuleProfile::Strict);
        assert_eq!(RuleProfile::from_str("noisy-ocr").unwrap(), RuleProfile::NoisyOcr);
        assert_eq!(RuleProfile::from_str("NOISY_OCR").unwrap(), RuleProfile::NoisyOcr);
        assert!(RuleProfile::from_str("lenient").is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GstxConfig =
            serde_json::from_str(r#"{"extraction": {"profile": "strict"}}"#).unwrap();
        assert_eq!(config.extraction.profile, RuleProfile::Strict);
        assert!(config.extraction.custom_rules.is_empty());
        assert_eq!(config.validation.mismatch_tolerance, Decimal::new(1, 2));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GstxConfig::default();
        config.extraction.custom_rules.push(CustomRule {
            field: ScalarField::InvoiceNo,
            pattern: r"Bill\s*#\s*(\S+)".to_string(),
        });
        config.validation.warnings_as_errors = true;
        config.save(&path).unwrap();

        let loaded = GstxConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.custom_rules, config.extraction.custom_rules);
        assert!(loaded.validation.warnings_as_errors);
    }
}
