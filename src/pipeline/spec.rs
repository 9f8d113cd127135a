//! Pipeline configuration data structures.
//!
//! A [`PipelineConfig`] is everything needed to replay a reshaping session on a
//! fresh table: sanitization options, formatter rules and filter predicates.
//! It serializes to JSON and is what presets capture.

use super::filter::FilterPredicate;
use super::format::FormatRule;
use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};

/// Full pipeline configuration, applied as Sanitize → Format → Filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub sanitization: SanitizationOptions,
    pub formatters: Vec<FormatRule>,
    pub filters: Vec<FilterPredicate>,
}

impl PipelineConfig {
    /// Parse a pipeline config from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse pipeline config JSON")
    }

    /// Serialize pipeline config to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline config")
    }
}

/// How the special-character stripper disposes of removed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialCharMode {
    /// Replace with a space, then collapse whitespace runs and trim
    #[default]
    ReplaceWithSpace,
    /// Delete with no replacement
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZipCountry {
    #[default]
    Us,
    Ca,
    Uk,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SsnFormat {
    #[default]
    #[serde(rename = "XXX-XX-XXXX")]
    Dashed,
    #[serde(rename = "XXXXXXXXX")]
    DigitsOnly,
    #[serde(rename = "XXX-XX-****")]
    Masked,
}

/// Policy-number reshaping.
///
/// When `auto_detect` is on, a value that is exactly ten digits after
/// cleaning is always emitted as `NNN-NNN-NNNN`, regardless of `segments`
/// and `separator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyNumberOptions {
    pub columns: Vec<String>,
    /// Segment lengths, e.g. `[3, 3, 4]`; overflow becomes a final chunk
    pub segments: Vec<usize>,
    pub separator: String,
    pub auto_detect: bool,
}

impl Default for PolicyNumberOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            segments: vec![3, 3, 4],
            separator: "-".to_owned(),
            auto_detect: true,
        }
    }
}

/// Sanitization switches. Type-specific formatters run for columns whose
/// effective semantic type matches; the rest apply to every column in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SanitizationOptions {
    /// Master switch for the whole sanitize stage
    pub enabled: bool,
    /// Columns in scope; empty means every column
    pub columns: Vec<String>,
    pub trim_whitespace: bool,
    pub remove_special_chars: bool,
    pub special_char_mode: SpecialCharMode,
    pub strip_html: bool,
    pub preserve_line_breaks: bool,
    pub format_zip_codes: bool,
    pub zip_country: ZipCountry,
    pub zip_extended: bool,
    /// Cut any `NNNNN-NNNN` value in any column down to its first five digits
    pub sanitize_zip_codes: bool,
    pub format_phones: bool,
    pub normalize_emails: bool,
    pub format_currency: bool,
    pub format_ssn: bool,
    pub ssn_format: SsnFormat,
    /// strftime pattern for date columns; `None` leaves dates untouched
    pub date_format: Option<String>,
    pub policy_number: Option<PolicyNumberOptions>,
    /// Per-value shape detection for columns without a column-level verdict
    pub per_value_fallback: bool,
}

impl Default for SanitizationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            columns: Vec::new(),
            trim_whitespace: true,
            remove_special_chars: false,
            special_char_mode: SpecialCharMode::default(),
            strip_html: false,
            preserve_line_breaks: true,
            format_zip_codes: true,
            zip_country: ZipCountry::default(),
            zip_extended: false,
            sanitize_zip_codes: false,
            format_phones: true,
            normalize_emails: true,
            format_currency: true,
            format_ssn: true,
            ssn_format: SsnFormat::default(),
            date_format: None,
            policy_number: None,
            per_value_fallback: true,
        }
    }
}

impl SanitizationOptions {
    pub fn in_scope(&self, key: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::filter::FilterOp;

    #[test]
    fn test_config_serialization() {
        let mut config = PipelineConfig::default();
        config.sanitization.ssn_format = SsnFormat::Masked;
        config.sanitization.zip_country = ZipCountry::Ca;
        config
            .filters
            .push(FilterPredicate::new("Age", FilterOp::GreaterThan(18.0)));

        let json = config.to_json().expect("Failed to serialize");
        assert!(json.contains("\"ssnFormat\": \"XXX-XX-****\""));
        assert!(json.contains("\"zipCountry\": \"CA\""));
        assert!(json.contains("\"operator\": \"greaterThan\""));

        let parsed = PipelineConfig::from_json(&json).expect("Failed to parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed =
            PipelineConfig::from_json(r#"{"sanitization": {"sanitizeZipCodes": true}}"#)
                .expect("Failed to parse");
        assert!(parsed.sanitization.sanitize_zip_codes);
        assert!(parsed.sanitization.trim_whitespace);
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn test_scope() {
        let options = SanitizationOptions {
            columns: vec!["a".to_owned()],
            ..Default::default()
        };
        assert!(options.in_scope("a"));
        assert!(!options.in_scope("b"));
        assert!(SanitizationOptions::default().in_scope("anything"));
    }
}
