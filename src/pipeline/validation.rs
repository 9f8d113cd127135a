//! Pipeline configuration validation.
//!
//! Checks a [`PipelineConfig`] against the columns of the table it is about
//! to run on, so mistakes surface before any stage runs.

use super::format::Formatter;
use super::spec::PipelineConfig;
use chrono::format::{Item, StrftimeItems};
use std::fmt;

/// Which part of the configuration a problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sanitize,
    Format,
    Filter,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sanitize => write!(f, "Sanitize"),
            Self::Format => write!(f, "Format"),
            Self::Filter => write!(f, "Filter"),
        }
    }
}

/// Validation problem with helpful context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub stage: Stage,
    /// Position of the rule or filter within its stage
    pub index: Option<usize>,
    pub message: String,
    /// Fatal problems stop the run; the rest become report warnings
    pub fatal: bool,
}

impl ValidationError {
    fn warning(stage: Stage, index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            stage,
            index,
            message: message.into(),
            fatal: false,
        }
    }

    fn fatal(stage: Stage, index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            fatal: true,
            ..Self::warning(stage, index, message)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(idx) => write!(f, "{} #{}: {}", self.stage, idx + 1, self.message),
            None => write!(f, "{}: {}", self.stage, self.message),
        }
    }
}

/// Validate a pipeline config against the table's column keys.
///
/// Unknown columns are warnings (the predicate or rule simply matches
/// nothing); malformed settings are fatal.
pub fn validate_config(config: &PipelineConfig, columns: &[String]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let known = |key: &String| columns.contains(key);
    let sanitization = &config.sanitization;

    for key in sanitization.columns.iter().filter(|k| !known(*k)) {
        errors.push(ValidationError::warning(
            Stage::Sanitize,
            None,
            format!("Column '{key}' is not in the table"),
        ));
    }

    if let Some(format) = &sanitization.date_format
        && !is_valid_strftime(format)
    {
        errors.push(ValidationError::fatal(
            Stage::Sanitize,
            None,
            format!("Invalid date format '{format}'"),
        ));
    }

    if let Some(policy) = &sanitization.policy_number {
        if !policy.segments.is_empty() && policy.segments.iter().all(|&s| s == 0) {
            errors.push(ValidationError::fatal(
                Stage::Sanitize,
                None,
                "Policy number segments must contain a non-zero length",
            ));
        }
        for key in policy.columns.iter().filter(|k| !known(*k)) {
            errors.push(ValidationError::warning(
                Stage::Sanitize,
                None,
                format!("Policy number column '{key}' is not in the table"),
            ));
        }
    }

    for (idx, rule) in config.formatters.iter().enumerate() {
        for key in rule.columns.iter().filter(|k| !known(*k)) {
            errors.push(ValidationError::warning(
                Stage::Format,
                Some(idx),
                format!("Column '{key}' is not in the table"),
            ));
        }
        if let Formatter::PhonePattern { pattern } = &rule.formatter
            && !pattern.contains('X')
        {
            errors.push(ValidationError::fatal(
                Stage::Format,
                Some(idx),
                format!("Phone pattern '{pattern}' has no X tokens"),
            ));
        }
    }

    for (idx, filter) in config.filters.iter().enumerate() {
        if !known(&filter.column) {
            errors.push(ValidationError::warning(
                Stage::Filter,
                Some(idx),
                format!("Column '{}' is not in the table; no rows will match", filter.column),
            ));
        }
    }

    errors
}

fn is_valid_strftime(format: &str) -> bool {
    !format.trim().is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
