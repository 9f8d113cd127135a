//! Column type inference.
//!
//! A column is classified by sampling up to `sample_cap` non-empty values and
//! testing each against a fixed list of patterns. Structurally distinctive
//! patterns (email, zip, phone, ssn) are tried before the looser numeric ones
//! (currency, date, number) so a column of 5-digit zip codes never ends up as
//! a bare number. The first type whose match rate reaches the threshold wins.

use crate::model::{ColumnDescriptor, SemanticType};
use crate::table::Table;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Default number of non-empty values sampled per column.
pub const DEFAULT_SAMPLE_CAP: usize = 100;

/// Share of the sample that must match for a type to be chosen.
pub const MATCH_THRESHOLD: f64 = 0.6;

pub(crate) static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub(crate) static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip regex"));

pub(crate) static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+?1[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}$").expect("valid phone regex")
});

static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").expect("valid ssn regex"));

// The symbol is optional, but a bare number needs thousands grouping to count
// as currency. Otherwise every integer column would be money.
pub(crate) static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?([$€£¥₹]\s?-?(\d{1,3}(,\d{3})+|\d+)|\d{1,3}(,\d{3})+)(\.\d+)?$")
        .expect("valid currency regex")
});

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,4}[./-]\d{1,4}[./-]\d{1,4}$").expect("valid date regex"));

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\d{1,3}(,\d{3})+|\d+)?(\.\d+)?$").expect("valid number regex")
});

/// Candidate types in priority order.
fn candidates() -> [(SemanticType, &'static LazyLock<Regex>); 7] {
    [
        (SemanticType::Email, &EMAIL_RE),
        (SemanticType::Zipcode, &ZIP_RE),
        (SemanticType::Phone, &PHONE_RE),
        (SemanticType::Ssn, &SSN_RE),
        (SemanticType::Currency, &CURRENCY_RE),
        (SemanticType::Date, &DATE_RE),
        (SemanticType::Number, &NUMBER_RE),
    ]
}

fn is_number(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit()) && NUMBER_RE.is_match(value)
}

fn matches_type(semantic_type: SemanticType, value: &str) -> bool {
    match semantic_type {
        SemanticType::Number => is_number(value),
        other => candidates()
            .iter()
            .find(|(t, _)| *t == other)
            .is_some_and(|(_, re)| re.is_match(value)),
    }
}

/// Infers a column's semantic type with the default 60% threshold.
pub fn infer_type<S: AsRef<str>>(values: &[S], sample_cap: usize) -> SemanticType {
    infer_type_with_threshold(values, sample_cap, MATCH_THRESHOLD)
}

/// Infers a column's semantic type.
///
/// Returns `Auto` when there is nothing to sample and `Text` when no pattern
/// reaches `threshold`.
pub fn infer_type_with_threshold<S: AsRef<str>>(
    values: &[S],
    sample_cap: usize,
    threshold: f64,
) -> SemanticType {
    let sample: Vec<&str> = values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .take(sample_cap)
        .collect();

    if sample.is_empty() {
        return SemanticType::Auto;
    }

    let total = sample.len() as f64;

    for (semantic_type, _) in candidates() {
        let hits = sample
            .iter()
            .filter(|v| matches_type(semantic_type, v))
            .count();
        let rate = hits as f64 / total;
        if rate >= threshold {
            tracing::debug!(
                "Inferred {semantic_type} ({} of {} sampled values match)",
                hits,
                sample.len()
            );
            return semantic_type;
        }
    }

    SemanticType::Text
}

/// Per-value shape detection used by the sanitize fallback for columns
/// without a column-level verdict. Only the shapes that have a dedicated
/// formatter are recognised.
pub fn detect_value_shape(value: &str) -> Option<SemanticType> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else if EMAIL_RE.is_match(value) {
        Some(SemanticType::Email)
    } else if CURRENCY_RE.is_match(value) {
        Some(SemanticType::Currency)
    } else if PHONE_RE.is_match(value) {
        Some(SemanticType::Phone)
    } else if ZIP_RE.is_match(value) {
        Some(SemanticType::Zipcode)
    } else {
        None
    }
}

/// Characters exempt from special-character stripping for a type.
pub fn default_preserve_chars(semantic_type: SemanticType) -> BTreeSet<char> {
    let chars: &str = match semantic_type {
        SemanticType::Zipcode | SemanticType::Ssn => "-",
        SemanticType::Phone => "()-. ",
        SemanticType::Email => "@._-",
        SemanticType::Currency => "$€£¥₹,.",
        _ => "",
    };
    chars.chars().collect()
}

/// Builds descriptors for every column of a table from inferred types.
pub fn infer_columns(table: &Table, sample_cap: usize, threshold: f64) -> Vec<ColumnDescriptor> {
    table
        .columns()
        .iter()
        .map(|key| {
            let values = table.column_values(key).unwrap_or_default();
            let inferred = infer_type_with_threshold(&values, sample_cap, threshold);
            ColumnDescriptor::new(key.clone(), inferred)
        })
        .collect()
}
