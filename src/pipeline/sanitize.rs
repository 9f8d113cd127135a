//! Sanitize stage: destructive, row-preserving value cleanup.
//!
//! Every built-in cleanup is a variant of [`Sanitizer`] carrying its own
//! settings, and [`apply`] is the single dispatcher. [`plan`] turns a column
//! descriptor plus [`SanitizationOptions`] into the ordered chain for that
//! column; [`sanitize_table`] runs the chains and builds a new table.

use super::spec::{PolicyNumberOptions, SanitizationOptions, SpecialCharMode, SsnFormat, ZipCountry};
use crate::inference;
use crate::model::{CellValue, ColumnDescriptor, SemanticType};
use crate::table::Table;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::LazyLock;

const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₹'];

// Stand-in for line breaks while tags and whitespace are rewritten.
const BREAK_MARK: char = '\u{1}';

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(br\s*/?|/?\s*(p|div|li|tr|h[1-6]|ul|ol|table|blockquote|pre)(\s[^>]*)?)\s*>")
        .expect("valid block tag regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static HSPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid whitespace regex"));

static EXCESS_BREAKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid line break regex"));

static EXTENDED_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{5})-\d{4}$").expect("valid extended zip regex"));

static MASKED_SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\*{4}$").expect("valid masked ssn regex"));

/// One built-in cleanup step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sanitizer {
    Trim,
    StripHtml { preserve_line_breaks: bool },
    /// Preserve set comes from the column descriptor
    SpecialChars { mode: SpecialCharMode },
    Zip { country: ZipCountry, extended: bool },
    Phone,
    Email,
    Currency,
    Ssn { format: SsnFormat },
    Date { format: String },
    PolicyNumber(PolicyNumberOptions),
    /// Per-value shape detection for columns without a specific type
    AutoDetect {
        zip: Option<(ZipCountry, bool)>,
        phone: bool,
        email: bool,
        currency: bool,
    },
}

impl Sanitizer {
    /// Whether the step also runs on numeric cells (rendered to text first).
    /// Identifier-like formats and amounts lose their punctuation when a
    /// source stores them as numbers.
    fn accepts_numbers(&self) -> bool {
        matches!(
            self,
            Self::Zip { .. }
                | Self::Phone
                | Self::Ssn { .. }
                | Self::PolicyNumber(_)
                | Self::Currency
        )
    }
}

/// Applies one sanitizer to a string value.
pub fn apply(stage: &Sanitizer, descriptor: &ColumnDescriptor, value: &str) -> String {
    match stage {
        Sanitizer::Trim => value.trim().to_owned(),
        Sanitizer::StripHtml {
            preserve_line_breaks,
        } => strip_html(value, *preserve_line_breaks),
        Sanitizer::SpecialChars { mode } => {
            strip_special_chars(value, &descriptor.preserve_chars, *mode)
        }
        Sanitizer::Zip { country, extended } => format_zip(value, *country, *extended),
        Sanitizer::Phone => format_phone(value),
        Sanitizer::Email => normalize_email(value),
        Sanitizer::Currency => format_currency(value),
        Sanitizer::Ssn { format } => format_ssn(value, *format),
        Sanitizer::Date { format } => format_date(value, format),
        Sanitizer::PolicyNumber(options) => format_policy_number(value, options),
        Sanitizer::AutoDetect {
            zip,
            phone,
            email,
            currency,
        } => match inference::detect_value_shape(value) {
            Some(SemanticType::Email) if *email => normalize_email(value),
            Some(SemanticType::Currency) if *currency => format_currency(value),
            Some(SemanticType::Phone) if *phone => format_phone(value),
            Some(SemanticType::Zipcode) => match zip {
                Some((country, extended)) => format_zip(value, *country, *extended),
                None => value.to_owned(),
            },
            _ => value.to_owned(),
        },
    }
}

/// Ordered sanitizer chain for one column.
///
/// Order: html, trim, special characters, then either the policy-number
/// reshaper or the formatter for the column's effective type. Columns whose
/// type is `text` or `auto` get per-value shape detection instead when
/// `per_value_fallback` is on.
pub fn plan(descriptor: &ColumnDescriptor, options: &SanitizationOptions) -> Vec<Sanitizer> {
    let mut chain = Vec::new();
    if !options.enabled || !descriptor.sanitize || !options.in_scope(&descriptor.key) {
        return chain;
    }

    if options.strip_html {
        chain.push(Sanitizer::StripHtml {
            preserve_line_breaks: options.preserve_line_breaks,
        });
    }
    if options.trim_whitespace {
        chain.push(Sanitizer::Trim);
    }
    if options.remove_special_chars {
        chain.push(Sanitizer::SpecialChars {
            mode: options.special_char_mode,
        });
    }

    if let Some(policy) = &options.policy_number
        && (policy.columns.is_empty() || policy.columns.contains(&descriptor.key))
    {
        chain.push(Sanitizer::PolicyNumber(policy.clone()));
        return chain;
    }

    let typed = match descriptor.effective_type() {
        SemanticType::Zipcode if options.format_zip_codes => Some(Sanitizer::Zip {
            country: options.zip_country,
            extended: options.zip_extended,
        }),
        SemanticType::Phone if options.format_phones => Some(Sanitizer::Phone),
        SemanticType::Email if options.normalize_emails => Some(Sanitizer::Email),
        SemanticType::Currency if options.format_currency => Some(Sanitizer::Currency),
        SemanticType::Ssn if options.format_ssn => Some(Sanitizer::Ssn {
            format: options.ssn_format,
        }),
        SemanticType::Date => options
            .date_format
            .as_ref()
            .map(|format| Sanitizer::Date {
                format: format.clone(),
            }),
        SemanticType::Text | SemanticType::Auto if options.per_value_fallback => {
            Some(Sanitizer::AutoDetect {
                zip: options
                    .format_zip_codes
                    .then_some((options.zip_country, options.zip_extended)),
                phone: options.format_phones,
                email: options.normalize_emails,
                currency: options.format_currency,
            })
        }
        _ => None,
    };
    chain.extend(typed);
    chain
}

/// Runs a chain over one cell. Returns `None` when nothing changed.
fn sanitize_cell(
    cell: &CellValue,
    chain: &[Sanitizer],
    descriptor: &ColumnDescriptor,
) -> Option<CellValue> {
    let mut current = cell.clone();
    for stage in chain {
        let input = match (&current, stage) {
            (CellValue::Date(_), Sanitizer::Date { .. }) => current.render(),
            (CellValue::String(s), _) => s.clone(),
            (CellValue::Number(n), Sanitizer::Currency) if n.fract() != 0.0 => format!("{n:.2}"),
            (CellValue::Number(_), stage) if stage.accepts_numbers() => current.render(),
            _ => continue,
        };
        let output = match (&current, stage) {
            // Date cells are formatted from the stored value, not the render.
            (CellValue::Date(d), Sanitizer::Date { format }) => {
                write_date(*d, format).unwrap_or_else(|| input.clone())
            }
            _ => apply(stage, descriptor, &input),
        };
        if output != input {
            current = CellValue::String(output);
        }
    }
    (current != *cell).then_some(current)
}

/// Removes characters that are not alphanumeric, whitespace, or preserved.
pub fn strip_special_chars(value: &str, preserve: &BTreeSet<char>, mode: SpecialCharMode) -> String {
    let keep = |c: char| c.is_alphanumeric() || c.is_whitespace() || preserve.contains(&c);
    match mode {
        SpecialCharMode::Remove => value.chars().filter(|&c| keep(c)).collect(),
        SpecialCharMode::ReplaceWithSpace => {
            let replaced: String = value
                .chars()
                .map(|c| if keep(c) { c } else { ' ' })
                .collect();
            replaced.split_whitespace().collect::<Vec<_>>().join(" ")
        }
    }
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn alphanumerics(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn format_zip(value: &str, country: ZipCountry, extended: bool) -> String {
    match country {
        ZipCountry::Us => {
            let digits = digits(value);
            if digits.is_empty() {
                value.to_owned()
            } else if digits.len() < 5 {
                format!("{digits:0>5}")
            } else if extended && digits.len() >= 9 {
                format!("{}-{}", &digits[..5], &digits[5..9])
            } else {
                digits[..5].to_owned()
            }
        }
        // A1A 1A1
        ZipCountry::Ca => {
            let code = alphanumerics(value);
            if code.len() == 6 {
                format!("{} {}", &code[..3], &code[3..])
            } else {
                value.trim().to_uppercase()
            }
        }
        // Outward code, space, three-character inward code.
        ZipCountry::Uk => {
            let code = alphanumerics(value);
            if (5..=7).contains(&code.len()) {
                let split = code.len() - 3;
                format!("{} {}", &code[..split], &code[split..])
            } else {
                value.trim().to_uppercase()
            }
        }
        ZipCountry::Other => value.trim().to_owned(),
    }
}

/// `NNN-NNN-NNNN` for ten digits (eleven with a leading `1`), `NNN-NNNN`
/// with any remainder prefixed for shorter numbers.
pub fn format_phone(value: &str) -> String {
    let mut digits = digits(value);
    if digits.len() == 11 && digits.starts_with('1') {
        digits.remove(0);
    }

    match digits.len() {
        10 => format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        7 => format!("{}-{}", &digits[..3], &digits[3..]),
        8 | 9 => {
            let split = digits.len() - 7;
            format!(
                "{}-{}-{}",
                &digits[..split],
                &digits[split..split + 3],
                &digits[split + 3..]
            )
        }
        _ => value.to_owned(),
    }
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Prefixes `$` unless a currency symbol is already present.
pub fn format_currency(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.contains(&CURRENCY_SYMBOLS[..])
        || !trimmed.chars().any(|c| c.is_ascii_digit())
    {
        value.to_owned()
    } else {
        format!("${trimmed}")
    }
}

pub fn format_ssn(value: &str, format: SsnFormat) -> String {
    if format == SsnFormat::Masked && MASKED_SSN_RE.is_match(value.trim()) {
        return value.trim().to_owned();
    }

    let mut digits = digits(value);
    if digits.is_empty() {
        return value.to_owned();
    }
    digits.truncate(9);
    let digits = format!("{digits:0>9}");

    match format {
        SsnFormat::Dashed => format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..]),
        SsnFormat::DigitsOnly => digits,
        SsnFormat::Masked => format!("{}-{}-****", &digits[..3], &digits[3..5]),
    }
}

/// Block-level tags become line breaks, remaining tags are dropped and the
/// common named entities decoded.
pub fn strip_html(value: &str, preserve_line_breaks: bool) -> String {
    let mark = if preserve_line_breaks {
        BREAK_MARK.to_string()
    } else {
        " ".to_owned()
    };

    let text = value.replace("\r\n", "\n").replace('\n', &mark);
    let text = BLOCK_TAG_RE.replace_all(&text, mark.as_str());
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = HSPACE_RE.replace_all(&text, " ");

    let lines: Vec<&str> = text.split(BREAK_MARK).map(str::trim).collect();
    let text = lines.join("\n");
    EXCESS_BREAKS_RE.replace_all(&text, "\n\n").trim().to_owned()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Reformats a date cell. Values that do not parse, or a pattern chrono
/// rejects, leave the value unchanged.
pub fn format_date(value: &str, format: &str) -> String {
    crate::model::parse_date(value)
        .and_then(|d| write_date(d, format))
        .unwrap_or_else(|| value.to_owned())
}

fn write_date(date: chrono::NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}

/// Strips non-alphanumerics and re-segments.
///
/// Exactly ten digits with `auto_detect` on always become `NNN-NNN-NNNN`,
/// whatever the configured segments and separator are.
pub fn format_policy_number(value: &str, options: &PolicyNumberOptions) -> String {
    let cleaned = alphanumerics(value);
    if cleaned.is_empty() {
        return value.to_owned();
    }

    if options.auto_detect && cleaned.len() == 10 && cleaned.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}-{}-{}", &cleaned[..3], &cleaned[3..6], &cleaned[6..]);
    }

    let mut parts = Vec::new();
    let mut rest = cleaned.as_str();
    for &len in options.segments.iter().filter(|&&len| len > 0) {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(len.min(rest.len()));
        parts.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts.join(&options.separator)
}

/// Cuts an `NNNNN-NNNN` value to its first five digits.
pub fn strip_zip_extension(value: &str) -> Option<String> {
    EXTENDED_ZIP_RE
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Sanitizes every cell of a table, returning the new table and the number
/// of cells that changed.
///
/// The `sanitize_zip_codes` rule runs on every column the options are enabled
/// for, ignoring the scope list and the column type.
pub fn sanitize_table(
    table: &Table,
    descriptors: &[ColumnDescriptor],
    options: &SanitizationOptions,
) -> (Table, usize) {
    let columns: Vec<(ColumnDescriptor, Vec<Sanitizer>)> = table
        .columns()
        .iter()
        .map(|key| {
            let descriptor = descriptors
                .iter()
                .find(|d| &d.key == key)
                .cloned()
                .unwrap_or_else(|| ColumnDescriptor::new(key.clone(), SemanticType::Auto));
            let chain = plan(&descriptor, options);
            (descriptor, chain)
        })
        .collect();

    for (descriptor, chain) in &columns {
        if !chain.is_empty() {
            tracing::trace!("Sanitize plan for '{}': {chain:?}", descriptor.key);
        }
    }

    let strip_extensions = options.enabled && options.sanitize_zip_codes && !options.zip_extended;
    let mut changed = 0;

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&columns)
                .map(|(cell, (descriptor, chain))| {
                    let mut value = sanitize_cell(cell, chain, descriptor);

                    if strip_extensions && descriptor.sanitize {
                        let short = match value.as_ref().unwrap_or(cell) {
                            CellValue::String(s) => strip_zip_extension(s),
                            _ => None,
                        };
                        if let Some(short) = short {
                            value = Some(CellValue::String(short));
                        }
                    }

                    match value {
                        Some(new) => {
                            changed += 1;
                            new
                        }
                        None => cell.clone(),
                    }
                })
                .collect()
        })
        .collect();

    (table.with_rows(rows), changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(t: SemanticType) -> ColumnDescriptor {
        ColumnDescriptor::new("col", t)
    }

    #[test]
    fn test_zip_us() {
        assert_eq!(format_zip("12345-6789", ZipCountry::Us, false), "12345");
        assert_eq!(format_zip("12345-6789", ZipCountry::Us, true), "12345-6789");
        assert_eq!(format_zip("2134", ZipCountry::Us, false), "02134");
        assert_eq!(format_zip("12345", ZipCountry::Us, false), "12345");
        assert_eq!(format_zip("n/a", ZipCountry::Us, false), "n/a");
    }

    #[test]
    fn test_zip_other_countries() {
        assert_eq!(format_zip("k1a0b1", ZipCountry::Ca, false), "K1A 0B1");
        assert_eq!(format_zip("K1A 0B1", ZipCountry::Ca, false), "K1A 0B1");
        assert_eq!(format_zip("sw1a1aa", ZipCountry::Uk, false), "SW1A 1AA");
        assert_eq!(format_zip(" 75008 ", ZipCountry::Other, false), "75008");
    }

    #[test]
    fn test_phone() {
        assert_eq!(format_phone("1234567890"), "123-456-7890");
        assert_eq!(format_phone("11234567890"), "123-456-7890");
        assert_eq!(format_phone("(555) 123-4567"), "555-123-4567");
        assert_eq!(format_phone("5551234"), "555-1234");
        assert_eq!(format_phone("12345678"), "1-234-5678");
        assert_eq!(format_phone("ext"), "ext");
    }

    #[test]
    fn test_email_and_currency() {
        assert_eq!(normalize_email("  Bob@Example.COM "), "bob@example.com");
        assert_eq!(format_currency("12.50"), "$12.50");
        assert_eq!(format_currency("€12.50"), "€12.50");
        assert_eq!(format_currency("$12.50"), "$12.50");
        assert_eq!(format_currency("n/a"), "n/a");
    }

    #[test]
    fn test_ssn_formats() {
        assert_eq!(format_ssn("123456789", SsnFormat::Masked), "123-45-****");
        assert_eq!(format_ssn("123-45-****", SsnFormat::Masked), "123-45-****");
        assert_eq!(format_ssn("123456789", SsnFormat::Dashed), "123-45-6789");
        assert_eq!(format_ssn("123-45-6789", SsnFormat::Dashed), "123-45-6789");
        assert_eq!(format_ssn("123-45-6789", SsnFormat::DigitsOnly), "123456789");
        assert_eq!(format_ssn("12345678", SsnFormat::Dashed), "012-34-5678");
    }

    #[test]
    fn test_special_chars_modes() {
        let preserve: BTreeSet<char> = "-".chars().collect();
        assert_eq!(
            strip_special_chars("a*b  #c-d", &preserve, SpecialCharMode::ReplaceWithSpace),
            "a b c-d"
        );
        assert_eq!(
            strip_special_chars("a*b#c-d", &preserve, SpecialCharMode::Remove),
            "abc-d"
        );
        assert_eq!(
            strip_special_chars("café!", &BTreeSet::new(), SpecialCharMode::Remove),
            "café"
        );
    }

    #[test]
    fn test_strip_html() {
        let html = "<p>Hello&nbsp;<b>world</b></p><p>Tom &amp; Jerry</p><br><br><br><br>end";
        assert_eq!(strip_html(html, true), "Hello world\n\nTom & Jerry\n\nend");
        assert_eq!(
            strip_html("<div>a</div><div>b</div>", false),
            "a b"
        );
        assert_eq!(strip_html("&lt;tag&gt; &quot;x&quot; &#39;y&#39;", true), "<tag> \"x\" 'y'");
    }

    #[test]
    fn test_policy_number() {
        let options = PolicyNumberOptions {
            segments: vec![2, 4],
            separator: "/".to_owned(),
            ..Default::default()
        };
        // Ten digits ignore the configured template.
        assert_eq!(format_policy_number("1234567890", &options), "123-456-7890");
        assert_eq!(format_policy_number("ab-1234-xyz", &options), "AB/1234/XYZ");

        let manual = PolicyNumberOptions {
            auto_detect: false,
            ..options
        };
        assert_eq!(format_policy_number("1234567890", &manual), "12/3456/7890");
    }

    #[test]
    fn test_date_format() {
        assert_eq!(format_date("01/05/2024", "%d %b %Y"), "05 Jan 2024");
        assert_eq!(format_date("soon", "%Y"), "soon");
        assert_eq!(format_date("2024-01-05", "%Q"), "2024-01-05");
    }

    #[test]
    fn test_plan_order_and_dispatch() {
        let options = SanitizationOptions {
            strip_html: true,
            remove_special_chars: true,
            ..Default::default()
        };
        let chain = plan(&descriptor(SemanticType::Phone), &options);
        assert_eq!(chain, [
            Sanitizer::StripHtml {
                preserve_line_breaks: true
            },
            Sanitizer::Trim,
            Sanitizer::SpecialChars {
                mode: SpecialCharMode::ReplaceWithSpace
            },
            Sanitizer::Phone,
        ]);

        let number = plan(&descriptor(SemanticType::Number), &SanitizationOptions::default());
        assert_eq!(number, [Sanitizer::Trim]);

        let mut skipped = descriptor(SemanticType::Phone);
        skipped.sanitize = false;
        assert!(plan(&skipped, &options).is_empty());
    }

    #[test]
    fn test_auto_detect_per_value() {
        let options = SanitizationOptions::default();
        let desc = descriptor(SemanticType::Text);
        let chain = plan(&desc, &options);
        let run = |v: &str| {
            chain
                .iter()
                .fold(v.to_owned(), |acc, stage| apply(stage, &desc, &acc))
        };
        assert_eq!(run(" A@B.com "), "a@b.com");
        assert_eq!(run("(555) 123-4567"), "555-123-4567");
        assert_eq!(run("hello"), "hello");
    }

    #[test]
    fn test_global_zip_rule_ignores_type_and_scope() {
        let table = Table::new(
            vec!["notes".into(), "zip".into()],
            vec![vec![CellValue::text("12345-6789"), CellValue::text("12345-6789")]],
        );
        let descriptors = [
            ColumnDescriptor::new("notes", SemanticType::Number),
            ColumnDescriptor::new("zip", SemanticType::Zipcode),
        ];

        let options = SanitizationOptions {
            columns: vec!["zip".into()],
            sanitize_zip_codes: true,
            ..Default::default()
        };
        let (out, changed) = sanitize_table(&table, &descriptors, &options);
        assert_eq!(out.value(0, "notes"), Some(&CellValue::text("12345")));
        assert_eq!(out.value(0, "zip"), Some(&CellValue::text("12345")));
        assert_eq!(changed, 2);

        let extended = SanitizationOptions {
            zip_extended: true,
            ..options
        };
        let (out, _) = sanitize_table(&table, &descriptors, &extended);
        assert_eq!(out.value(0, "notes"), Some(&CellValue::text("12345-6789")));
        assert_eq!(out.value(0, "zip"), Some(&CellValue::text("12345-6789")));
    }

    #[test]
    fn test_numeric_cells() {
        let table = Table::new(
            vec!["phone".into(), "age".into()],
            vec![vec![CellValue::Number(5551234567.0), CellValue::Number(30.0)]],
        );
        let descriptors = [
            ColumnDescriptor::new("phone", SemanticType::Phone),
            ColumnDescriptor::new("age", SemanticType::Number),
        ];
        let options = SanitizationOptions {
            remove_special_chars: true,
            ..Default::default()
        };
        let (out, changed) = sanitize_table(&table, &descriptors, &options);
        assert_eq!(out.value(0, "phone"), Some(&CellValue::text("555-123-4567")));
        assert_eq!(out.value(0, "age"), Some(&CellValue::Number(30.0)));
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_numeric_amounts_keep_cents() {
        let table = Table::new(
            vec!["price".into()],
            vec![
                vec![CellValue::Number(12.5)],
                vec![CellValue::Number(40.0)],
                vec![CellValue::text("€3.20")],
            ],
        );
        let descriptors = [ColumnDescriptor::new("price", SemanticType::Currency)];
        let (out, changed) = sanitize_table(&table, &descriptors, &SanitizationOptions::default());
        assert_eq!(out.value(0, "price"), Some(&CellValue::text("$12.50")));
        assert_eq!(out.value(1, "price"), Some(&CellValue::text("$40")));
        assert_eq!(out.value(2, "price"), Some(&CellValue::text("€3.20")));
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let table = Table::new(
            vec!["zip".into(), "ssn".into(), "email".into()],
            vec![vec![
                CellValue::text(" 2134 "),
                CellValue::text("123456789"),
                CellValue::text("X@Y.COM"),
            ]],
        );
        let descriptors = [
            ColumnDescriptor::new("zip", SemanticType::Zipcode),
            ColumnDescriptor::new("ssn", SemanticType::Ssn),
            ColumnDescriptor::new("email", SemanticType::Email),
        ];
        let options = SanitizationOptions {
            remove_special_chars: true,
            sanitize_zip_codes: true,
            ..Default::default()
        };
        let (once, _) = sanitize_table(&table, &descriptors, &options);
        let (twice, changed) = sanitize_table(&once, &descriptors, &options);
        assert_eq!(once, twice);
        assert_eq!(changed, 0);
        assert_eq!(once.value(0, "zip"), Some(&CellValue::text("02134")));
        assert_eq!(once.value(0, "ssn"), Some(&CellValue::text("123-45-6789")));
    }

    #[test]
    fn test_disabled_options_leave_table_alone() {
        let table = Table::new(
            vec!["zip".into()],
            vec![vec![CellValue::text(" 12345-6789 ")]],
        );
        let options = SanitizationOptions {
            enabled: false,
            sanitize_zip_codes: true,
            ..Default::default()
        };
        let (out, changed) = sanitize_table(&table, &[], &options);
        assert_eq!(out, table);
        assert_eq!(changed, 0);
    }
}
