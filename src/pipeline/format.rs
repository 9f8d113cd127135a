//! Format stage: display shaping of values, column-scoped and row-preserving.

use crate::model::CellValue;
use crate::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextCase {
    Upper,
    Lower,
    Title,
    Sentence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PadDirection {
    /// Pad before the text (right-aligned)
    Start,
    /// Pad after the text (left-aligned)
    #[default]
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberFormat {
    pub decimals: usize,
    pub thousands_separator: String,
    pub decimal_separator: String,
    pub prefix: String,
    pub suffix: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            thousands_separator: ",".to_owned(),
            decimal_separator: ".".to_owned(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

/// One built-in display formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Formatter {
    TextCase {
        mode: TextCase,
    },
    Number(NumberFormat),
    /// Number formatting with the symbol as prefix
    Currency {
        symbol: String,
        #[serde(default)]
        number: NumberFormat,
    },
    /// Value × 100 with a `%` suffix. Text already ending in `%` is not rescaled
    Percentage(NumberFormat),
    /// `X` tokens are replaced by the value's digits in order
    PhonePattern {
        pattern: String,
    },
    #[serde(rename_all = "camelCase")]
    FixedLength {
        length: usize,
        pad_char: char,
        direction: PadDirection,
        truncate_marker: String,
    },
}

/// A formatter bound to a set of columns; empty means every column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRule {
    #[serde(default)]
    pub columns: Vec<String>,
    pub formatter: Formatter,
}

impl FormatRule {
    pub fn new(columns: Vec<String>, formatter: Formatter) -> Self {
        Self { columns, formatter }
    }

    pub fn applies_to(&self, key: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == key)
    }
}

/// Formats one value. `None` when the formatter does not apply to it
/// (e.g. a numeric formatter on text that is not a number).
pub fn apply(formatter: &Formatter, cell: &CellValue) -> Option<String> {
    if cell.is_empty() {
        return None;
    }

    match formatter {
        Formatter::TextCase { mode } => match cell {
            CellValue::String(s) => Some(apply_case(s, *mode)),
            _ => None,
        },
        Formatter::Number(fmt) => cell_number(cell).map(|n| format_number(n, fmt)),
        Formatter::Currency { symbol, number } => cell_number(cell).map(|n| {
            let fmt = NumberFormat {
                prefix: symbol.clone(),
                ..number.clone()
            };
            format_number(n, &fmt)
        }),
        Formatter::Percentage(fmt) => {
            // Text that already carries `%` is already scaled.
            let scaled = matches!(cell, CellValue::String(s) if s.trim().ends_with('%'));
            cell_number(cell).map(|n| {
                let fmt = NumberFormat {
                    suffix: "%".to_owned(),
                    ..fmt.clone()
                };
                format_number(if scaled { n } else { n * 100.0 }, &fmt)
            })
        }
        Formatter::PhonePattern { pattern } => apply_pattern(&cell.render(), pattern),
        Formatter::FixedLength {
            length,
            pad_char,
            direction,
            truncate_marker,
        } => Some(fixed_length(
            &cell.render(),
            *length,
            *pad_char,
            *direction,
            truncate_marker,
        )),
    }
}

fn cell_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::String(s) => parse_number(s),
        _ => None,
    }
}

/// Lenient number parse: currency symbols, grouping commas, spaces and a
/// trailing `%` are ignored.
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|&c| !matches!(c, '$' | '€' | '£' | '¥' | '₹' | ',' | ' ' | '%'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn format_number(n: f64, fmt: &NumberFormat) -> String {
    let fixed = format!("{:.*}", fmt.decimals, n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push_str(&fmt.thousands_separator);
        }
        grouped.push(c);
    }

    let negative = n < 0.0 && fixed.chars().any(|c| matches!(c, '1'..='9'));
    let sign = if negative { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{sign}{}{grouped}{}", fmt.prefix, fmt.suffix)
    } else {
        format!(
            "{sign}{}{grouped}{}{frac_part}{}",
            fmt.prefix, fmt.decimal_separator, fmt.suffix
        )
    }
}

pub fn apply_case(value: &str, mode: TextCase) -> String {
    match mode {
        TextCase::Upper => value.to_uppercase(),
        TextCase::Lower => value.to_lowercase(),
        TextCase::Title => {
            let mut out = String::with_capacity(value.len());
            let mut at_word_start = true;
            for c in value.chars() {
                if c.is_alphanumeric() {
                    if at_word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    at_word_start = false;
                } else {
                    out.push(c);
                    at_word_start = c.is_whitespace() || c == '-';
                }
            }
            out
        }
        TextCase::Sentence => {
            let mut out = String::with_capacity(value.len());
            let mut capitalize = true;
            for c in value.chars() {
                if c.is_alphabetic() {
                    if capitalize {
                        out.extend(c.to_uppercase());
                        capitalize = false;
                    } else {
                        out.extend(c.to_lowercase());
                    }
                } else {
                    if matches!(c, '.' | '!' | '?') {
                        capitalize = true;
                    }
                    out.push(c);
                }
            }
            out
        }
    }
}

/// Fills `X` tokens with digits; unfilled tokens are dropped along with any
/// trailing separators, and leftover digits are appended.
pub fn apply_pattern(value: &str, pattern: &str) -> Option<String> {
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let mut next = digits.iter();
    let mut out = String::with_capacity(pattern.len());
    let mut exhausted = false;
    for token in pattern.chars() {
        if token == 'X' {
            match next.next() {
                Some(d) => out.push(*d),
                None => exhausted = true,
            }
        } else if !exhausted {
            out.push(token);
        }
    }

    if exhausted {
        let trimmed = out.trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != ')');
        out = trimmed.to_owned();
    }
    out.extend(next);
    Some(out)
}

pub fn fixed_length(
    value: &str,
    length: usize,
    pad_char: char,
    direction: PadDirection,
    truncate_marker: &str,
) -> String {
    let count = value.chars().count();
    if count > length {
        let marker_len = truncate_marker.chars().count();
        if marker_len >= length {
            return value.chars().take(length).collect();
        }
        let mut out: String = value.chars().take(length - marker_len).collect();
        out.push_str(truncate_marker);
        out
    } else {
        let padding: String = std::iter::repeat_n(pad_char, length - count).collect();
        match direction {
            PadDirection::Start => format!("{padding}{value}"),
            PadDirection::End => format!("{value}{padding}"),
        }
    }
}

/// Runs every rule in order over its columns. Returns the new table and the
/// number of cells whose value changed.
pub fn format_table(table: &Table, rules: &[FormatRule]) -> (Table, usize) {
    if rules.is_empty() {
        return (table.clone(), 0);
    }

    let per_column: Vec<Vec<&Formatter>> = table
        .columns()
        .iter()
        .map(|key| {
            rules
                .iter()
                .filter(|r| r.applies_to(key))
                .map(|r| &r.formatter)
                .collect()
        })
        .collect();

    let mut changed = 0;
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&per_column)
                .map(|(cell, formatters)| {
                    let out = formatters.iter().fold(cell.clone(), |acc, f| {
                        match apply(f, &acc) {
                            Some(s) if s != acc.render() => CellValue::String(s),
                            _ => acc,
                        }
                    });
                    if out != *cell {
                        changed += 1;
                    }
                    out
                })
                .collect()
        })
        .collect();

    (table.with_rows(rows), changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format() {
        let fmt = NumberFormat::default();
        assert_eq!(format_number(1234567.891, &fmt), "1,234,567.89");
        assert_eq!(format_number(-1234.5, &fmt), "-1,234.50");
        assert_eq!(format_number(-0.001, &fmt), "0.00");

        let euro = NumberFormat {
            decimals: 1,
            thousands_separator: ".".into(),
            decimal_separator: ",".into(),
            prefix: String::new(),
            suffix: " €".into(),
        };
        assert_eq!(format_number(1234.56, &euro), "1.234,6 €");

        let whole = NumberFormat {
            decimals: 0,
            ..Default::default()
        };
        assert_eq!(format_number(999.0, &whole), "999");
        assert_eq!(format_number(1000.0, &whole), "1,000");
    }

    #[test]
    fn test_currency_and_percentage() {
        let currency = Formatter::Currency {
            symbol: "$".into(),
            number: NumberFormat::default(),
        };
        assert_eq!(
            apply(&currency, &CellValue::text("$1,200")),
            Some("$1,200.00".to_owned())
        );
        assert_eq!(
            apply(&currency, &CellValue::Number(-5.0)),
            Some("-$5.00".to_owned())
        );
        assert_eq!(apply(&currency, &CellValue::text("n/a")), None);

        let pct = Formatter::Percentage(NumberFormat {
            decimals: 1,
            ..Default::default()
        });
        assert_eq!(apply(&pct, &CellValue::Number(0.256)), Some("25.6%".to_owned()));
        assert_eq!(apply(&pct, &CellValue::text("25.6%")), Some("25.6%".to_owned()));
        assert_eq!(apply(&pct, &CellValue::text("0.256")), Some("25.6%".to_owned()));
    }

    #[test]
    fn test_text_case() {
        assert_eq!(apply_case("hello WORLD", TextCase::Upper), "HELLO WORLD");
        assert_eq!(apply_case("hello WORLD", TextCase::Lower), "hello world");
        assert_eq!(apply_case("mary-jane o'neil", TextCase::Title), "Mary-Jane O'neil");
        assert_eq!(
            apply_case("first ONE. second one", TextCase::Sentence),
            "First one. Second one"
        );
    }

    #[test]
    fn test_phone_pattern() {
        let pattern = "(XXX) XXX-XXXX";
        assert_eq!(
            apply_pattern("5551234567", pattern),
            Some("(555) 123-4567".to_owned())
        );
        assert_eq!(
            apply_pattern("555123456789", pattern),
            Some("(555) 123-456789".to_owned())
        );
        assert_eq!(apply_pattern("55512", pattern), Some("(555) 12".to_owned()));
        assert_eq!(apply_pattern("none", pattern), None);
    }

    #[test]
    fn test_fixed_length() {
        assert_eq!(fixed_length("abcdefgh", 5, ' ', PadDirection::End, "…"), "abcd…");
        assert_eq!(fixed_length("abc", 5, '0', PadDirection::Start, "…"), "00abc");
        assert_eq!(fixed_length("abc", 5, '.', PadDirection::End, ""), "abc..");
        assert_eq!(fixed_length("abcdef", 2, ' ', PadDirection::End, "..."), "ab");
    }

    #[test]
    fn test_format_table_scopes_rules() {
        let table = Table::new(
            vec!["name".into(), "score".into()],
            vec![vec![CellValue::text("ada"), CellValue::Number(0.5)]],
        );
        let rules = vec![
            FormatRule::new(vec!["name".into()], Formatter::TextCase {
                mode: TextCase::Upper,
            }),
            FormatRule::new(
                vec!["score".into()],
                Formatter::Percentage(NumberFormat {
                    decimals: 0,
                    ..Default::default()
                }),
            ),
        ];
        let (out, changed) = format_table(&table, &rules);
        assert_eq!(out.value(0, "name"), Some(&CellValue::text("ADA")));
        assert_eq!(out.value(0, "score"), Some(&CellValue::text("50%")));
        assert_eq!(changed, 2);
        assert_eq!(out.len(), table.len());
    }

    #[test]
    fn test_formatter_serde() {
        let rule = FormatRule::new(vec![], Formatter::FixedLength {
            length: 4,
            pad_char: ' ',
            direction: PadDirection::Start,
            truncate_marker: "~".into(),
        });
        let json = serde_json::to_string(&rule).expect("serialize");
        assert!(json.contains("\"kind\":\"fixedLength\""));
        assert!(json.contains("\"padChar\":\" \""));
        let back: FormatRule = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, rule);
    }
}
