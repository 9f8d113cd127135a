//! Filter stage: row-admitting predicates.
//!
//! A row is admitted iff every predicate holds. A predicate whose column is
//! not part of the row is false. String comparisons ignore case; numeric and
//! date operators coerce the cell first and fail when it does not coerce.

use crate::model::CellValue;
use crate::table::{RowRef, Table};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum FilterOp {
    Equals(String),
    NotEquals(String),
    Contains(String),
    NotContains(String),
    StartsWith(String),
    EndsWith(String),
    GreaterThan(f64),
    LessThan(f64),
    /// Inclusive; passes whenever either bound is missing
    Between(Option<f64>, Option<f64>),
    In(Vec<String>),
    NotIn(Vec<String>),
    IsTrue,
    IsFalse,
    /// Inclusive; passes whenever either bound is missing
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Before(NaiveDate),
    After(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column: String,
    pub op: FilterOp,
}

impl FilterPredicate {
    pub fn new(column: impl Into<String>, op: FilterOp) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }
}

fn as_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_date(cell: &CellValue) -> Option<NaiveDate> {
    cell.as_datetime().map(|d| d.date())
}

fn truthiness(cell: &CellValue) -> Option<bool> {
    match cell {
        CellValue::Bool(b) => Some(*b),
        CellValue::Number(n) if *n == 1.0 => Some(true),
        CellValue::Number(n) if *n == 0.0 => Some(false),
        CellValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text_equals(cell: &CellValue, target: &str) -> bool {
    if let (Some(a), Ok(b)) = (as_number(cell), target.trim().parse::<f64>()) {
        return a == b;
    }
    cell.render().trim().to_lowercase() == target.trim().to_lowercase()
}

/// Evaluates one predicate against one row.
pub fn evaluate(predicate: &FilterPredicate, row: &RowRef<'_>) -> bool {
    let Some(cell) = row.get(&predicate.column) else {
        return false;
    };
    let text = || cell.render().to_lowercase();

    match &predicate.op {
        FilterOp::Equals(v) => text_equals(cell, v),
        FilterOp::NotEquals(v) => !text_equals(cell, v),
        FilterOp::Contains(v) => text().contains(&v.to_lowercase()),
        FilterOp::NotContains(v) => !text().contains(&v.to_lowercase()),
        FilterOp::StartsWith(v) => text().starts_with(&v.to_lowercase()),
        FilterOp::EndsWith(v) => text().ends_with(&v.to_lowercase()),
        FilterOp::GreaterThan(v) => as_number(cell).is_some_and(|n| n > *v),
        FilterOp::LessThan(v) => as_number(cell).is_some_and(|n| n < *v),
        FilterOp::Between(Some(lo), Some(hi)) => {
            as_number(cell).is_some_and(|n| n >= *lo && n <= *hi)
        }
        FilterOp::Between(..) => true,
        FilterOp::In(list) => list.iter().any(|v| text_equals(cell, v)),
        FilterOp::NotIn(list) => !list.iter().any(|v| text_equals(cell, v)),
        FilterOp::IsTrue => truthiness(cell) == Some(true),
        FilterOp::IsFalse => truthiness(cell) == Some(false),
        FilterOp::DateRange {
            from: Some(from),
            to: Some(to),
        } => as_date(cell).is_some_and(|d| d >= *from && d <= *to),
        FilterOp::DateRange { .. } => true,
        FilterOp::Before(limit) => as_date(cell).is_some_and(|d| d < *limit),
        FilterOp::After(limit) => as_date(cell).is_some_and(|d| d > *limit),
    }
}

/// Rows admitted by every predicate, in their original order.
pub fn filter_table(table: &Table, filters: &[FilterPredicate]) -> Table {
    if filters.is_empty() {
        return table.clone();
    }

    let rows = table
        .iter_rows()
        .filter(|row| filters.iter().all(|f| evaluate(f, row)))
        .map(|row| row.cells().to_vec())
        .collect();
    table.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        let date = |s: &str| CellValue::Date(
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time"),
        );
        Table::new(
            vec!["name".into(), "age".into(), "active".into(), "joined".into()],
            vec![
                vec![CellValue::text("Alice"), CellValue::Number(30.0), CellValue::Bool(true), date("2021-03-01")],
                vec![CellValue::text("bob"), CellValue::text("17"), CellValue::text("no"), CellValue::text("2023-07-15")],
                vec![CellValue::text("Carol"), CellValue::Empty, CellValue::text("yes"), CellValue::Empty],
            ],
        )
    }

    fn names(table: &Table) -> Vec<String> {
        table.column_values("name").unwrap_or_default()
    }

    #[test]
    fn test_string_operators_ignore_case() {
        let table = people();
        let f = |op| vec![FilterPredicate::new("name", op)];
        assert_eq!(names(&filter_table(&table, &f(FilterOp::Equals("ALICE".into())))), ["Alice"]);
        assert_eq!(names(&filter_table(&table, &f(FilterOp::Contains("O".into())))), ["bob", "Carol"]);
        assert_eq!(names(&filter_table(&table, &f(FilterOp::StartsWith("c".into())))), ["Carol"]);
        assert_eq!(names(&filter_table(&table, &f(FilterOp::EndsWith("CE".into())))), ["Alice"]);
        assert_eq!(
            names(&filter_table(&table, &f(FilterOp::NotIn(vec!["BOB".into(), "carol".into()])))),
            ["Alice"]
        );
    }

    #[test]
    fn test_numeric_coercion() {
        let table = people();
        let f = |op| vec![FilterPredicate::new("age", op)];
        assert_eq!(names(&filter_table(&table, &f(FilterOp::GreaterThan(18.0)))), ["Alice"]);
        assert_eq!(names(&filter_table(&table, &f(FilterOp::LessThan(18.0)))), ["bob"]);
        assert_eq!(
            names(&filter_table(&table, &f(FilterOp::Between(Some(17.0), Some(30.0))))),
            ["Alice", "bob"]
        );
        // Open range admits everything, even the empty cell.
        assert_eq!(filter_table(&table, &f(FilterOp::Between(Some(20.0), None))).len(), 3);
        assert_eq!(names(&filter_table(&table, &f(FilterOp::Equals("30.0".into())))), ["Alice"]);
    }

    #[test]
    fn test_booleans_and_dates() {
        let table = people();
        let active = vec![FilterPredicate::new("active", FilterOp::IsTrue)];
        assert_eq!(names(&filter_table(&table, &active)), ["Alice", "Carol"]);
        let inactive = vec![FilterPredicate::new("active", FilterOp::IsFalse)];
        assert_eq!(names(&filter_table(&table, &inactive)), ["bob"]);

        let cutoff = NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date");
        let before = vec![FilterPredicate::new("joined", FilterOp::Before(cutoff))];
        assert_eq!(names(&filter_table(&table, &before)), ["Alice"]);
        let after = vec![FilterPredicate::new("joined", FilterOp::After(cutoff))];
        assert_eq!(names(&filter_table(&table, &after)), ["bob"]);

        let range = vec![FilterPredicate::new("joined", FilterOp::DateRange {
            from: Some(cutoff),
            to: NaiveDate::from_ymd_opt(2023, 7, 15),
        })];
        assert_eq!(names(&filter_table(&table, &range)), ["bob"]);
    }

    #[test]
    fn test_missing_column_is_false() {
        let table = people();
        let filters = vec![FilterPredicate::new("nope", FilterOp::NotEquals("x".into()))];
        assert!(filter_table(&table, &filters).is_empty());
    }

    #[test]
    fn test_and_composition_is_order_independent() {
        let table = people();
        let a = FilterPredicate::new("name", FilterOp::NotContains("z".into()));
        let b = FilterPredicate::new("active", FilterOp::IsTrue);
        let ab = filter_table(&table, &[a.clone(), b.clone()]);
        let ba = filter_table(&table, &[b, a]);
        assert_eq!(ab, ba);
        assert_eq!(names(&ab), ["Alice", "Carol"]);
    }

    #[test]
    fn test_predicate_json_shape() {
        let pred = FilterPredicate::new("age", FilterOp::Between(Some(1.0), None));
        let json = serde_json::to_value(&pred).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "column": "age",
                "op": {"operator": "between", "value": [1.0, null]}
            })
        );

        let parsed: FilterPredicate =
            serde_json::from_str(r#"{"column":"active","op":{"operator":"isTrue"}}"#).expect("parse");
        assert_eq!(parsed.op, FilterOp::IsTrue);

        let parsed: FilterPredicate = serde_json::from_str(
            r#"{"column":"d","op":{"operator":"dateRange","value":{"from":"2024-01-01","to":null}}}"#,
        )
        .expect("parse");
        assert!(matches!(parsed.op, FilterOp::DateRange { from: Some(_), to: None }));
    }
}
