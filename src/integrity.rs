//! Data-quality checks for columns the reports treat as numeric or complete.
//!
//! Findings are warnings, never errors: the reports still run and SQLite's
//! own conversion rules decide how a bad value is ordered or aggregated.

use crate::core::Result;
use crate::reports::ReportStep;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{types::Value as SqlValue, Connection};
use std::fmt;

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("decimal pattern is valid")
});

/// A value that a report expected to be numeric or present but was not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIntegrityWarning {
    pub table: &'static str,
    /// Key of the offending row, rendered as text
    pub key: String,
    pub column: &'static str,
    /// The stored value, or `NULL`
    pub value: String,
    pub reason: String,
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}].{} = '{}': {}",
            self.table, self.key, self.column, self.value, self.reason
        )
    }
}

fn display(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
    }
}

enum NumericProblem {
    Missing,
    Malformed,
}

/// Why `value` cannot be read as a number, or `None` if it can.
fn numeric_problem(value: &SqlValue) -> Option<NumericProblem> {
    match value {
        SqlValue::Integer(_) | SqlValue::Real(_) => None,
        SqlValue::Text(s) if DECIMAL.is_match(s) => None,
        SqlValue::Null => Some(NumericProblem::Missing),
        SqlValue::Text(_) | SqlValue::Blob(_) => Some(NumericProblem::Malformed),
    }
}

fn date_problem(value: &SqlValue) -> Option<&'static str> {
    match value {
        SqlValue::Text(s)
            if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok() =>
        {
            None
        }
        SqlValue::Null => Some("missing"),
        _ => Some("not an ISO date"),
    }
}

/// Payments whose amount or date would be misread by the payment report.
///
/// A malformed amount is ordered by whatever SQLite's REAL cast makes of it:
/// its longest numeric prefix, or 0 when there is none. A missing amount
/// sorts after every number.
pub fn payment_warnings(conn: &Connection) -> Result<Vec<DataIntegrityWarning>> {
    let mut stmt = conn.prepare(
        "SELECT customerNumber, checkNumber, amount, CAST(amount AS REAL), paymentDate
         FROM payments ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, SqlValue>(0)?,
                row.get::<_, SqlValue>(1)?,
                row.get::<_, SqlValue>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, SqlValue>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut warnings = Vec::new();
    for (customer, check, amount, cast, date) in rows {
        let key = format!("{}/{}", display(&customer), display(&check));
        if let Some(problem) = numeric_problem(&amount) {
            let reason = match (problem, cast) {
                (NumericProblem::Malformed, Some(effective)) => {
                    format!("not a decimal number; ordered as {}", effective)
                }
                (NumericProblem::Malformed, None) => "not a decimal number; ordered last".to_string(),
                (NumericProblem::Missing, _) => "missing; ordered last".to_string(),
            };
            warnings.push(DataIntegrityWarning {
                table: "payments",
                key: key.clone(),
                column: "amount",
                value: display(&amount),
                reason,
            });
        }
        if let Some(problem) = date_problem(&date) {
            warnings.push(DataIntegrityWarning {
                table: "payments",
                key,
                column: "paymentDate",
                value: display(&date),
                reason: problem.to_string(),
            });
        }
    }
    Ok(warnings)
}

/// Customers with a sales representative whose credit limit the credit
/// report would skip (NULL) or average by its numeric prefix (malformed).
pub fn credit_limit_warnings(conn: &Connection) -> Result<Vec<DataIntegrityWarning>> {
    let mut stmt = conn.prepare(
        "SELECT customerNumber, creditLimit, CAST(creditLimit AS REAL) FROM customers
         WHERE salesRepEmployeeNumber IS NOT NULL
         ORDER BY customerNumber",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, SqlValue>(0)?,
                row.get::<_, SqlValue>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .filter_map(|(customer, limit, cast)| {
            let reason = match (numeric_problem(&limit)?, cast) {
                (NumericProblem::Malformed, Some(effective)) => {
                    format!("not a decimal number; averaged as {}", effective)
                }
                (NumericProblem::Malformed, None) | (NumericProblem::Missing, _) => {
                    "missing; ignored by the average".to_string()
                }
            };
            Some(DataIntegrityWarning {
                table: "customers",
                key: display(&customer),
                column: "creditLimit",
                value: display(&limit),
                reason,
            })
        })
        .collect())
}

/// The integrity checks relevant to one report.
pub fn warnings_for(conn: &Connection, step: ReportStep) -> Result<Vec<DataIntegrityWarning>> {
    match step {
        ReportStep::PaymentReport => payment_warnings(conn),
        ReportStep::TopCreditEmployees => credit_limit_warnings(conn),
        _ => Ok(Vec::new()),
    }
}
