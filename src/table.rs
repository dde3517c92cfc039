//! Result Table Module
//!
//! Turns a raw result set into a typed, in-memory table and renders it for
//! the terminal. Column order follows the query's select list and row order
//! follows its ORDER BY clause (engine-defined when there is none).

use crate::core::db::RawResultSet;
use crate::core::{ReportError, Result};
use rusqlite::types::Value as SqlValue;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Decimal(d) => serializer.serialize_f64(*d),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl Value {
    /// Returns the value as an integer, if it is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl TryFrom<SqlValue> for Value {
    type Error = ReportError;

    fn try_from(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Integer(i) => Ok(Value::Integer(i)),
            SqlValue::Real(d) => Ok(Value::Decimal(d)),
            SqlValue::Text(s) => Ok(Value::Text(s)),
            SqlValue::Blob(b) => Err(ReportError::Query(format!(
                "Unsupported BLOB value ({} bytes) in report result",
                b.len()
            ))),
        }
    }
}

/// An in-memory result table with named columns and ordered rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(ReportError::Query(format!(
                "Row {} has {} values but the result has {} columns",
                bad,
                rows[bad].len(),
                columns.len()
            )));
        }
        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of `name` in the select list
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The value of column `name` in row `row`
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of column `name`, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Re-serializes every row as `(column, value)` pairs in select-list order.
    pub fn to_pairs(&self) -> Vec<Vec<(String, Value)>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Rows in a canonical order, for comparing results of unordered queries.
    pub fn sorted_rows(&self) -> Vec<Vec<Value>> {
        let mut rows = self.rows.clone();
        rows.sort_by_cached_key(|row| row.iter().map(|v| v.to_string()).collect::<Vec<_>>());
        rows
    }
}

/// Converts a raw result set into a typed table.
///
/// # Errors
///
/// Returns `ReportError::Query` when a cell holds a BLOB, which no report selects.
pub fn materialize(raw: RawResultSet) -> Result<Table> {
    let rows = raw
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(Value::try_from).collect::<Result<Vec<_>>>())
        .collect::<Result<Vec<_>>>()?;
    Table::new(raw.columns, rows)
}

/// Output formats understood by [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(ReportError::Config(format!(
                "Unsupported export format: '{}'. Supported formats: table, csv, json, markdown",
                s
            ))),
        }
    }
}

/// Renders the table as an aligned grid with an underlined header.
pub fn render(table: &Table) -> String {
    if table.columns.is_empty() {
        return String::new();
    }
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(|v| v.to_string()).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect();
        padded.join(" | ").trim_end().to_string()
    };

    let mut output = String::new();
    output.push_str(&line(&table.columns));
    output.push('\n');
    let underline: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&underline.join("-|-"));
    output.push('\n');
    for row in &cells {
        output.push_str(&line(row));
        output.push('\n');
    }
    output
}

/// Exports the table in the given format.
pub fn export(table: &Table, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render(table)),
        OutputFormat::Csv => Ok(export_to_csv(table)),
        OutputFormat::Json => export_to_json(table),
        OutputFormat::Markdown => Ok(export_to_markdown(table)),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn export_to_csv(table: &Table) -> String {
    let mut output = String::new();
    let header: Vec<String> = table.columns.iter().map(|c| csv_field(c)).collect();
    output.push_str(&header.join(","));
    output.push('\n');
    for row in &table.rows {
        let fields: Vec<String> = row
            .iter()
            .map(|v| if v.is_null() { String::new() } else { csv_field(&v.to_string()) })
            .collect();
        output.push_str(&fields.join(","));
        output.push('\n');
    }
    output
}

/// One row serialized as a JSON object whose keys follow the select list.
struct JsonRow<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

fn export_to_json(table: &Table) -> Result<String> {
    let rows: Vec<JsonRow<'_>> = table
        .rows
        .iter()
        .map(|values| JsonRow {
            columns: &table.columns,
            values,
        })
        .collect();
    Ok(serde_json::to_string(&rows)?)
}

fn export_to_markdown(table: &Table) -> String {
    let mut output = String::new();
    output.push_str(&format!("| {} |\n", table.columns.join(" | ")));
    let underline: Vec<&str> = table.columns.iter().map(|_| "---").collect();
    output.push_str(&format!("| {} |\n", underline.join(" | ")));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string().replace('|', "\\|")).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["officeCode".to_string(), "city".to_string(), "n_customers".to_string()],
            vec![
                vec!["1".into(), "San Francisco".into(), Value::Integer(6)],
                vec!["4".into(), "Paris".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_materialize_maps_storage_classes() {
        let raw = RawResultSet {
            columns: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            rows: vec![vec![
                SqlValue::Integer(7),
                SqlValue::Real(1.5),
                SqlValue::Text("6066.78".into()),
                SqlValue::Null,
            ]],
        };
        let table = materialize(raw).unwrap();
        assert_eq!(
            table.rows()[0],
            vec![
                Value::Integer(7),
                Value::Decimal(1.5),
                Value::Text("6066.78".into()),
                Value::Null
            ]
        );
    }

    #[test]
    fn test_materialize_rejects_blob() {
        let raw = RawResultSet {
            columns: vec!["data".into()],
            rows: vec![vec![SqlValue::Blob(vec![1, 2, 3])]],
        };
        assert!(matches!(materialize(raw), Err(ReportError::Query(msg)) if msg.contains("BLOB")));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Table::new(vec!["a".into()], vec![vec![Value::Integer(1), Value::Integer(2)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_helpers() {
        let table = sample();
        assert_eq!(table.get(0, "city"), Some(&Value::Text("San Francisco".into())));
        assert_eq!(table.get(1, "n_customers"), Some(&Value::Null));
        assert_eq!(table.get(0, "missing"), None);
        assert_eq!(
            table.column_values("officeCode").unwrap(),
            vec![&Value::Text("1".into()), &Value::Text("4".into())]
        );
    }

    #[test]
    fn test_sorted_rows_is_canonical() {
        let table = sample();
        let reversed = Table::new(
            table.columns().to_vec(),
            table.rows().iter().rev().cloned().collect(),
        )
        .unwrap();
        assert_eq!(table.sorted_rows(), reversed.sorted_rows());
    }

    #[test]
    fn test_render_aligns_columns() {
        let rendered = render(&sample());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "officeCode | city          | n_customers");
        assert_eq!(lines[1], "-----------|---------------|------------");
        assert_eq!(lines[2], "1          | San Francisco | 6");
        assert_eq!(lines[3], "4          | Paris         | NULL");
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render(&Table::default()), "");
    }

    #[test]
    fn test_export_to_csv() {
        let csv = export(&sample(), OutputFormat::Csv).unwrap();
        assert_eq!(csv, "officeCode,city,n_customers\n1,San Francisco,6\n4,Paris,\n");
    }

    #[test]
    fn test_csv_quotes_separators() {
        let table = Table::new(vec!["name".into()], vec![vec!["Gift Depot, Inc.".into()]]).unwrap();
        assert_eq!(export_to_csv(&table), "name\n\"Gift Depot, Inc.\"\n");
    }

    #[test]
    fn test_export_to_json_keeps_types() {
        let json = export(&sample(), OutputFormat::Json).unwrap();
        assert_eq!(
            json,
            r#"[{"officeCode":"1","city":"San Francisco","n_customers":6},{"officeCode":"4","city":"Paris","n_customers":null}]"#
        );
    }

    #[test]
    fn test_export_to_markdown() {
        let markdown = export(&sample(), OutputFormat::Markdown).unwrap();
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines[0], "| officeCode | city | n_customers |");
        assert_eq!(lines[1], "| --- | --- | --- |");
        assert_eq!(lines[2], "| 1 | San Francisco | 6 |");
    }

    #[test]
    fn test_unsupported_format() {
        let result = "xml".parse::<OutputFormat>();
        if let Err(ReportError::Config(msg)) = result {
            assert!(msg.contains("Unsupported export format"));
            assert!(msg.contains("xml"));
        } else {
            panic!("Expected Config error");
        }
        assert_eq!("Markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
    }
}
