//! Schema Inspection Module
//!
//! Lists the tables of the open database and checks that every table and
//! column the reports reference is present. Table and column names are the
//! contract between the reports and the database; a rename breaks steps.

use crate::core::Result;
use rusqlite::{Connection, Row};

/// Tables and columns referenced by the ten reports
pub const REPORT_CONTRACT: &[(&str, &[&str])] = &[
    ("offices", &["officeCode", "city", "state", "country"]),
    ("employees", &["employeeNumber", "firstName", "lastName", "officeCode"]),
    (
        "customers",
        &[
            "customerNumber",
            "contactFirstName",
            "contactLastName",
            "phone",
            "salesRepEmployeeNumber",
            "creditLimit",
        ],
    ),
    ("orders", &["orderNumber", "customerNumber"]),
    ("orderdetails", &["orderNumber", "productCode", "quantityOrdered"]),
    ("products", &["productCode", "productName"]),
    ("payments", &["customerNumber", "checkNumber", "amount", "paymentDate"]),
];

/// Represents a database column with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type name (e.g., "INTEGER", "TEXT"); empty when undeclared
    pub type_name: String,
    /// Whether the column rejects NULL values
    pub notnull: bool,
    /// Whether this column is part of the primary key
    pub pk: bool,
}

impl Column {
    /// Creates a Column from a PRAGMA table_info result row
    fn from_pragma_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Column {
            name: row.get(1)?,
            type_name: row.get(2)?,
            notnull: row.get(3)?,
            pk: row.get::<_, i64>(5)? > 0,
        })
    }
}

/// Returns the user-defined tables of the database, sorted by name.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type='table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tables)
}

/// Returns the columns of `table_name`; empty when the table does not exist.
pub fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare("SELECT * FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table_name], |row| Column::from_pragma_row(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Lists every `table.column` of [`REPORT_CONTRACT`] missing from the database.
///
/// A missing table reports each of its contract columns. Name matching is
/// case-insensitive, as SQLite's own identifier resolution is.
pub fn missing_contract_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut missing = Vec::new();
    for (table, required) in REPORT_CONTRACT {
        let present = table_columns(conn, table)?;
        for column in required.iter() {
            if !present.iter().any(|c| c.name.eq_ignore_ascii_case(column)) {
                missing.push(format!("{}.{}", table, column));
            }
        }
    }
    Ok(missing)
}
