//! Whole-run orchestration: open the database, check the schema, run every
//! report, close the database.

use crate::core::db::{list_tables, missing_contract_columns, with_session};
use crate::core::Result;
use crate::reports::{QueryRunner, ReportThresholds, StepReport};
use crate::table::{export, OutputFormat};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// Everything one run produced
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// User tables found in the database
    pub tables: Vec<String>,
    /// Report columns absent from the database, as `table.column`
    pub missing_columns: Vec<String>,
    pub steps: Vec<StepReport>,
}

impl RunSummary {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_ok()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.steps.iter().map(|s| s.warnings.len()).sum()
    }
}

/// Runs all ten reports against the database at `path`.
///
/// # Errors
///
/// Only a connection failure is returned as an error. Failures of individual
/// reports are recorded in their [`StepReport`]. The database is closed
/// before this returns in every case.
pub fn run_report<P: AsRef<Path>>(path: P, thresholds: ReportThresholds) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let span = info_span!("report_run", %run_id);
    let _enter = span.enter();

    let started_at = Utc::now();
    info!("Running reports against {}", path.as_ref().display());

    with_session(path, |session| {
        let conn = session.connection();
        let tables = list_tables(conn)?;
        info!(tables = tables.len(), "Found tables: {}", tables.join(", "));

        let missing_columns = missing_contract_columns(conn)?;
        for column in &missing_columns {
            warn!("Report column {} is missing; dependent steps will fail", column);
        }

        let steps = QueryRunner::with_thresholds(conn, thresholds).run_all();
        let summary = RunSummary {
            run_id,
            started_at,
            tables,
            missing_columns,
            steps,
        };
        info!(
            failed = summary.failed_steps(),
            warnings = summary.warning_count(),
            "Run finished"
        );
        Ok(summary)
    })
}

/// Formats one step for printing: a heading, the table or the error, then
/// any warnings.
pub fn format_step_report(report: &StepReport, format: OutputFormat) -> Result<String> {
    let mut output = format!("== {} ==\n", report.step);
    match &report.outcome {
        Ok(table) => {
            output.push_str(&export(table, format)?);
            if !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&format!("({} rows)\n", table.row_count()));
        }
        Err(e) => output.push_str(&format!("{}\n", e)),
    }
    for warning in &report.warnings {
        output.push_str(&format!("warning: {}\n", warning));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ReportError;
    use crate::reports::ReportStep;
    use crate::table::Table;
    use crate::test_utils::DatabaseFixture;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_run_report_on_sample_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("classicmodels.sqlite");
        DatabaseFixture::write_sample_database(&path).unwrap();

        let summary = run_report(&path, ReportThresholds::default()).unwrap();
        assert_eq!(summary.steps.len(), 10);
        assert_eq!(summary.failed_steps(), 0);
        assert_eq!(summary.warning_count(), 0);
        assert!(summary.missing_columns.is_empty());
        assert_eq!(
            summary.tables,
            ["customers", "employees", "offices", "orderdetails", "orders", "payments", "products"]
        );
    }

    #[test]
    fn test_run_report_records_schema_mismatch_per_step() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.sqlite");
        {
            let fixture = DatabaseFixture::with_sample_data().unwrap();
            fixture
                .connection
                .execute_batch("ALTER TABLE products RENAME COLUMN productName TO name;")
                .unwrap();
            fixture
                .connection
                .execute("VACUUM INTO ?1", [path.to_str().unwrap()])
                .unwrap();
        }

        let summary = run_report(&path, ReportThresholds::default()).unwrap();
        assert_eq!(summary.missing_columns, ["products.productName"]);
        let failed: Vec<ReportStep> = summary
            .steps
            .iter()
            .filter(|s| !s.is_ok())
            .map(|s| s.step)
            .collect();
        assert_eq!(failed, [ReportStep::ProductSales, ReportStep::ProductReach]);
    }

    #[test]
    fn test_run_report_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = run_report(dir.path().join("nope.sqlite"), ReportThresholds::default());
        assert!(matches!(result, Err(ReportError::Connection { .. })));
    }

    #[test]
    fn test_format_step_report() {
        let table = Table::new(vec!["city".to_string()], vec![vec!["Boston".into()]]).unwrap();
        let ok = StepReport {
            step: ReportStep::OfficeCustomerCounts,
            outcome: Ok(table),
            warnings: Vec::new(),
            elapsed: Duration::from_millis(1),
        };
        assert_eq!(
            format_step_report(&ok, OutputFormat::Csv).unwrap(),
            "== Step 9: Customers per office ==\ncity\nBoston\n(1 rows)\n"
        );

        let failed = StepReport {
            step: ReportStep::ProductSales,
            outcome: Err(ReportError::Query("no such column: p.productName".to_string())),
            warnings: Vec::new(),
            elapsed: Duration::from_millis(1),
        };
        let text = format_step_report(&failed, OutputFormat::Table).unwrap();
        assert!(text.contains("Step 7"));
        assert!(text.contains("Query error: no such column"));
    }
}
