#[cfg(test)]
mod cli_tests {
    use assert_cmd::Command;
    use salesreport::test_utils::DatabaseFixture;
    use tempfile::TempDir;

    #[test]
    fn test_prints_all_reports() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.sqlite");
        DatabaseFixture::write_sample_database(&path).unwrap();

        let output = Command::cargo_bin("salesreport")
            .unwrap()
            .arg(&path)
            .output()
            .unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        for step in 1..=10 {
            assert!(stdout.contains(&format!("== Step {}:", step)), "missing step {}", step);
        }
        assert!(stdout.contains("116208.40"));
        assert!(stdout.contains("Murphy"));
    }

    #[test]
    fn test_missing_database_exits_with_error() {
        let dir = TempDir::new().unwrap();

        let output = Command::cargo_bin("salesreport")
            .unwrap()
            .arg(dir.path().join("absent.sqlite"))
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Connection error"));
    }

    #[test]
    fn test_failed_steps_exit_with_partial_status() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.sqlite");
        DatabaseFixture::write_sample_database(&path).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE payments;")
            .unwrap();

        let output = Command::cargo_bin("salesreport")
            .unwrap()
            .arg(&path)
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("== Step 5:"));
        assert!(stdout.contains("no such table: payments"));
        assert!(stdout.contains("== Step 10:"));
    }
}
