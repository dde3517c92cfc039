use salesreport::{config, runner};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the reports
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    info!("Starting salesreport...");

    let config = match config::load_default_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(1);
        }
    };

    // Optional single argument: the database file
    let args: Vec<String> = std::env::args().collect();
    let db_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => config.database_path(),
    };

    let summary = match runner::run_report(&db_path, config.thresholds) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Failed to run reports: {}", e);
            return ExitCode::from(1);
        }
    };

    for step in &summary.steps {
        match runner::format_step_report(step, config.output.format) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to format {}: {}", step.step, e),
        }
    }

    if summary.failed_steps() > 0 {
        eprintln!("{} of {} reports failed", summary.failed_steps(), summary.steps.len());
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}
