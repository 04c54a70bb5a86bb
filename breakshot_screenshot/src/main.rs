use breakshot_screenshot::{CaptureReport, Config, ConfigError, run};
use clap::error::ErrorKind;
use crossterm::style::Stylize;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    // logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(ConfigError::Args(e))
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
        {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        // clap renders its own `error:` header
        Err(ConfigError::Args(e)) => {
            report_error(&e.to_string());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            report_error(&format!("Error: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(report) => {
            print_report(&report, config.json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn report_error(message: &str) {
    eprintln!("{}", message.trim_end().red());
}

fn print_report(report: &CaptureReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(out) => println!("{}", out),
            Err(e) => report_error(&format!("Error: failed to serialize report: {}", e)),
        }
        return;
    }

    for failure in &report.failed {
        eprintln!(
            "{}",
            format!("✗ {} [{}]: {}", failure.url, failure.viewport, failure.error).red()
        );
    }
    println!(
        "{}",
        format!(
            "✓ {} of {} screenshots saved",
            report.saved.len(),
            report.total()
        )
        .green()
    );
}
