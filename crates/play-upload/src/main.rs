//! play-upload - upload Android App Bundles to the Google Play internal track

mod cli;
mod exit_codes;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::{output, Cli, OutputFormat};
use play_upload_core::UploadError;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_error_code(&err));
        }
    };

    let _guard = init_tracing(cli.verbose);
    let format = cli.format;

    match cli.execute() {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            report_error(&err, format);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

/// Exit code for a command line that did not parse
///
/// Usage errors exit with 1 like every other failure; `--help` and
/// `--version` exit with 0.
fn parse_error_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        exit_codes::ERROR
    } else {
        exit_codes::SUCCESS
    }
}

fn report_error(err: &anyhow::Error, format: OutputFormat) {
    tracing::error!("{}", err);

    match format {
        OutputFormat::Json => {
            let kind = err
                .downcast_ref::<UploadError>()
                .map(UploadError::kind)
                .unwrap_or("error");
            let body = serde_json::json!({
                "success": false,
                "error": kind,
                "message": err.to_string(),
            });
            println!("{}", body);
        }
        OutputFormat::Text => output::error(&err.to_string()),
    }
}

/// Set up tracing with two layers:
/// - Console (stderr): controlled by RUST_LOG (default: warn, or debug with --verbose)
/// - File: always debug-level JSON to ~/.play-upload/logs/
fn init_tracing(verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_level = if verbose { "debug" } else { "warn" };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(log_dir) = log_directory() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "play-upload.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(console_filter),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_filter(EnvFilter::new("debug")),
            )
            .init();

        return Some(guard);
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .init();

    None
}

/// Returns the log directory path, creating it if needed.
fn log_directory() -> Option<std::path::PathBuf> {
    let log_dir = dirs::home_dir()?.join(".play-upload").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_code(args: &[&str]) -> u8 {
        let err = Cli::try_parse_from(args).unwrap_err();
        parse_error_code(&err)
    }

    #[test]
    fn test_usage_errors_exit_with_one() {
        assert_eq!(parse_code(&["play-upload", "upload", "--track", "beta"]), exit_codes::ERROR);
        assert_eq!(parse_code(&["play-upload"]), exit_codes::ERROR);
        assert_eq!(parse_code(&["play-upload", "deploy"]), exit_codes::ERROR);
    }

    #[test]
    fn test_help_and_version_exit_with_zero() {
        assert_eq!(parse_code(&["play-upload", "--help"]), exit_codes::SUCCESS);
        assert_eq!(parse_code(&["play-upload", "upload", "--help"]), exit_codes::SUCCESS);
        assert_eq!(parse_code(&["play-upload", "--version"]), exit_codes::SUCCESS);
    }
}
