//! CLI commands

mod action;
mod file;
mod upload;

pub use action::ActionCommand;
pub use file::FileCommand;
pub use upload::UploadCommand;

use play_upload_core::{
    publish, ParameterSource, PublisherConfig, ReleaseReporter, TracingReporter,
};
use tracing::info;

use crate::cli::output::{self, ConsoleReporter};
use crate::cli::{Cli, OutputFormat};

/// Resolve the request from `source` and run the upload
pub(crate) fn run_upload(source: &dyn ParameterSource, cli: &Cli) -> anyhow::Result<()> {
    let request = source.load()?;

    info!(
        source = source.name(),
        package = %request.package_name,
        bundle = %request.bundle_path.display(),
        timeout_secs = request.timeout.as_secs(),
        "upload request resolved"
    );

    let reporter: &dyn ReleaseReporter = if cli.shows_progress() {
        &ConsoleReporter
    } else {
        &TracingReporter
    };

    if cli.shows_progress() {
        output::info("Starting Google Play AAB upload...");
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let summary = rt.block_on(publish(&request, PublisherConfig::default(), reporter))?;

    match cli.format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "success": true,
                "release": summary,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                output::success("AAB upload and track assignment completed successfully.");
                output::summary(&summary);
            }
        }
    }

    Ok(())
}
