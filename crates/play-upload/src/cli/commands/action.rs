//! Upload with parameters passed as `INPUT_*` environment variables

use clap::Args;

use play_upload_core::EnvSource;

use crate::cli::Cli;

/// Upload an AAB to Google Play, reading INPUT_SERVICE_ACCOUNT, INPUT_BUNDLE,
/// INPUT_PACKAGE_NAME and INPUT_TIMEOUT (default: 300)
#[derive(Debug, Args)]
pub struct ActionCommand {}

impl ActionCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        super::run_upload(&EnvSource::from_env(), cli)
    }
}
