//! Upload with parameters passed as flags

use clap::Args;
use std::path::PathBuf;

use play_upload_core::{CredentialsInput, ParameterSource, RequestInputs, UploadError};

use crate::cli::Cli;

/// Upload an AAB to Google Play
#[derive(Debug, Default, Args)]
pub struct UploadCommand {
    /// Service account JSON credentials as a string
    #[arg(long, value_name = "JSON")]
    pub service_account: Option<String>,

    /// Path to the AAB file to upload
    #[arg(long, value_name = "PATH")]
    pub bundle: Option<PathBuf>,

    /// Package name of the Android app
    #[arg(long)]
    pub package_name: Option<String>,

    /// Timeout in seconds for HTTP requests [default: 120]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ParameterSource for UploadCommand {
    fn name(&self) -> &'static str {
        "flags"
    }

    fn inputs(&self) -> Result<RequestInputs, UploadError> {
        Ok(RequestInputs {
            credentials: self.service_account.clone().map(CredentialsInput::Inline),
            bundle: self.bundle.clone(),
            package_name: self.package_name.clone(),
            timeout: self.timeout,
        })
    }
}

impl UploadCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        super::run_upload(self, cli)
    }
}
