//! Upload with positional arguments and a service account key file

use clap::Args;
use std::path::PathBuf;

use play_upload_core::{CredentialsInput, ParameterSource, RequestInputs, UploadError};

use crate::cli::Cli;

/// Upload an AAB to Google Play, reading credentials from a file
#[derive(Debug, Default, Args)]
pub struct FileCommand {
    /// Path to the service account JSON key file
    pub service_account_file: Option<PathBuf>,

    /// Path to the AAB file to upload
    pub bundle: Option<PathBuf>,

    /// Package name of the Android app
    pub package_name: Option<String>,

    /// Timeout in seconds for HTTP requests [default: 120]
    pub timeout: Option<u64>,
}

impl ParameterSource for FileCommand {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn inputs(&self) -> Result<RequestInputs, UploadError> {
        Ok(RequestInputs {
            credentials: self.service_account_file.clone().map(CredentialsInput::File),
            bundle: self.bundle.clone(),
            package_name: self.package_name.clone(),
            timeout: self.timeout,
        })
    }
}

impl FileCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        super::run_upload(self, cli)
    }
}
