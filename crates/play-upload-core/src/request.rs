//! Upload request and the sources it can be read from
//!
//! Every parameter source produces the same raw [`RequestInputs`]; validation
//! into an [`UploadRequest`] happens in one place so that all sources fail the
//! same way on the same input.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::UploadError;

/// Timeout used by the flag and positional sources
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Timeout used by the environment source
pub const ACTION_DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Service account credentials as supplied by the user
///
/// Holds the raw JSON document. It is checked to be well-formed JSON on
/// construction; its fields are only interpreted during authentication.
pub struct Credentials {
    json: SecretString,
}

impl Credentials {
    /// Parse inline credentials
    pub fn from_json(json: &str) -> Result<Self, UploadError> {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(UploadError::InvalidCredentialsFormat)?;

        Ok(Self {
            json: SecretString::new(json.into()),
        })
    }

    /// Read and parse credentials from a file
    pub fn from_file(path: &Path) -> Result<Self, UploadError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            UploadError::CredentialsFileNotFound {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::from_json(&content)
    }

    /// The raw JSON document
    pub fn expose_json(&self) -> &str {
        self.json.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials([REDACTED])")
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.expose_json() == other.expose_json()
    }
}

/// Where the credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsInput {
    /// JSON document passed directly
    Inline(String),
    /// Path to a JSON key file
    File(PathBuf),
}

impl CredentialsInput {
    fn is_empty(&self) -> bool {
        match self {
            CredentialsInput::Inline(json) => json.trim().is_empty(),
            CredentialsInput::File(path) => path.as_os_str().is_empty(),
        }
    }

    fn load(&self) -> Result<Credentials, UploadError> {
        match self {
            CredentialsInput::Inline(json) => Credentials::from_json(json),
            CredentialsInput::File(path) => Credentials::from_file(path),
        }
    }
}

/// Unvalidated inputs as read from a parameter source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInputs {
    pub credentials: Option<CredentialsInput>,
    pub bundle: Option<PathBuf>,
    pub package_name: Option<String>,
    pub timeout: Option<u64>,
}

/// A validated upload request
#[derive(Debug, PartialEq)]
pub struct UploadRequest {
    /// Service account credentials
    pub credentials: Credentials,

    /// Path to the .aab file
    pub bundle_path: PathBuf,

    /// Application ID, e.g. `com.example.app`
    pub package_name: String,

    /// Bound on each HTTP call
    pub timeout: Duration,
}

impl UploadRequest {
    /// Validate raw inputs
    ///
    /// Presence of every required input is checked before the timeout and
    /// before the credentials are read or parsed.
    pub fn resolve(inputs: RequestInputs, default_timeout: u64) -> Result<Self, UploadError> {
        let credentials = inputs
            .credentials
            .filter(|c| !c.is_empty())
            .ok_or(UploadError::MissingParameter("service account"))?;

        let bundle_path = inputs
            .bundle
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(UploadError::MissingParameter("bundle"))?;

        let package_name = inputs
            .package_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(UploadError::MissingParameter("package name"))?;

        let timeout = match inputs.timeout {
            Some(0) => {
                return Err(UploadError::InvalidParameter {
                    name: "timeout",
                    message: "must be greater than zero".to_string(),
                })
            }
            Some(secs) => secs,
            None => default_timeout,
        };

        let credentials = credentials.load()?;

        Ok(Self {
            credentials,
            bundle_path,
            package_name,
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// Parse a timeout given as text
pub fn parse_timeout(value: &str) -> Result<u64, UploadError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| UploadError::InvalidParameter {
            name: "timeout",
            message: format!("'{}' is not a number of seconds: {}", value, e),
        })
}

/// A place upload parameters can be read from
pub trait ParameterSource {
    /// Short name of the source, for logs
    fn name(&self) -> &'static str;

    /// Timeout applied when the source does not set one
    fn default_timeout(&self) -> u64 {
        DEFAULT_TIMEOUT_SECS
    }

    /// Read the raw inputs
    fn inputs(&self) -> Result<RequestInputs, UploadError>;

    /// Read and validate the request
    fn load(&self) -> Result<UploadRequest, UploadError> {
        let inputs = self.inputs()?;
        debug!(source = self.name(), "resolving upload request");
        UploadRequest::resolve(inputs, self.default_timeout())
    }
}

/// Reads `INPUT_*` variables, the way CI action runners pass inputs
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    pub const SERVICE_ACCOUNT: &'static str = "INPUT_SERVICE_ACCOUNT";
    pub const BUNDLE: &'static str = "INPUT_BUNDLE";
    pub const PACKAGE_NAME: &'static str = "INPUT_PACKAGE_NAME";
    pub const TIMEOUT: &'static str = "INPUT_TIMEOUT";

    /// Snapshot of the process environment
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Build from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Non-empty value of a variable
    fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }
}

impl ParameterSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn default_timeout(&self) -> u64 {
        ACTION_DEFAULT_TIMEOUT_SECS
    }

    fn inputs(&self) -> Result<RequestInputs, UploadError> {
        Ok(RequestInputs {
            credentials: self
                .get(Self::SERVICE_ACCOUNT)
                .map(|json| CredentialsInput::Inline(json.to_string())),
            bundle: self.get(Self::BUNDLE).map(PathBuf::from),
            package_name: self.get(Self::PACKAGE_NAME).map(str::to_string),
            timeout: self.get(Self::TIMEOUT).map(parse_timeout).transpose()?,
        })
    }
}
