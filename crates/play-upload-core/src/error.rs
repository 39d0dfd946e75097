//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the Google Play publisher client
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Token exchange rejected by the OAuth endpoint
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Service account key is unusable
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Non-success response from the Publishing API
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// URL error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors that end an upload run, one kind per step
#[derive(Debug, Error)]
pub enum UploadError {
    /// A required input was not supplied
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// An input was supplied but could not be used
    #[error("Invalid value for {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// Credentials are not valid JSON
    #[error("Service account credentials are not valid JSON: {0}")]
    InvalidCredentialsFormat(#[source] serde_json::Error),

    /// Credentials file could not be read
    #[error("Service account file not found: {}: {source}", path.display())]
    CredentialsFileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to authenticate: {0}")]
    AuthenticationFailed(#[source] PublisherError),

    #[error("Failed to build Google Play API client: {0}")]
    ClientConstructionFailed(#[source] PublisherError),

    #[error("Failed to start edit transaction: {0}")]
    EditCreationFailed(#[source] PublisherError),

    #[error("Failed to upload AAB: {0}")]
    BundleUploadFailed(#[source] PublisherError),

    #[error("Failed to assign AAB to internal track: {0}")]
    TrackAssignmentFailed(#[source] PublisherError),

    #[error("Failed to commit the transaction: {0}")]
    CommitFailed(#[source] PublisherError),
}

impl UploadError {
    /// Stable name of the error kind, used in logs and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::InvalidCredentialsFormat(_) => "invalid_credentials_format",
            Self::CredentialsFileNotFound { .. } => "credentials_file_not_found",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::ClientConstructionFailed(_) => "client_construction_failed",
            Self::EditCreationFailed(_) => "edit_creation_failed",
            Self::BundleUploadFailed(_) => "bundle_upload_failed",
            Self::TrackAssignmentFailed(_) => "track_assignment_failed",
            Self::CommitFailed(_) => "commit_failed",
        }
    }
}

/// Result type for publisher client calls
pub type Result<T> = std::result::Result<T, PublisherError>;
