//! Google Play bundle upload for play-upload
//!
//! Uploads an Android App Bundle through the Google Play Developer Publishing
//! API v3 and releases it as a draft on the internal testing track.
//!
//! ## Flow
//!
//! 1. A [`ParameterSource`] (flags, environment, positional arguments) yields
//!    a validated [`UploadRequest`].
//! 2. [`publish`] authenticates the service account, builds the API client and
//!    runs the [`ReleaseWorkflow`]: open edit, upload bundle, assign the
//!    internal track, commit.
//!
//! The workflow only depends on the [`PlayPublisher`] trait, so it can be
//! driven without network access.
//!
//! ## Usage
//!
//! ```ignore
//! use play_upload_core::{publish, EnvSource, ParameterSource, PublisherConfig, TracingReporter};
//!
//! let request = EnvSource::from_env().load()?;
//! let summary = publish(&request, PublisherConfig::default(), &TracingReporter).await?;
//! println!("version code {}", summary.version_code);
//! ```

pub mod error;
pub mod google_play;
pub mod release;
pub mod reporter;
pub mod request;
pub mod traits;
pub mod types;

pub use error::{PublisherError, UploadError};
pub use google_play::{GooglePlayPublisher, PublisherConfig, ServiceAccountAuth};
pub use release::{publish, ReleaseWorkflow};
pub use reporter::{ReleaseEvent, ReleaseReporter, ReleaseStep, TracingReporter};
pub use request::{
    Credentials, CredentialsInput, EnvSource, ParameterSource, RequestInputs, UploadRequest,
};
pub use traits::PlayPublisher;
pub use types::*;
