//! Publisher interface

use crate::error::Result;
use crate::types::*;
use std::path::Path;

/// The slice of the Google Play Developer API the release workflow needs
///
/// [`GooglePlayPublisher`](crate::google_play::GooglePlayPublisher) talks to the
/// real API; tests drive the workflow through in-memory implementations.
#[async_trait::async_trait]
pub trait PlayPublisher: Send + Sync {
    /// Open a new edit transaction (`edits.insert`)
    async fn open_edit(&self, package_name: &str) -> Result<EditTransaction>;

    /// Upload an app bundle into an open edit (`edits.bundles.upload`)
    async fn upload_bundle(
        &self,
        package_name: &str,
        edit: &EditTransaction,
        bundle: &Path,
    ) -> Result<BundleUploadResult>;

    /// Replace the releases of a track (`edits.tracks.update`)
    async fn assign_track(
        &self,
        package_name: &str,
        edit: &EditTransaction,
        update: &TrackUpdate,
    ) -> Result<()>;

    /// Commit the edit (`edits.commit`)
    async fn commit(&self, package_name: &str, edit: &EditTransaction) -> Result<()>;
}
