//! Internal-track release workflow
//!
//! One run opens an edit, uploads the bundle into it, puts the resulting
//! version code on the internal track as a draft and commits the edit. Each
//! step runs at most once and the first failure ends the run. An edit that was
//! opened but not committed is left for the server to expire.

use std::future::Future;
use std::path::Path;

use tracing::warn;

use crate::error::{PublisherError, UploadError};
use crate::google_play::{GooglePlayPublisher, PublisherConfig, ServiceAccountAuth};
use crate::reporter::{ReleaseEvent, ReleaseReporter, ReleaseStep};
use crate::request::UploadRequest;
use crate::traits::PlayPublisher;
use crate::types::*;

/// Run one step: report it, await it and wrap a failure in the step's error kind
async fn run_step<T, F, D>(
    reporter: &dyn ReleaseReporter,
    step: ReleaseStep,
    context: Option<String>,
    call: F,
    wrap: fn(PublisherError) -> UploadError,
    detail: D,
) -> Result<T, UploadError>
where
    F: Future<Output = crate::error::Result<T>>,
    D: FnOnce(&T) -> Option<String>,
{
    reporter.report(&ReleaseEvent::Started {
        step,
        detail: context,
    });

    match call.await {
        Ok(value) => {
            reporter.report(&ReleaseEvent::Completed {
                step,
                detail: detail(&value),
            });
            Ok(value)
        }
        Err(e) => {
            let error = wrap(e);
            reporter.report(&ReleaseEvent::Failed {
                step,
                error: error.to_string(),
            });
            Err(error)
        }
    }
}

/// Drives a [`PlayPublisher`] through the release steps
pub struct ReleaseWorkflow<'a, P: PlayPublisher + ?Sized> {
    publisher: &'a P,
    reporter: &'a dyn ReleaseReporter,
}

impl<'a, P: PlayPublisher + ?Sized> ReleaseWorkflow<'a, P> {
    pub fn new(publisher: &'a P, reporter: &'a dyn ReleaseReporter) -> Self {
        Self {
            publisher,
            reporter,
        }
    }

    /// Upload `bundle` and release it as a draft on the internal track
    pub async fn run(&self, package_name: &str, bundle: &Path) -> Result<ReleaseSummary, UploadError> {
        let edit = run_step(
            self.reporter,
            ReleaseStep::OpenEdit,
            None,
            self.publisher.open_edit(package_name),
            UploadError::EditCreationFailed,
            |edit: &EditTransaction| Some(format!("Edit ID: {}", edit.id)),
        )
        .await?;

        let result = self.release(package_name, bundle, &edit).await;
        if result.is_err() {
            warn!(edit_id = %edit.id, "edit was not committed and remains open");
        }
        result
    }

    async fn release(
        &self,
        package_name: &str,
        bundle: &Path,
        edit: &EditTransaction,
    ) -> Result<ReleaseSummary, UploadError> {
        let upload = run_step(
            self.reporter,
            ReleaseStep::UploadBundle,
            Some(bundle.display().to_string()),
            self.publisher.upload_bundle(package_name, edit, bundle),
            UploadError::BundleUploadFailed,
            |upload: &BundleUploadResult| Some(format!("Version code: {}", upload.version_code)),
        )
        .await?;

        let release = TrackRelease::internal_draft(upload.version_code);
        let update = TrackUpdate::new(INTERNAL_TRACK, release.clone());

        run_step(
            self.reporter,
            ReleaseStep::AssignTrack,
            None,
            self.publisher.assign_track(package_name, edit, &update),
            UploadError::TrackAssignmentFailed,
            |_| None,
        )
        .await?;

        run_step(
            self.reporter,
            ReleaseStep::Commit,
            None,
            self.publisher.commit(package_name, edit),
            UploadError::CommitFailed,
            |_| None,
        )
        .await?;

        Ok(ReleaseSummary::new(package_name, edit, &release))
    }
}

/// Authenticate, build the API client and run the release workflow
///
/// The request's timeout replaces the one in `config`.
pub async fn publish(
    request: &UploadRequest,
    config: PublisherConfig,
    reporter: &dyn ReleaseReporter,
) -> Result<ReleaseSummary, UploadError> {
    let auth = run_step(
        reporter,
        ReleaseStep::Authenticate,
        None,
        async {
            let auth = ServiceAccountAuth::new(&request.credentials, request.timeout)?;
            auth.authenticate().await?;
            Ok::<_, PublisherError>(auth)
        },
        UploadError::AuthenticationFailed,
        |auth: &ServiceAccountAuth| Some(format!("Service account: {}", auth.client_email())),
    )
    .await?;

    let config = PublisherConfig {
        timeout: request.timeout,
        ..config
    };

    let publisher = run_step(
        reporter,
        ReleaseStep::BuildClient,
        None,
        async move { GooglePlayPublisher::new(auth, config) },
        UploadError::ClientConstructionFailed,
        |_| None,
    )
    .await?;

    ReleaseWorkflow::new(&publisher, reporter)
        .run(&request.package_name, &request.bundle_path)
        .await
}
