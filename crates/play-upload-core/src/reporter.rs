//! Release progress reporting

use std::fmt;

/// Steps of an upload run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseStep {
    Authenticate,
    BuildClient,
    OpenEdit,
    UploadBundle,
    AssignTrack,
    Commit,
}

impl ReleaseStep {
    /// Progress line shown when the step starts
    pub fn start_message(&self) -> &'static str {
        match self {
            ReleaseStep::Authenticate => "Authenticating using service account credentials...",
            ReleaseStep::BuildClient => "Building Google Play API client...",
            ReleaseStep::OpenEdit => "Starting a new edit transaction...",
            ReleaseStep::UploadBundle => "Uploading AAB file as draft...",
            ReleaseStep::AssignTrack => "Assigning AAB to the internal track as draft...",
            ReleaseStep::Commit => "Committing the transaction...",
        }
    }

    /// Start line with the step's subject, when it has one, worked in
    pub fn start_line(&self, detail: Option<&str>) -> String {
        match (self, detail) {
            (ReleaseStep::UploadBundle, Some(path)) => {
                format!("Uploading AAB file from {} as draft...", path)
            }
            (_, Some(detail)) => format!("{} {}", self.start_message(), detail),
            (_, None) => self.start_message().to_string(),
        }
    }

    /// Progress line shown when the step succeeds
    pub fn success_message(&self) -> &'static str {
        match self {
            ReleaseStep::Authenticate => "Authentication successful.",
            ReleaseStep::BuildClient => "Google Play API client built successfully.",
            ReleaseStep::OpenEdit => "Edit transaction started successfully.",
            ReleaseStep::UploadBundle => "AAB uploaded successfully.",
            ReleaseStep::AssignTrack => "AAB assigned to internal track successfully.",
            ReleaseStep::Commit => "Transaction committed successfully.",
        }
    }
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStep::Authenticate => "authenticate",
            ReleaseStep::BuildClient => "build-client",
            ReleaseStep::OpenEdit => "open-edit",
            ReleaseStep::UploadBundle => "upload-bundle",
            ReleaseStep::AssignTrack => "assign-track",
            ReleaseStep::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Events emitted during an upload run
#[derive(Debug, Clone)]
pub enum ReleaseEvent {
    /// A step is about to run; `detail` names what it works on, if anything
    Started {
        step: ReleaseStep,
        detail: Option<String>,
    },
    /// A step succeeded; `detail` carries what it produced, if anything
    Completed {
        step: ReleaseStep,
        detail: Option<String>,
    },
    /// A step failed and the run is over
    Failed { step: ReleaseStep, error: String },
}

/// Trait for reporting upload progress
pub trait ReleaseReporter: Send + Sync {
    /// Handle a release event
    fn report(&self, event: &ReleaseEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ReleaseReporter for TracingReporter {
    fn report(&self, event: &ReleaseEvent) {
        match event {
            ReleaseEvent::Started { step, detail } => {
                tracing::info!(%step, "{}", step.start_line(detail.as_deref()))
            }
            ReleaseEvent::Completed { step, detail } => match detail {
                Some(detail) => tracing::info!(%step, "{} {}", step.success_message(), detail),
                None => tracing::info!(%step, "{}", step.success_message()),
            },
            ReleaseEvent::Failed { step, error } => {
                tracing::error!(%step, "{}", error);
            }
        }
    }
}
