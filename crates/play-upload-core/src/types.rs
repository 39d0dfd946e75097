//! Publishing API resource types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Track every upload lands on
pub const INTERNAL_TRACK: &str = "internal";

/// Name given to the release created on the internal track
pub const INTERNAL_RELEASE_NAME: &str = "Internal Test Release";

/// An open edit transaction (`AppEdit` resource)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTransaction {
    /// Edit ID assigned by the API
    pub id: String,

    /// Seconds since epoch at which the edit expires
    #[serde(default)]
    pub expiry_time_seconds: Option<String>,
}

impl EditTransaction {
    /// Edit with only an ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expiry_time_seconds: None,
        }
    }
}

/// Result of `edits.bundles.upload` (`Bundle` resource)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleUploadResult {
    /// Version code of the uploaded bundle
    pub version_code: i64,

    #[serde(default)]
    pub sha1: Option<String>,

    #[serde(default)]
    pub sha256: Option<String>,
}

impl BundleUploadResult {
    pub fn new(version_code: i64) -> Self {
        Self {
            version_code,
            sha1: None,
            sha256: None,
        }
    }
}

/// Release status on a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    /// Not yet available to users
    Draft,
    /// Staged rollout in progress
    InProgress,
    /// Rollout halted
    Halted,
    /// Available to all users of the track
    Completed,
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseStatus::Draft => write!(f, "draft"),
            ReleaseStatus::InProgress => write!(f, "inProgress"),
            ReleaseStatus::Halted => write!(f, "halted"),
            ReleaseStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A release on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    /// Release name shown in the Play Console
    pub name: String,

    /// Version codes included in the release; int64 values travel as strings
    #[serde(serialize_with = "serialize_version_codes")]
    pub version_codes: Vec<i64>,

    /// Release status
    pub status: ReleaseStatus,
}

impl TrackRelease {
    /// Draft release of a single bundle on the internal track
    pub fn internal_draft(version_code: i64) -> Self {
        Self {
            name: INTERNAL_RELEASE_NAME.to_string(),
            version_codes: vec![version_code],
            status: ReleaseStatus::Draft,
        }
    }
}

fn serialize_version_codes<S: Serializer>(
    codes: &[i64],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(codes.iter().map(|code| code.to_string()))
}

/// Request body of `edits.tracks.update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackUpdate {
    pub track: String,
    pub releases: Vec<TrackRelease>,
}

impl TrackUpdate {
    pub fn new(track: impl Into<String>, release: TrackRelease) -> Self {
        Self {
            track: track.into(),
            releases: vec![release],
        }
    }
}

/// Outcome of a committed upload
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseSummary {
    pub package_name: String,
    pub edit_id: String,
    pub version_code: i64,
    pub track: String,
    pub release_name: String,
    pub status: ReleaseStatus,
    /// Play Console page for the app's tracks
    pub console_url: String,
    pub committed_at: DateTime<Utc>,
}

impl ReleaseSummary {
    pub fn new(package_name: &str, edit: &EditTransaction, release: &TrackRelease) -> Self {
        Self {
            package_name: package_name.to_string(),
            edit_id: edit.id.clone(),
            version_code: release.version_codes.first().copied().unwrap_or_default(),
            track: INTERNAL_TRACK.to_string(),
            release_name: release.name.clone(),
            status: release.status,
            console_url: format!(
                "https://play.google.com/console/developers/app/{}/tracks",
                package_name
            ),
            committed_at: Utc::now(),
        }
    }
}
