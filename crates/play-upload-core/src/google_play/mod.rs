//! Google Play Developer Publishing API client
//!
//! Implements [`PlayPublisher`] over the v3 REST endpoints.
//!
//! ## Authentication
//!
//! Uses a Google Cloud service account with Google Play Developer API access,
//! see [`ServiceAccountAuth`].
//!
//! ## Usage
//!
//! ```ignore
//! use play_upload_core::google_play::{GooglePlayPublisher, PublisherConfig, ServiceAccountAuth};
//!
//! let auth = ServiceAccountAuth::new(&request.credentials, request.timeout)?;
//! auth.authenticate().await?;
//! let publisher = GooglePlayPublisher::new(auth, PublisherConfig::with_timeout(request.timeout))?;
//! let edit = publisher.open_edit("com.example.app").await?;
//! ```

mod auth;

pub use auth::{ServiceAccountAuth, ANDROID_PUBLISHER_SCOPE, DEFAULT_TOKEN_URI};

use std::path::Path;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{PublisherError, Result};
use crate::traits::PlayPublisher;
use crate::types::*;

/// REST base of the Publishing API
pub const API_BASE_URL: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3/";

/// Media upload base of the Publishing API
pub const UPLOAD_BASE_URL: &str =
    "https://androidpublisher.googleapis.com/upload/androidpublisher/v3/";

/// HTTP settings of the publisher client
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// REST base URL
    pub api_base_url: String,

    /// Media upload base URL
    pub upload_base_url: String,

    /// Bound on each HTTP call
    pub timeout: Duration,

    /// User-Agent header
    pub user_agent: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_base_url: API_BASE_URL.to_string(),
            upload_base_url: UPLOAD_BASE_URL.to_string(),
            timeout: Duration::from_secs(crate::request::DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("play-upload/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PublisherConfig {
    /// Default endpoints with the given timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// Google Play Developer API client
#[derive(Debug)]
pub struct GooglePlayPublisher {
    client: Client,
    api_base: Url,
    upload_base: Url,
    auth: ServiceAccountAuth,
}

impl GooglePlayPublisher {
    /// Create a client bound to an authenticated service account
    pub fn new(auth: ServiceAccountAuth, config: PublisherConfig) -> Result<Self> {
        let api_base = parse_base_url(&config.api_base_url)?;
        let upload_base = parse_base_url(&config.upload_base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client,
            api_base,
            upload_base,
            auth,
        })
    }

    /// Make an authenticated API request
    async fn api_request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let token = self.auth.access_token().await?;

        debug!("Making {} request to {}", method, url);

        let sends_body = method == Method::POST || method == Method::PUT;
        let request = self.client.request(method, url).bearer_auth(token);

        // A bodyless POST or PUT still has to announce a zero length
        let request = match body {
            Some(body) => request.json(&body),
            None if sends_body => request.header(CONTENT_LENGTH, 0),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PublisherError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl PlayPublisher for GooglePlayPublisher {
    #[instrument(skip(self))]
    async fn open_edit(&self, package_name: &str) -> Result<EditTransaction> {
        let url = endpoint(&self.api_base, &["applications", package_name, "edits"])?;

        self.api_request(Method::POST, url, Some(serde_json::json!({})))
            .await
    }

    #[instrument(skip(self, edit), fields(edit_id = %edit.id))]
    async fn upload_bundle(
        &self,
        package_name: &str,
        edit: &EditTransaction,
        bundle: &Path,
    ) -> Result<BundleUploadResult> {
        let mut url = endpoint(
            &self.upload_base,
            &["applications", package_name, "edits", edit.id.as_str(), "bundles"],
        )?;
        url.query_pairs_mut().append_pair("uploadType", "media");

        let file = tokio::fs::File::open(bundle).await?;
        let length = file.metadata().await?.len();
        let token = self.auth.access_token().await?;

        debug!(bytes = length, "streaming bundle to {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, length)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PublisherError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json().await?)
    }

    #[instrument(skip(self, edit, update), fields(edit_id = %edit.id, track = %update.track))]
    async fn assign_track(
        &self,
        package_name: &str,
        edit: &EditTransaction,
        update: &TrackUpdate,
    ) -> Result<()> {
        let url = endpoint(
            &self.api_base,
            &["applications", package_name, "edits", edit.id.as_str(), "tracks", update.track.as_str()],
        )?;

        let _: serde_json::Value = self
            .api_request(Method::PUT, url, Some(serde_json::to_value(update)?))
            .await?;

        Ok(())
    }

    #[instrument(skip(self, edit), fields(edit_id = %edit.id))]
    async fn commit(&self, package_name: &str, edit: &EditTransaction) -> Result<()> {
        let action = format!("{}:commit", edit.id);
        let url = endpoint(
            &self.api_base,
            &["applications", package_name, "edits", action.as_str()],
        )?;

        let _: serde_json::Value = self.api_request(Method::POST, url, None).await?;

        Ok(())
    }
}

fn parse_base_url(value: &str) -> Result<Url> {
    let url = Url::parse(value)?;
    if url.cannot_be_a_base() {
        return Err(PublisherError::Configuration(format!(
            "'{}' cannot be used as a base URL",
            value
        )));
    }
    Ok(url)
}

/// Append percent-encoded path segments to a base URL
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PublisherError::Configuration(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use crate::release::ReleaseWorkflow;
    use crate::reporter::TracingReporter;
    use crate::request::Credentials;
    use std::io::Write;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    const KEY_JSON: &str = include_str!("testdata/service_account.json");
    const BUNDLE_BYTES: &[u8] = b"PK\x03\x04 fake bundle contents";

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        method: String,
        target: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl RecordedRequest {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    type Responder = fn(&RecordedRequest) -> (u16, String);

    /// HTTP/1.1 server on a loopback port that records every request
    struct FakeServer {
        addr: SocketAddr,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl FakeServer {
        async fn start(respond: Responder) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));

            let recorded = Arc::clone(&requests);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let recorded = Arc::clone(&recorded);
                    tokio::spawn(serve(stream, respond, recorded));
                }
            });

            Self { addr, requests }
        }

        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn serve(
        stream: TcpStream,
        respond: Responder,
        recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    ) {
        let mut reader = BufReader::new(stream);
        let Ok(request) = read_request(&mut reader).await else {
            return;
        };

        let (status, body) = respond(&request);
        recorded.lock().unwrap().push(request);

        let response = format!(
            "HTTP/1.1 {} Fake\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let stream = reader.get_mut();
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    async fn read_request(reader: &mut BufReader<TcpStream>) -> std::io::Result<RecordedRequest> {
        let invalid = |message: &str| std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_string());

        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let mut parts = line.split_whitespace();
        let method = parts.next().ok_or_else(|| invalid("empty request line"))?.to_string();
        let target = parts.next().ok_or_else(|| invalid("missing target"))?.to_string();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| invalid("bad header"))?;
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }

        let mut request = RecordedRequest {
            method,
            target,
            headers,
            body: Vec::new(),
        };

        if let Some(length) = request.header("content-length") {
            let length: usize = length.parse().map_err(|_| invalid("bad content-length"))?;
            request.body = vec![0; length];
            reader.read_exact(&mut request.body).await?;
        } else if request.header("transfer-encoding") == Some("chunked") {
            loop {
                let mut size = String::new();
                reader.read_line(&mut size).await?;
                let size = usize::from_str_radix(size.trim(), 16)
                    .map_err(|_| invalid("bad chunk size"))?;
                let mut chunk = vec![0; size + 2];
                reader.read_exact(&mut chunk).await?;
                if size == 0 {
                    break;
                }
                request.body.extend_from_slice(&chunk[..size]);
            }
        }

        Ok(request)
    }

    /// Answers like the token endpoint and the Publishing API
    fn play_api(request: &RecordedRequest) -> (u16, String) {
        let path = request.target.split('?').next().unwrap_or_default();
        let body = match (request.method.as_str(), path) {
            ("POST", "/token") => {
                r#"{"access_token": "tok", "expires_in": 3600, "token_type": "Bearer"}"#.to_string()
            }
            ("POST", p) if p.ends_with("/edits") => {
                r#"{"id": "edit123", "expiryTimeSeconds": "1700000000"}"#.to_string()
            }
            ("POST", p) if p.ends_with("/bundles") => {
                r#"{"versionCode": 42, "sha1": "da39a3ee", "sha256": "e3b0c442"}"#.to_string()
            }
            ("PUT", p) if p.ends_with("/tracks/internal") => {
                String::from_utf8_lossy(&request.body).into_owned()
            }
            ("POST", p) if p.ends_with(":commit") => r#"{"id": "edit123"}"#.to_string(),
            _ => return (404, r#"{"error": {"code": 404}}"#.to_string()),
        };
        (200, body)
    }

    fn upload_forbidden(request: &RecordedRequest) -> (u16, String) {
        if request.target.contains("/bundles") {
            return (
                403,
                r#"{"error": {"code": 403, "message": "The caller does not have permission"}}"#
                    .to_string(),
            );
        }
        play_api(request)
    }

    async fn fake_publisher(server: &FakeServer) -> GooglePlayPublisher {
        let mut key: serde_json::Value = serde_json::from_str(KEY_JSON).unwrap();
        key["token_uri"] = serde_json::Value::String(server.url("/token"));
        let credentials = Credentials::from_json(&key.to_string()).unwrap();

        let timeout = Duration::from_secs(10);
        let auth = ServiceAccountAuth::new(&credentials, timeout).unwrap();
        auth.authenticate().await.unwrap();

        let config = PublisherConfig {
            api_base_url: server.url("/androidpublisher/v3/"),
            upload_base_url: server.url("/upload/androidpublisher/v3/"),
            ..PublisherConfig::with_timeout(timeout)
        };
        GooglePlayPublisher::new(auth, config).unwrap()
    }

    fn bundle_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".aab").tempfile().unwrap();
        file.write_all(BUNDLE_BYTES).unwrap();
        file.flush().unwrap();
        file
    }

    fn publisher(config: PublisherConfig) -> Result<GooglePlayPublisher> {
        let credentials = Credentials::from_json(include_str!("testdata/service_account.json"))
            .unwrap();
        let auth = ServiceAccountAuth::new(&credentials, config.timeout).unwrap();
        GooglePlayPublisher::new(auth, config)
    }

    #[test]
    fn test_edit_endpoints() {
        let base = parse_base_url(API_BASE_URL).unwrap();

        assert_eq!(
            endpoint(&base, &["applications", "com.example.app", "edits"])
                .unwrap()
                .as_str(),
            "https://androidpublisher.googleapis.com/androidpublisher/v3/applications/com.example.app/edits"
        );
        assert_eq!(
            endpoint(&base, &["applications", "com.example.app", "edits", "edit123:commit"])
                .unwrap()
                .as_str(),
            "https://androidpublisher.googleapis.com/androidpublisher/v3/applications/com.example.app/edits/edit123:commit"
        );
    }

    #[test]
    fn test_track_endpoint() {
        let base = parse_base_url(API_BASE_URL).unwrap();
        let url = endpoint(
            &base,
            &["applications", "com.example.app", "edits", "edit123", "tracks", INTERNAL_TRACK],
        )
        .unwrap();

        assert!(url.as_str().ends_with("/edits/edit123/tracks/internal"));
    }

    #[test]
    fn test_segments_are_escaped() {
        let base = parse_base_url(API_BASE_URL).unwrap();
        let url = endpoint(&base, &["applications", "com.example/app?x", "edits"]).unwrap();

        assert!(url.as_str().contains("com.example%2Fapp%3Fx"));
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let base = parse_base_url("http://127.0.0.1:8080/v3").unwrap();
        let url = endpoint(&base, &["applications", "a", "edits"]).unwrap();

        assert_eq!(url.as_str(), "http://127.0.0.1:8080/v3/applications/a/edits");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(parse_base_url("not a url"), Err(PublisherError::Url(_))));
        assert!(matches!(
            parse_base_url("mailto:play@example.com"),
            Err(PublisherError::Configuration(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = PublisherConfig {
            upload_base_url: "::".to_string(),
            ..Default::default()
        };

        assert!(publisher(config).is_err());
    }

    #[tokio::test]
    async fn test_new_with_default_config() {
        let publisher = publisher(PublisherConfig::with_timeout(Duration::from_secs(5))).unwrap();
        assert_eq!(publisher.upload_base.as_str(), UPLOAD_BASE_URL);
    }

    #[tokio::test]
    async fn test_release_requests() {
        let server = FakeServer::start(play_api).await;
        let publisher = fake_publisher(&server).await;
        let bundle = bundle_file();

        let summary = ReleaseWorkflow::new(&publisher, &TracingReporter)
            .run("com.example.app", bundle.path())
            .await
            .unwrap();

        assert_eq!(summary.edit_id, "edit123");
        assert_eq!(summary.version_code, 42);

        let requests = server.requests();
        let lines: Vec<String> = requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.target))
            .collect();
        assert_eq!(
            lines,
            vec![
                "POST /token",
                "POST /androidpublisher/v3/applications/com.example.app/edits",
                "POST /upload/androidpublisher/v3/applications/com.example.app/edits/edit123/bundles?uploadType=media",
                "PUT /androidpublisher/v3/applications/com.example.app/edits/edit123/tracks/internal",
                "POST /androidpublisher/v3/applications/com.example.app/edits/edit123:commit",
            ]
        );

        let token = &requests[0];
        assert_eq!(
            token.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        let form = String::from_utf8(token.body.clone()).unwrap();
        assert!(form.starts_with(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer&assertion="
        ));

        for request in &requests[1..] {
            assert_eq!(request.header("authorization"), Some("Bearer tok"));
        }

        let edit = &requests[1];
        assert_eq!(edit.header("content-type"), Some("application/json"));
        assert_eq!(edit.json(), serde_json::json!({}));

        let upload = &requests[2];
        assert_eq!(upload.header("content-type"), Some("application/octet-stream"));
        assert_eq!(upload.body, BUNDLE_BYTES);

        let track = &requests[3];
        assert_eq!(track.header("content-type"), Some("application/json"));
        assert_eq!(
            track.json(),
            serde_json::json!({
                "track": "internal",
                "releases": [{
                    "name": "Internal Test Release",
                    "versionCodes": ["42"],
                    "status": "draft"
                }]
            })
        );

        let commit = &requests[4];
        assert_eq!(commit.header("content-length"), Some("0"));
        assert!(commit.body.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_upload_stops_release() {
        let server = FakeServer::start(upload_forbidden).await;
        let publisher = fake_publisher(&server).await;
        let bundle = bundle_file();

        let err = ReleaseWorkflow::new(&publisher, &TracingReporter)
            .run("com.example.app", bundle.path())
            .await
            .unwrap_err();

        match err {
            UploadError::BundleUploadFailed(PublisherError::ApiError { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("does not have permission"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.method != "PUT" && !r.target.ends_with(":commit")));
    }
}
