//! Service account authentication
//!
//! Signs an RS256 assertion with the service account's private key and
//! exchanges it at the key's token endpoint for an OAuth2 access token.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{PublisherError, Result};
use crate::request::Credentials;

/// OAuth scope of the Android Publisher API
pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

/// Token endpoint used when the key does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google service account key
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    #[serde(deserialize_with = "deserialize_secret")]
    private_key: SecretString,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

fn deserialize_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(|value| SecretString::new(value.into()))
}

/// Assertion claims
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::minutes(5)
    }
}

/// Mints and refreshes access tokens for a service account
pub struct ServiceAccountAuth {
    client_email: String,
    key_id: Option<String>,
    encoding_key: EncodingKey,
    token_uri: String,
    client: Client,
    token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Load the service account from credentials
    ///
    /// Does not contact the network; call [`authenticate`](Self::authenticate)
    /// to obtain the first token.
    pub fn new(credentials: &Credentials, timeout: StdDuration) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(credentials.expose_json())
            .map_err(|e| PublisherError::InvalidCredentials(format!(
                "Invalid service account key: {}", e
            )))?;

        if key.client_email.trim().is_empty() {
            return Err(PublisherError::InvalidCredentials(
                "Service account key has an empty client_email".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| PublisherError::InvalidCredentials(format!(
                "Invalid private key: {}", e
            )))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client_email: key.client_email,
            key_id: key.private_key_id,
            encoding_key,
            token_uri: key.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            client,
            token: RwLock::new(None),
        })
    }

    /// Service account email
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Fetch a token now, replacing any cached one
    #[instrument(skip(self), fields(account = %self.client_email))]
    pub async fn authenticate(&self) -> Result<()> {
        let token = self.fetch_token().await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    /// Current access token, refreshed when close to expiry
    pub async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.token.expose_secret().to_string());
            }
        }

        debug!("access token missing or expiring, refreshing");
        let token = self.fetch_token().await?;
        let value = token.token.expose_secret().to_string();
        *self.token.write().await = Some(token);

        Ok(value)
    }

    /// Signed assertion for the token exchange
    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            iss: self.client_email.clone(),
            scope: ANDROID_PUBLISHER_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let jwt = self.assertion(Utc::now())?;

        debug!(token_uri = %self.token_uri, "exchanging assertion for access token");

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", jwt.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PublisherError::AuthenticationFailed(format!(
                "{} - {}",
                status.as_u16(),
                error_text
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        Ok(CachedToken {
            token: SecretString::new(token_response.access_token.into()),
            expires_at: expiry(Utc::now(), token_response.expires_in)?,
        })
    }
}

/// Instant a token issued at `now` with lifetime `expires_in` seconds expires
fn expiry(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>> {
    Some(expires_in)
        .filter(|seconds| *seconds >= 0)
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            PublisherError::InvalidResponse(format!(
                "token lifetime out of range: expires_in = {}",
                expires_in
            ))
        })
}

impl fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
