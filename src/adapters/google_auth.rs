//! OAuth2 access tokens for Google APIs.
//!
//! The Ads API is authorised with an installed-app refresh token, the Sheets
//! API with a service-account key signed into a JWT bearer assertion. Both
//! keep the current access token in memory until shortly before it expires.

use crate::config::{AdsCredentials, ServiceAccountSource};
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

#[derive(Default)]
struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    async fn get(&self) -> Option<String> {
        let cached = self.slot.read().await;
        cached
            .as_ref()
            .filter(|t| t.expires_at > SystemTime::now() + EXPIRY_MARGIN)
            .map(|t| t.token.clone())
    }

    async fn store(&self, response: &TokenResponse) {
        let mut cached = self.slot.write().await;
        *cached = Some(CachedToken {
            token: response.access_token.clone(),
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        });
    }
}

async fn exchange(client: &Client, token_url: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
    let response = client.post(token_url).form(form).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        return Err(PipelineError::AuthError {
            message: format!("Token exchange failed ({}): {}", status, text),
        });
    }

    Ok(response.json().await?)
}

/// Refresh-token flow used for the Ads API.
pub struct RefreshTokenAuth {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cache: TokenCache,
}

impl RefreshTokenAuth {
    pub fn new(client: Client, token_url: impl Into<String>, credentials: &AdsCredentials) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_token: credentials.refresh_token.clone(),
            cache: TokenCache::default(),
        }
    }
}

#[async_trait]
impl TokenProvider for RefreshTokenAuth {
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.get().await {
            return Ok(token);
        }

        tracing::debug!("Refreshing Ads API access token");
        let response = exchange(
            &self.client,
            &self.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("refresh_token", &self.refresh_token),
            ],
        )
        .await?;

        self.cache.store(&response).await;
        Ok(response.access_token)
    }
}

/// Fields of a service-account JSON key that the JWT flow needs.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// JWT bearer flow used for the Sheets API.
pub struct ServiceAccountAuth {
    client: Client,
    key: ServiceAccountKey,
    scope: String,
    cache: TokenCache,
}

impl ServiceAccountAuth {
    pub fn from_json(client: Client, json: &str, scope: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json)?;
        Ok(Self {
            client,
            key,
            scope: scope.to_string(),
            cache: TokenCache::default(),
        })
    }

    pub async fn from_source(client: Client, source: &ServiceAccountSource, scope: &str) -> Result<Self> {
        match source {
            ServiceAccountSource::Inline(json) => Self::from_json(client, json, scope),
            ServiceAccountSource::File(path) => {
                let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                    PipelineError::config(format!(
                        "Cannot read service-account key {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_json(client, &json, scope)
            }
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PipelineError::AuthError {
                message: format!("System clock before UNIX epoch: {}", e),
            })?
            .as_secs();

        let claims = JwtClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cache.get().await {
            return Ok(token);
        }

        tracing::debug!("Requesting Sheets access token for {}", self.key.client_email);
        let assertion = self.signed_assertion()?;
        let response = exchange(
            &self.client,
            &self.key.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &assertion),
            ],
        )
        .await?;

        self.cache.store(&response).await;
        Ok(response.access_token)
    }
}

/// Fixed token, for tests and pre-authorised environments.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
