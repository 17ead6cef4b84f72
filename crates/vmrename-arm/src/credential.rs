//! Bearer tokens for the management endpoint.

use crate::{ArmConfig, ArmError, ArmResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 5 * 60;

#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> ArmResult<String>;
}

/// A pre-acquired token, e.g. from `az account get-access-token`.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> ArmResult<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Service principal client-credentials flow against Microsoft Entra ID.
pub struct ClientSecretCredential {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientSecretCredential {
    pub fn new(
        http: Client,
        config: &ArmConfig,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: format!("{}/{}/oauth2/v2.0/token", config.authority, tenant_id),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: config.scope(),
            cached: Mutex::new(None),
        }
    }

    async fn request_token(&self) -> ArmResult<CachedToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ArmError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ArmError::Auth(format!("failed to read token response: {e}")))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(ArmError::Auth(format!(
                "token endpoint returned {}: {reason}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ArmError::Auth(format!("malformed token response: {e}")))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> ArmResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - ChronoDuration::seconds(REFRESH_MARGIN_SECS) > Utc::now() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached access token is about to expire, refreshing");
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}

/// `AZURE_ACCESS_TOKEN` wins; otherwise `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and
/// `AZURE_CLIENT_SECRET` must all be set.
pub fn credential_from_env(http: Client, config: &ArmConfig) -> ArmResult<Arc<dyn TokenCredential>> {
    credential_from_lookup(http, config, |key| std::env::var(key).ok())
}

pub fn credential_from_lookup<F>(
    http: Client,
    config: &ArmConfig,
    lookup: F,
) -> ArmResult<Arc<dyn TokenCredential>>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty("AZURE_ACCESS_TOKEN") {
        info!("Using access token from AZURE_ACCESS_TOKEN");
        return Ok(Arc::new(StaticTokenCredential::new(token.trim())));
    }

    match (
        non_empty("AZURE_TENANT_ID"),
        non_empty("AZURE_CLIENT_ID"),
        non_empty("AZURE_CLIENT_SECRET"),
    ) {
        (Some(tenant_id), Some(client_id), Some(client_secret)) => {
            info!(%tenant_id, %client_id, "Using service principal credentials");
            Ok(Arc::new(ClientSecretCredential::new(
                http,
                config,
                &tenant_id,
                client_id,
                client_secret,
            )))
        }
        _ => Err(ArmError::Auth(
            "no credentials: set AZURE_ACCESS_TOKEN, or AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET"
                .to_string(),
        )),
    }
}
