//! Twitter (X) API v2 transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::oauth::OAuthSigner;
use super::transport::{NotificationTransport, TransportError};
use crate::config::TwitterCredentials;

const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Posts tweets as the configured user
#[derive(Clone)]
pub struct TwitterClient {
    http_client: reqwest::Client,
    signer: OAuthSigner,
    api_base: String,
    timeout: Duration,
}

/// Account the credentials belong to
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

impl TwitterClient {
    pub fn new(credentials: TwitterCredentials, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            signer: OAuthSigner::new(credentials),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout,
        })
    }

    /// Point the client at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Check the credentials by fetching the authenticated user
    pub async fn verify_credentials(&self) -> Result<TwitterUser, TransportError> {
        let url = format!("{}/2/users/me", self.api_base);
        let auth = self.signer.authorization("GET", &url, &[]);

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Credentials(format!(
                "status {}: {}",
                status,
                error_detail(&text)
            )));
        }

        let envelope: DataEnvelope<TwitterUser> = response
            .json()
            .await
            .map_err(|e| TransportError::Response(e.to_string()))?;

        tracing::debug!(
            name = %envelope.data.name,
            username = %envelope.data.username,
            "Authenticated Twitter user"
        );

        Ok(envelope.data)
    }

    fn map_reqwest(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl NotificationTransport for TwitterClient {
    async fn post(&self, text: &str) -> Result<u64, TransportError> {
        let url = format!("{}/2/tweets", self.api_base);
        let auth = self.signer.authorization("POST", &url, &[]);

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status,
                message: error_detail(&text),
            });
        }

        let envelope: DataEnvelope<CreatedTweet> = response
            .json()
            .await
            .map_err(|e| TransportError::Response(e.to_string()))?;

        let id = envelope
            .data
            .id
            .parse::<u64>()
            .map_err(|_| TransportError::Response(format!("non-numeric id {:?}", envelope.data.id)))?;

        tracing::debug!(tweet_id = id, "Tweet posted");
        Ok(id)
    }
}

/// Pull the human-readable part out of an API error body
fn error_detail(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("title"))
                .or_else(|| v.pointer("/errors/0/message"))
        })
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| body.trim().to_string())
}
