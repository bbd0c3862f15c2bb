//! Digikey OAuth token cache.
//!
//! The token lives in the ledger's `authCache` field so it survives process
//! restarts. A cached token whose expiry is strictly in the future is reused
//! without a network call; otherwise one credential exchange runs and the
//! refreshed token is persisted before it is handed to the caller.

use crate::error::{PartmarkError, Result};
use crate::ledger::LedgerStore;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const TOKEN_URL: &str = "https://api.digikey.com/v1/oauth2/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

pub struct DigikeyAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    store: Arc<LedgerStore>,
    token_url: String,
}

impl DigikeyAuth {
    pub fn new(
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
        store: Arc<LedgerStore>,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            store,
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Point the exchange at a different OAuth endpoint (Digikey sandbox).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Return a bearer token, exchanging credentials only when the cached one
    /// is missing or expired.
    pub async fn token(&self) -> Result<String> {
        if let Some(cached) = self.store.cached_auth() {
            if cached.expires_at > Utc::now() {
                debug!("using cached Digikey token");
                return Ok(cached.token);
            }
        }

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| PartmarkError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PartmarkError::Auth(format!("{status} - {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PartmarkError::Auth(e.to_string()))?;

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        // Persist before use so every later call in this run hits the cache.
        self.store
            .refresh_auth(token.access_token.clone(), expires_at)?;

        Ok(token.access_token)
    }
}
