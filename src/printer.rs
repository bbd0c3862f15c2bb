//! HTTP transport to the label-printer bridge.
//!
//! The bridge is a tiny HTTP-to-USB shim; it accepts a raw TSPL program as a
//! single opaque payload and answers with a bare pass/fail.

use crate::error::{PartmarkError, Result};
use tracing::debug;

pub struct PrintTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl PrintTransport {
    /// `endpoint` is the bridge base URL, e.g. `http://labeler.local`.
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Hand a finished label program to the bridge.
    pub async fn send(&self, program: String) -> Result<()> {
        let url = format!("{}/tspl", self.endpoint.trim_end_matches('/'));
        debug!(bytes = program.len(), %url, "sending label program");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/tspl")
            .body(program)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PartmarkError::Printer(format!("{status} - {body}")));
        }
        Ok(())
    }
}
