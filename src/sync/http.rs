use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;

use super::SyncTransport;
use crate::budget::BudgetEntry;
use crate::error::{BudgetError, Result};
use crate::settings::Settings;
use crate::storage::queue::SyncOperation;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// Floor for the per-request timeout; zero would fail every request.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Client for the sync API over HTTP.
///
/// - `POST {base}/sync` with one queued operation as the JSON body
/// - `GET {base}/entries` returns the full entry list
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        crate::install_crypto_provider();
        let timeout = timeout.max(MIN_REQUEST_TIMEOUT);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Build a transport from settings; `None` when no API base is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        match settings.api_base() {
            Some(base) => Ok(Some(Self::new(
                base,
                Duration::from_secs(settings.request_timeout_secs),
            )?)),
            None => Ok(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn error_for_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(BudgetError::Sync(format!(
            "{} returned {}: {}",
            what, status, body
        )))
    }
}

impl SyncTransport for HttpTransport {
    async fn push(&self, op: &SyncOperation) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/sync", self.base_url))
            .json(op)
            .send()
            .await?;
        Self::error_for_status(response, "POST /sync").await?;
        tracing::debug!("Delivered op {} ({})", op.id, op.op_type.as_str());
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Vec<BudgetEntry>> {
        let response = self
            .client
            .get(format!("{}/entries", self.base_url))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let response = Self::error_for_status(response, "GET /entries").await?;
        let entries: Vec<BudgetEntry> = response.json().await?;
        tracing::debug!("Fetched snapshot of {} entries", entries.len());
        Ok(entries)
    }

    async fn probe(&self) -> bool {
        let resp = self
            .client
            .get(format!("{}/entries", self.base_url))
            .header(ACCEPT, "application/json")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match resp {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }
}
