//! Online store lookup for addresses the static registry can't place.
//!
//! The geocoding collaborator is optional and consulted only when address
//! data exists but the registry match stayed below the fallback threshold.
//! One attempt with a fixed timeout; failures are logged and swallowed by
//! the orchestrator, never surfaced.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{StoreIdentity, StoreSource};

/// Timeout for one lookup call
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Confidence assigned to an online guess; below the keyword and exact
/// address tiers by construction
const ONLINE_CONFIDENCE: f64 = 0.8;

/// Client for an external address-to-store lookup service
#[derive(Clone)]
pub struct GeocodeClient {
    http_client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    chain: Option<String>,
}

impl GeocodeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from the `GEOCODE_URL` environment variable
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("GEOCODE_URL").ok()?;
        Some(Self::new(&url))
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }

    /// Look up the store chain for an address query string.
    ///
    /// Returns Ok(None) when the service has no answer for the address.
    pub async fn lookup_store(&self, query: &str) -> Result<Option<StoreIdentity>> {
        debug!(query = %query, "geocode lookup");
        let response = self
            .http_client
            .get(format!("{}/lookup", self.base_url))
            .query(&[("address", query)])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("geocode lookup timed out after {:?}", LOOKUP_TIMEOUT))
                } else {
                    Error::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::InvalidData(format!(
                "geocode service returned status {}",
                response.status()
            )));
        }

        let body: LookupResponse = response.json().await?;
        Ok(body
            .chain
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .map(|name| StoreIdentity {
                name,
                confidence: ONLINE_CONFIDENCE,
                source: StoreSource::Online,
            }))
    }
}
