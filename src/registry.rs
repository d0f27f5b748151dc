// 🏛️ Registry Client - ANPR dashboard lookup
// One GET per badge, single attempt, bounded by the configured timeout.

use crate::error::BadgeError;
use crate::validation::EntityIdentifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Public ANPR dashboard endpoint, one municipality per path segment
pub const DEFAULT_REGISTRY_URL: &str = "https://dashboard.anpr.it/api/comune/";

// ============================================================================
// RAW RECORD
// ============================================================================

/// Registry answer envelope: `{ "data": [ {...}, ... ] }`.
///
/// Entries stay untyped here. The resolver projects the first one and
/// decides whether it describes a municipality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRegistryRecord {
    /// `null` and absent are read as "no entries"
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

impl RawRegistryRecord {
    /// Check the envelope shape of a decoded JSON body
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn entries(&self) -> &[Value] {
        self.data.as_deref().unwrap_or(&[])
    }
}

// ============================================================================
// CLIENT TRAIT
// ============================================================================

/// Registry lookup collaborator
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch the raw record for one identifier.
    ///
    /// Transport failures, non-2xx answers and unexpected envelopes are all
    /// reported as [`BadgeError::Upstream`].
    async fn fetch(&self, identifier: &EntityIdentifier) -> Result<RawRegistryRecord, BadgeError>;

    /// Address a fetch for `identifier` goes to
    fn url_for(&self, identifier: &EntityIdentifier) -> String;
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("anpr-badge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build registry HTTP client")?;

        Ok(HttpRegistryClient {
            base_url: normalize_base_url(base_url),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    #[tracing::instrument(skip_all, fields(identifier = %identifier))]
    async fn fetch(&self, identifier: &EntityIdentifier) -> Result<RawRegistryRecord, BadgeError> {
        let url = self.url_for(identifier);
        let upstream = |reason: String| BadgeError::Upstream {
            url: url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| upstream(transport_reason(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream(format!("registry answered {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| upstream(transport_reason(&e)))?;

        let record = RawRegistryRecord::from_json(body)
            .map_err(|e| upstream(format!("unexpected payload shape: {}", e)))?;

        tracing::debug!(entries = record.entries().len(), "registry answered");
        Ok(record)
    }

    fn url_for(&self, identifier: &EntityIdentifier) -> String {
        format!("{}{}", self.base_url, identifier)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    }
}

/// Short description of a reqwest failure, without its error chain
fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_decode() {
        "response is not valid JSON".to_string()
    } else if let Some(status) = e.status() {
        format!("registry answered {}", status)
    } else {
        "request failed".to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
