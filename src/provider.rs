//! Provider abstraction for external content feeds.
//!
//! A [`Provider`] wraps one upstream feed endpoint and exposes the same
//! capability set regardless of wire format: fetch, identity, a cheap
//! availability probe, and informational rate-limit data. One
//! implementation exists per feed shape ([`crate::provider_json`],
//! [`crate::provider_xml`]); the sync orchestrator only sees trait objects.
//!
//! Providers are built from config into an explicit list at
//! orchestrator-build time — there is no process-wide registry.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::provider_json::JsonProvider;
use crate::provider_xml::XmlProvider;

/// Informational rate-limit data. No live tracking: `remaining` reports the
/// configured ceiling.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
}

/// Filters forwarded to the upstream feed as query parameters.
#[derive(Debug, Clone, Default)]
pub struct FetchFilters {
    pub query: Option<String>,
    pub limit: Option<u32>,
}

impl FetchFilters {
    /// Query-string pairs for the upstream GET request.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref q) = self.query {
            pairs.push(("q", q.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Adapter-scoped fetch failure. Never aborts a whole sync; the
/// orchestrator records it in the provider stats and moves on.
#[derive(Debug)]
pub enum FetchError {
    /// Transport-level failure, including timeouts.
    Request(String),
    /// Upstream answered with a non-success status.
    Status(u16),
    /// Payload arrived but its top-level structure is unreadable.
    Parse(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Request(e) => write!(f, "request failed: {}", e),
            FetchError::Status(code) => write!(f, "upstream returned HTTP {}", code),
            FetchError::Parse(e) => write!(f, "malformed payload: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

/// A content feed provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider instance name (e.g. `"json:tutorials"`), used for stats and logs.
    fn name(&self) -> &str;

    /// Wire format identifier: `"json"` or `"xml"`.
    fn format(&self) -> &'static str;

    /// Configured request ceiling. Informational only.
    fn rate_limit(&self) -> RateLimit;

    /// Cheap liveness probe (`HEAD` against the feed URL). Failures are
    /// swallowed and reported as `false` so the orchestrator can skip the
    /// provider without treating the probe as an error path.
    async fn is_available(&self) -> bool;

    /// Fetch raw items from the feed. Must not mutate shared state.
    ///
    /// Returns one JSON object per item. An upstream payload whose item
    /// container is entirely absent yields an empty list with a warning;
    /// a structurally broken payload is a [`FetchError::Parse`].
    async fn fetch(&self, filters: &FetchFilters) -> Result<Vec<Value>, FetchError>;
}

/// Build the provider list from config, in stable (name-sorted) order per
/// format, JSON providers first.
///
/// All providers share one HTTP client carrying the sync timeout, so every
/// fetch is bounded; a timed-out fetch surfaces as [`FetchError::Request`].
pub fn providers_from_config(config: &Config) -> Result<Vec<Box<dyn Provider>>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.sync.timeout_secs))
        .build()?;

    let mut providers: Vec<Box<dyn Provider>> = Vec::new();
    for (name, cfg) in &config.providers.json {
        providers.push(Box::new(JsonProvider::new(
            name.clone(),
            cfg.clone(),
            client.clone(),
        )));
    }
    for (name, cfg) in &config.providers.xml {
        providers.push(Box::new(XmlProvider::new(
            name.clone(),
            cfg.clone(),
            client.clone(),
        )));
    }

    Ok(providers)
}
