//! Remote rate feed with a bundled local fallback.
//!
//! The live document and the fallback file share one shape (the CoinDesk
//! `currentprice.json` layout) and both decode into [`RateDocument`]. A live
//! fetch that times out, returns a non-success status or a body that does not
//! decode falls back to the local file; nothing is retried.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EtlError, Result};

/// Rate document: one entry per currency code under `bpi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDocument {
    #[serde(rename = "chartName", default, skip_serializing_if = "Option::is_none")]
    pub chart_name: Option<String>,

    pub bpi: BTreeMap<String, RateEntry>,
}

/// A single currency quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    pub rate_float: f64,
}

/// Where the document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Fallback,
}

/// Result of [`fetch_rates`].
#[derive(Debug, Clone)]
pub struct RateFetch {
    pub document: RateDocument,
    pub source: RateSource,
    /// Why the live fetch was abandoned, when it was.
    pub live_error: Option<String>,
}

/// Fetch the live document, falling back to `fallback_path` on any failure.
///
/// Only an unreadable or malformed fallback file is an error.
pub async fn fetch_rates(url: &str, timeout: Duration, fallback_path: &Path) -> Result<RateFetch> {
    info!("Fetching live rates from {}", url);
    match fetch_live(url, timeout).await {
        Ok(document) => {
            info!("Live rates fetched ({} currencies)", document.bpi.len());
            Ok(RateFetch {
                document,
                source: RateSource::Live,
                live_error: None,
            })
        }
        Err(e) => {
            warn!("Could not reach {}: {}", url, e);
            warn!("Falling back to local {}", fallback_path.display());
            let document = read_fallback(fallback_path)?;
            Ok(RateFetch {
                document,
                source: RateSource::Fallback,
                live_error: Some(e.to_string()),
            })
        }
    }
}

async fn fetch_live(url: &str, timeout: Duration) -> Result<RateDocument> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let document = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<RateDocument>()
        .await?;
    Ok(document)
}

/// Read and decode the local fallback document.
pub fn read_fallback(path: &Path) -> Result<RateDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| EtlError::Fallback {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStatus {
    pub reachable: bool,
    pub status: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Issue a GET and report status and latency without decoding the body.
pub async fn probe_endpoint(url: &str, timeout: Duration) -> EndpointStatus {
    let start = Instant::now();
    let response = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client.get(url).send().await,
        Err(e) => Err(e),
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    match response {
        Ok(resp) => EndpointStatus {
            reachable: true,
            status: Some(resp.status().as_u16()),
            latency_ms,
            error: None,
        },
        Err(e) => EndpointStatus {
            reachable: false,
            status: None,
            latency_ms,
            error: Some(e.to_string()),
        },
    }
}
