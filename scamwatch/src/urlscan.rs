use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::ScanError;

pub const URLSCAN_API_URL: &str = "https://urlscan.io/api/v1/scan/";

/// Opaque report reference handed back by the scanning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport(pub String);

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, url: &str) -> Result<ScanReport, ScanError>;
    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct ScanRequest<'a> {
    url: &'a str,
    public: &'static str,
}

/// Submits public scans to urlscan.io.
#[derive(Clone)]
pub struct UrlscanClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl UrlscanClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, URLSCAN_API_URL)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("scamwatch")
                .build()
                .expect("failed to build HTTP client"),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Scanner for UrlscanClient {
    #[instrument(skip(self))]
    async fn scan(&self, url: &str) -> Result<ScanReport, ScanError> {
        debug!(url, "submitting scan");
        let response = self
            .client
            .post(&self.endpoint)
            .header("API-Key", &self.api_key)
            .json(&ScanRequest { url, public: "on" })
            .send()
            .await
            .inspect_err(|e| warn!(url, error = %e, "scan request failed"))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url, %status, "urlscan rejected submission");
            return Err(ScanError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let report = parse_scan_response(&body)
            .inspect_err(|e| warn!(url, error = %e, "unusable urlscan response"))?;
        debug!(url, report = %report, "scan submitted");
        Ok(report)
    }

    fn name(&self) -> &'static str {
        "urlscan"
    }
}

fn parse_scan_response(body: &[u8]) -> Result<ScanReport, ScanError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ScanError::EmptyBody);
    }

    let json: Value = serde_json::from_slice(body).map_err(|_| ScanError::MissingResult)?;
    if json.is_null() {
        return Err(ScanError::EmptyBody);
    }

    json.get("result")
        .and_then(Value::as_str)
        .filter(|result| !result.is_empty())
        .map(|result| ScanReport(result.to_string()))
        .ok_or(ScanError::MissingResult)
}
