//! Checks whether a remote file host answers HTTP range requests, which a
//! video player needs in order to stream instead of downloading the whole file.

use crate::utils::error::Result;
use crate::utils::validation::validate_url;
use reqwest::header::{HeaderMap, ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use reqwest::{Client, StatusCode};
use serde::Serialize;

pub const DEFAULT_RANGE: &str = "bytes=0-1024";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub url: String,
    pub status: u16,
    pub accept_ranges: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub content_disposition: Option<String>,
    pub streamable: bool,
}

fn header_value(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub struct RangeProbe {
    client: Client,
}

impl RangeProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends one ranged GET and reports the response headers. The body is never read.
    pub async fn probe(&self, url: &str, range: &str) -> Result<ProbeReport> {
        validate_url("url", url)?;

        tracing::debug!("GET {} with Range: {}", url, range);
        let response = self.client.get(url).header(RANGE, range).send().await?;

        let status = response.status();
        let headers = response.headers();
        let report = ProbeReport {
            url: response.url().to_string(),
            status: status.as_u16(),
            accept_ranges: header_value(headers, ACCEPT_RANGES),
            content_type: header_value(headers, CONTENT_TYPE),
            content_length: header_value(headers, CONTENT_LENGTH),
            content_disposition: header_value(headers, CONTENT_DISPOSITION),
            streamable: status == StatusCode::PARTIAL_CONTENT,
        };

        tracing::debug!("Probe of {} answered {}", url, status);
        Ok(report)
    }
}
