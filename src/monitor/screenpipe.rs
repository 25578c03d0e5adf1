use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;

use crate::models::OcrResult;

use super::source::{OcrQuery, ProbeError, ScreenCaptureSource, OCR_CONTENT_TYPE};

const SEARCH_ENDPOINT: &str = "/search";

/// HTTP client for a locally running screenpipe instance.
pub struct ScreenpipeClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScreenpipeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create screenpipe HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_ENDPOINT)
    }

    fn query_params(query: &OcrQuery) -> Vec<(&'static str, String)> {
        vec![
            ("content_type", OCR_CONTENT_TYPE.to_string()),
            ("limit", query.limit.to_string()),
            ("start_time", query.start_time.to_rfc3339()),
        ]
    }
}

#[async_trait]
impl ScreenCaptureSource for ScreenpipeClient {
    async fn query(&self, query: &OcrQuery) -> Result<OcrResult, ProbeError> {
        let url = self.search_url();
        debug!("[monitor] querying {} since {}", url, query.start_time);

        let response = self
            .client
            .get(&url)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(|err| ProbeError::Transport(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProbeError::NotFound);
        }
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        response
            .json::<OcrResult>()
            .await
            .map_err(|err| ProbeError::Decode(err.to_string()))
    }
}
