use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::Serialize;

use crate::models::{DiagnosticSnapshot, InterviewConfig};

use super::{AnalysisService, DiagnosticsSink, InterviewStore};

const INTERVIEWS_ENDPOINT: &str = "/api/interviews";
const DIAGNOSTICS_ENDPOINT: &str = "/api/diagnostics";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimestampPayload {
    timestamp: DateTime<Utc>,
}

/// JSON-over-HTTP client for the Shortlist web backend.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create backend HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn interview_url(&self, interview_id: &str, action: Option<&str>) -> String {
        match action {
            Some(action) => format!(
                "{}{}/{}/{}",
                self.base_url, INTERVIEWS_ENDPOINT, interview_id, action
            ),
            None => format!("{}{}/{}", self.base_url, INTERVIEWS_ENDPOINT, interview_id),
        }
    }

    pub fn diagnostics_url(&self) -> String {
        format!("{}{}", self.base_url, DIAGNOSTICS_ENDPOINT)
    }

    async fn post_json<B>(&self, url: &str, body: &B) -> Result<serde_json::Value>
    where
        B: Serialize + Sync,
    {
        debug!("[backend] POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to call {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("[backend] {} returned {}: {}", url, status, error_text);
            anyhow::bail!("Backend returned error status {}: {}", status, error_text);
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse response from {url}"))
    }
}

#[async_trait]
impl InterviewStore for BackendClient {
    async fn get_interview(&self, interview_id: &str) -> Result<InterviewConfig> {
        let url = self.interview_url(interview_id, None);
        debug!("[backend] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch interview {interview_id}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Interview {} lookup failed with status {}", interview_id, status);
        }

        response
            .json::<InterviewConfig>()
            .await
            .context("Failed to parse interview record")
    }

    async fn record_start(&self, interview_id: &str, started_at: DateTime<Utc>) -> Result<()> {
        let url = self.interview_url(interview_id, Some("start"));
        self.post_json(&url, &TimestampPayload { timestamp: started_at })
            .await?;
        Ok(())
    }

    async fn record_end(&self, interview_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        let url = self.interview_url(interview_id, Some("end"));
        self.post_json(&url, &TimestampPayload { timestamp: ended_at })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DiagnosticsSink for BackendClient {
    async fn send(&self, snapshot: &DiagnosticSnapshot) -> Result<()> {
        let url = self.diagnostics_url();
        self.post_json(&url, snapshot).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisService for BackendClient {
    async fn request_analysis(&self, interview_id: &str) -> Result<serde_json::Value> {
        let url = self.interview_url(interview_id, Some("analyze"));
        self.post_json(&url, &serde_json::json!({ "interviewId": interview_id }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let client = BackendClient::new("https://shortlist.example/", Duration::from_secs(2)).unwrap();
        assert_eq!(
            client.interview_url("iv-9", None),
            "https://shortlist.example/api/interviews/iv-9"
        );
        assert_eq!(
            client.interview_url("iv-9", Some("analyze")),
            "https://shortlist.example/api/interviews/iv-9/analyze"
        );
        assert_eq!(
            client.diagnostics_url(),
            "https://shortlist.example/api/diagnostics"
        );
    }

    #[test]
    fn interview_record_accepts_backend_shape() {
        let record: InterviewConfig = serde_json::from_str(
            r#"{"id":"iv-9","topic":"Rust","questionCount":5,"screenMonitoring":true}"#,
        )
        .unwrap();
        assert!(record.requires_monitoring);
        assert_eq!(record.question_count, 5);
        assert!(record.started_at.is_none());
    }
}
