//! External collaborators the proctor talks to: the interview record store,
//! the diagnostics persistence endpoint and the one-shot analysis request.

pub mod chat;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{DiagnosticSnapshot, InterviewConfig};

pub use chat::ChatReply;
pub use http::BackendClient;

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn get_interview(&self, interview_id: &str) -> Result<InterviewConfig>;
    async fn record_start(&self, interview_id: &str, started_at: DateTime<Utc>) -> Result<()>;
    async fn record_end(&self, interview_id: &str, ended_at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn send(&self, snapshot: &DiagnosticSnapshot) -> Result<()>;
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Aggregate the interview's diagnostics once it is over.
    async fn request_analysis(&self, interview_id: &str) -> Result<serde_json::Value>;
}
