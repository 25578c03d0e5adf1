use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::OcrResult;

/// `content_type` filter value for OCR frames.
pub const OCR_CONTENT_TYPE: &str = "ocr";

#[derive(Debug, Clone, PartialEq)]
pub struct OcrQuery {
    pub start_time: DateTime<Utc>,
    pub limit: u32,
}

impl OcrQuery {
    /// OCR content captured during the trailing `window` before `now`.
    pub fn trailing(now: DateTime<Utc>, window: chrono::Duration, limit: u32) -> Self {
        Self {
            start_time: now - window,
            limit,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The service answered but had nothing for the window. Treated as a
    /// successful connection.
    #[error("screen capture service has no content for the requested window")]
    NotFound,
    #[error("screen capture service returned HTTP {0}")]
    Status(u16),
    #[error("screen capture request failed: {0}")]
    Transport(String),
    #[error("invalid screen capture response: {0}")]
    Decode(String),
}

impl ProbeError {
    pub fn counts_as_reachable(&self) -> bool {
        matches!(self, ProbeError::NotFound)
    }
}

/// Query side of the external screen-capture/OCR service.
///
/// The service is polled; a push-based source can implement the same trait
/// by answering from its latest buffered content.
#[async_trait]
pub trait ScreenCaptureSource: Send + Sync {
    async fn query(&self, query: &OcrQuery) -> Result<OcrResult, ProbeError>;
}
