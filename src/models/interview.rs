use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interview record as read from the interview store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewConfig {
    pub id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub question_count: u32,
    #[serde(default, alias = "screenMonitoring")]
    pub requires_monitoring: bool,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub analysis: Option<serde_json::Value>,
}

impl InterviewConfig {
    pub fn new(id: impl Into<String>, topic: impl Into<String>, requires_monitoring: bool) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            question_count: 0,
            requires_monitoring,
            started_at: None,
            ended_at: None,
            analysis: None,
        }
    }
}
