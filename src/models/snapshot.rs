use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OcrResult, Violation};

/// One diagnostics tick, shaped for the persistence endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    #[serde(skip)]
    pub id: Option<i64>,
    pub interview_id: String,
    #[serde(rename = "poseData")]
    pub pose_status: Option<String>,
    #[serde(rename = "faceData")]
    pub face_status: Option<String>,
    pub camera_image: Option<String>,
    #[serde(rename = "screenpipeData")]
    pub screen_data: Option<OcrResult>,
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub suspicious: bool,
    pub captured_at: DateTime<Utc>,
}
