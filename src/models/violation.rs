use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used when the active window is not the interview tab.
pub const TAB_NOT_ACTIVE: &str = "tab not active";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

impl Violation {
    pub fn new(label: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            label: label.into(),
        }
    }
}
