use serde::{Deserialize, Serialize};

/// Coarse connection state of the screen-capture service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    Retrying,
    Initializing,
    Ready,
    Error,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::Retrying
    }
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Retrying => "retrying",
            ConnectionStatus::Initializing => "initializing",
            ConnectionStatus::Ready => "ready",
            ConnectionStatus::Error => "error",
        }
    }

    /// Text shown to the candidate while the monitor is in this state.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConnectionStatus::Retrying => "Connecting to the screen monitoring service...",
            ConnectionStatus::Initializing => "Screen monitoring connected, initializing...",
            ConnectionStatus::Ready => "Screen monitoring is active",
            ConnectionStatus::Error => {
                "Screen monitoring service not found. Start the backend and refresh the page."
            }
        }
    }
}
