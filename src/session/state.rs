use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::is_suspicious;
use crate::models::{ConnectionStatus, Violation};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InterviewPhase {
    NotStarted,
    Active,
    Over,
}

impl Default for InterviewPhase {
    fn default() -> Self {
        InterviewPhase::NotStarted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("Camera access is required to start the interview. Allow camera permission and try again.")]
    CameraNotReady,
    #[error("The interviewer avatar is still loading. Please wait a moment.")]
    AvatarNotReady,
    #[error("Screen monitoring is still connecting ({0}). Please wait until it is ready.")]
    MonitorNotReady(&'static str),
    #[error("Screen monitoring service not found. Start the backend and refresh the page.")]
    MonitorUnavailable,
    #[error("The interview has already started or finished.")]
    AlreadyStarted,
}

/// Guard conditions on `NotStarted -> Active`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessGates {
    pub camera: bool,
    pub avatar: bool,
    pub monitor_required: bool,
    pub monitor_status: ConnectionStatus,
}

impl ReadinessGates {
    pub fn monitor_ready(&self) -> bool {
        !self.monitor_required || self.monitor_status == ConnectionStatus::Ready
    }

    pub fn all_met(&self) -> bool {
        self.check().is_ok()
    }

    /// First unmet gate, in the order the candidate has to fix them.
    pub fn check(&self) -> Result<(), StartError> {
        if !self.camera {
            return Err(StartError::CameraNotReady);
        }
        if !self.avatar {
            return Err(StartError::AvatarNotReady);
        }
        if !self.monitor_ready() {
            return Err(match self.monitor_status {
                ConnectionStatus::Error => StartError::MonitorUnavailable,
                status => StartError::MonitorNotReady(status.as_str()),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: InterviewPhase,
    pub camera_ready: bool,
    pub avatar_ready: bool,
    pub violations: Vec<Violation>,
    pub suspicious: bool,
    pub ticks: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gates(&self, monitor_required: bool, monitor_status: ConnectionStatus) -> ReadinessGates {
        ReadinessGates {
            camera: self.camera_ready,
            avatar: self.avatar_ready,
            monitor_required,
            monitor_status,
        }
    }

    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.phase = InterviewPhase::Active;
        self.violations.clear();
        self.suspicious = false;
        self.ticks = 0;
        self.started_at = Some(now);
        self.ended_at = None;
    }

    /// Merge one tick's findings. The list only grows; the flag reflects this
    /// tick alone. Ignored outside `Active`.
    pub fn record_tick(&mut self, found: Vec<Violation>) -> bool {
        if self.phase != InterviewPhase::Active {
            return false;
        }
        self.suspicious = is_suspicious(&found);
        self.violations.extend(found);
        self.ticks += 1;
        true
    }

    pub fn finish(&mut self, now: DateTime<Utc>) {
        self.phase = InterviewPhase::Over;
        self.suspicious = false;
        self.ended_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates(camera: bool, avatar: bool, required: bool, status: ConnectionStatus) -> ReadinessGates {
        ReadinessGates {
            camera,
            avatar,
            monitor_required: required,
            monitor_status: status,
        }
    }

    #[test]
    fn camera_gate_reported_first() {
        let err = gates(false, false, true, ConnectionStatus::Retrying)
            .check()
            .unwrap_err();
        assert_eq!(err, StartError::CameraNotReady);
        assert!(err.to_string().contains("Camera"));
    }

    #[test]
    fn monitor_gate_only_when_required() {
        assert!(gates(true, true, false, ConnectionStatus::Error).all_met());
        assert_eq!(
            gates(true, true, true, ConnectionStatus::Initializing).check(),
            Err(StartError::MonitorNotReady("initializing"))
        );
        assert_eq!(
            gates(true, true, true, ConnectionStatus::Error).check(),
            Err(StartError::MonitorUnavailable)
        );
        assert!(gates(true, true, true, ConnectionStatus::Ready).all_met());
    }

    #[test]
    fn ticks_accumulate_and_flag_tracks_latest() {
        let now = Utc::now();
        let mut state = SessionState::new();

        assert!(!state.record_tick(vec![Violation::new("google", now)]));
        assert!(state.violations.is_empty());

        state.begin(now);
        state.record_tick(vec![Violation::new("google", now), Violation::new("github", now)]);
        assert!(state.suspicious);
        state.record_tick(Vec::new());
        assert!(!state.suspicious);
        assert_eq!(state.violations.len(), 2);
        assert_eq!(state.ticks, 2);

        state.begin(now);
        assert!(state.violations.is_empty());
        assert_eq!(state.phase, InterviewPhase::Active);
    }
}
