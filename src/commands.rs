//! JSON-line command protocol between the proctor and its host page.
//!
//! The host sends one command per line on stdin and receives one event per
//! line on stdout.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::ChatReply;
use crate::diagnostics::WebcamSignals;
use crate::models::ConnectionStatus;
use crate::session::{InterviewController, SessionSnapshot, SessionSummary};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum SessionCommand {
    CameraPermission { granted: bool },
    AvatarLoaded { loaded: bool },
    Pose { status: Option<String> },
    Face { status: Option<String> },
    CameraFrame { image: Option<String> },
    Start,
    ChatReply { reply: ChatReply },
    End,
    Status,
    Unmount,
}

impl SessionCommand {
    pub fn parse_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).with_context(|| format!("invalid command: {line}"))
    }

    fn name(&self) -> &'static str {
        match self {
            SessionCommand::CameraPermission { .. } => "cameraPermission",
            SessionCommand::AvatarLoaded { .. } => "avatarLoaded",
            SessionCommand::Pose { .. } => "pose",
            SessionCommand::Face { .. } => "face",
            SessionCommand::CameraFrame { .. } => "cameraFrame",
            SessionCommand::Start => "start",
            SessionCommand::ChatReply { .. } => "chatReply",
            SessionCommand::End => "end",
            SessionCommand::Status => "status",
            SessionCommand::Unmount => "unmount",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    Ack {
        command: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    Started {
        started_at: DateTime<Utc>,
    },
    StartBlocked {
        reason: String,
    },
    InterviewOver {
        summary: SessionSummary,
    },
    Status {
        session: SessionSnapshot,
    },
    MonitorStatusChanged {
        status: ConnectionStatus,
        message: &'static str,
    },
    Error {
        message: String,
    },
    Unmounted,
}

impl HostEvent {
    pub fn monitor_status(status: ConnectionStatus) -> Self {
        HostEvent::MonitorStatusChanged {
            status,
            message: status.user_message(),
        }
    }

    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize host event")
    }
}

/// Applies host commands to one interview controller.
pub struct CommandHost {
    controller: InterviewController,
    webcam: WebcamSignals,
}

impl CommandHost {
    pub fn new(controller: InterviewController, webcam: WebcamSignals) -> Self {
        Self { controller, webcam }
    }

    pub fn controller(&self) -> &InterviewController {
        &self.controller
    }

    pub async fn dispatch(&self, command: SessionCommand) -> HostEvent {
        let name = command.name();
        match command {
            SessionCommand::CameraPermission { granted } => {
                self.controller.set_camera_ready(granted);
                HostEvent::Ack { command: name }
            }
            SessionCommand::AvatarLoaded { loaded } => {
                self.controller.set_avatar_ready(loaded);
                HostEvent::Ack { command: name }
            }
            SessionCommand::Pose { status } => {
                self.webcam.set_pose(status);
                HostEvent::Ack { command: name }
            }
            SessionCommand::Face { status } => {
                self.webcam.set_face(status);
                HostEvent::Ack { command: name }
            }
            SessionCommand::CameraFrame { image } => {
                self.webcam.set_camera_image(image);
                HostEvent::Ack { command: name }
            }
            SessionCommand::Start => match self.controller.start().await {
                Ok(started_at) => HostEvent::Started { started_at },
                Err(err) => HostEvent::StartBlocked {
                    reason: err.to_string(),
                },
            },
            SessionCommand::ChatReply { reply } => {
                match self.controller.handle_chat_reply(&reply).await {
                    Ok(Some(summary)) => HostEvent::InterviewOver { summary },
                    Ok(None) => HostEvent::Ack { command: name },
                    Err(err) => HostEvent::Error {
                        message: format!("{err:#}"),
                    },
                }
            }
            SessionCommand::End => match self.controller.end().await {
                Ok(summary) => HostEvent::InterviewOver { summary },
                Err(err) => HostEvent::Error {
                    message: format!("{err:#}"),
                },
            },
            SessionCommand::Status => HostEvent::Status {
                session: self.controller.snapshot(),
            },
            SessionCommand::Unmount => {
                self.controller.unmount();
                HostEvent::Unmounted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_lines() {
        assert_eq!(
            SessionCommand::parse_line(r#"{"command":"cameraPermission","granted":false}"#).unwrap(),
            SessionCommand::CameraPermission { granted: false }
        );
        assert_eq!(
            SessionCommand::parse_line("  {\"command\":\"start\"}\n").unwrap(),
            SessionCommand::Start
        );
        assert_eq!(
            SessionCommand::parse_line(r#"{"command":"pose","status":"Bad Pose"}"#).unwrap(),
            SessionCommand::Pose {
                status: Some("Bad Pose".into())
            }
        );

        let chat = SessionCommand::parse_line(
            r#"{"command":"chatReply","reply":{"response":"Goodbye","isOver":true}}"#,
        )
        .unwrap();
        match chat {
            SessionCommand::ChatReply { reply } => assert!(reply.signals_completion()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(SessionCommand::parse_line(r#"{"command":"reboot"}"#).is_err());
        assert!(SessionCommand::parse_line("not json").is_err());
    }

    #[test]
    fn events_serialize_with_tag() {
        let line = HostEvent::monitor_status(ConnectionStatus::Error)
            .to_line()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "monitorStatusChanged");
        assert_eq!(value["status"], "error");
        assert!(value["message"].as_str().unwrap().contains("refresh"));

        let started = HostEvent::Started {
            started_at: Utc::now(),
        };
        let value: serde_json::Value = serde_json::from_str(&started.to_line().unwrap()).unwrap();
        assert!(value.get("startedAt").is_some());
    }
}
