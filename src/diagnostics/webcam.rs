use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Latest outputs of the webcam pose/face analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebcamReading {
    /// e.g. "Good Pose" / "Bad Pose"
    pub pose_status: Option<String>,
    /// e.g. "Forward", "Left", "Right", "No Face Detected"
    pub face_status: Option<String>,
    pub camera_image: Option<String>,
}

/// Polled, never subscribed: the reporter reads whatever is current at tick time.
pub trait PoseFaceSource: Send + Sync {
    fn read(&self) -> WebcamReading;
}

/// In-memory slot the host writes analyzer outputs into.
#[derive(Clone, Default)]
pub struct WebcamSignals {
    inner: Arc<RwLock<WebcamReading>>,
}

impl WebcamSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pose(&self, status: Option<String>) {
        self.update(|reading| reading.pose_status = status);
    }

    pub fn set_face(&self, status: Option<String>) {
        self.update(|reading| reading.face_status = status);
    }

    pub fn set_camera_image(&self, image: Option<String>) {
        self.update(|reading| reading.camera_image = image);
    }

    fn update<F: FnOnce(&mut WebcamReading)>(&self, apply: F) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        apply(&mut guard);
    }
}

impl PoseFaceSource for WebcamSignals {
    fn read(&self) -> WebcamReading {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_latest_values() {
        let signals = WebcamSignals::new();
        let writer = signals.clone();

        writer.set_pose(Some("Bad Pose".into()));
        writer.set_face(Some("No Face Detected".into()));
        assert_eq!(signals.read().pose_status.as_deref(), Some("Bad Pose"));

        writer.set_pose(Some("Good Pose".into()));
        let reading = signals.read();
        assert_eq!(reading.pose_status.as_deref(), Some("Good Pose"));
        assert_eq!(reading.face_status.as_deref(), Some("No Face Detected"));
        assert!(reading.camera_image.is_none());
    }
}
