use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DiagnosticSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Clean,
    Suspicious,
}

/// End-of-interview rollup of every stored diagnostics tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSummary {
    pub interview_id: String,
    pub snapshot_count: usize,
    pub suspicious_ticks: usize,
    pub violation_count: usize,
    pub violations_by_label: BTreeMap<String, usize>,
    pub pose_breakdown: BTreeMap<String, usize>,
    pub face_breakdown: BTreeMap<String, usize>,
    pub first_capture: Option<DateTime<Utc>>,
    pub last_capture: Option<DateTime<Utc>>,
    pub verdict: Verdict,
}

impl DiagnosticsSummary {
    pub fn from_snapshots(interview_id: &str, snapshots: &[DiagnosticSnapshot]) -> Self {
        let mut pose_breakdown = BTreeMap::new();
        let mut face_breakdown = BTreeMap::new();

        for snapshot in snapshots {
            if let Some(pose) = &snapshot.pose_status {
                *pose_breakdown.entry(pose.clone()).or_insert(0) += 1;
            }
            if let Some(face) = &snapshot.face_status {
                *face_breakdown.entry(face.clone()).or_insert(0) += 1;
            }
        }

        // Each snapshot carries the running list, so the longest one holds
        // every violation of the session.
        let mut violations_by_label = BTreeMap::new();
        let latest = snapshots.iter().max_by_key(|s| s.violations.len());
        let violation_count = latest.map(|s| s.violations.len()).unwrap_or(0);
        if let Some(latest) = latest {
            for violation in &latest.violations {
                *violations_by_label.entry(violation.label.clone()).or_insert(0) += 1;
            }
        }

        let verdict = if violation_count > 0 {
            Verdict::Suspicious
        } else {
            Verdict::Clean
        };

        Self {
            interview_id: interview_id.to_string(),
            snapshot_count: snapshots.len(),
            suspicious_ticks: snapshots.iter().filter(|s| s.suspicious).count(),
            violation_count,
            violations_by_label,
            pose_breakdown,
            face_breakdown,
            first_capture: snapshots.iter().map(|s| s.captured_at).min(),
            last_capture: snapshots.iter().map(|s| s.captured_at).max(),
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Violation;
    use chrono::Duration;

    fn tick(at: DateTime<Utc>, pose: &str, violations: Vec<Violation>, suspicious: bool) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            id: None,
            interview_id: "iv".into(),
            pose_status: Some(pose.into()),
            face_status: Some("Forward".into()),
            camera_image: None,
            screen_data: None,
            violations,
            suspicious,
            captured_at: at,
        }
    }

    #[test]
    fn empty_session_is_clean() {
        let summary = DiagnosticsSummary::from_snapshots("iv", &[]);
        assert_eq!(summary.snapshot_count, 0);
        assert_eq!(summary.verdict, Verdict::Clean);
        assert!(summary.first_capture.is_none());
    }

    #[test]
    fn counts_running_list_once() {
        let t0 = Utc::now();
        let first = vec![
            Violation::new("tab not active", t0),
            Violation::new("google", t0),
        ];
        let mut second = first.clone();
        second.push(Violation::new("tab not active", t0 + Duration::seconds(10)));

        let snapshots = vec![
            tick(t0, "Good Pose", first, true),
            tick(t0 + Duration::seconds(10), "Bad Pose", second, true),
            tick(t0 + Duration::seconds(20), "Good Pose", Vec::new(), false),
        ];

        let summary = DiagnosticsSummary::from_snapshots("iv", &snapshots);
        assert_eq!(summary.snapshot_count, 3);
        assert_eq!(summary.suspicious_ticks, 2);
        assert_eq!(summary.violation_count, 3);
        assert_eq!(summary.violations_by_label.get("tab not active"), Some(&2));
        assert_eq!(summary.violations_by_label.get("google"), Some(&1));
        assert_eq!(summary.pose_breakdown.get("Good Pose"), Some(&2));
        assert_eq!(summary.face_breakdown.get("Forward"), Some(&3));
        assert_eq!(summary.last_capture, Some(t0 + Duration::seconds(20)));
        assert_eq!(summary.verdict, Verdict::Suspicious);
    }
}
