use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use rusqlite::params;

use crate::analysis::DiagnosticsSummary;
use crate::backend::{AnalysisService, DiagnosticsSink};
use crate::db::{
    helpers::{parse_datetime, parse_optional_json},
    Database,
};
use crate::models::{DiagnosticSnapshot, OcrResult, Violation};

impl Database {
    pub async fn insert_diagnostic(&self, snapshot: &DiagnosticSnapshot) -> Result<i64> {
        let record = snapshot.clone();
        let screen_json = record
            .screen_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("failed to serialize screen data")?;
        let violations_json =
            serde_json::to_string(&record.violations).context("failed to serialize violations")?;

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO diagnostics (
                    interview_id,
                    captured_at,
                    pose_status,
                    face_status,
                    camera_image,
                    screen_json,
                    violations_json,
                    suspicious
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.interview_id,
                    record.captured_at.to_rfc3339(),
                    record.pose_status,
                    record.face_status,
                    record.camera_image,
                    screen_json,
                    violations_json,
                    record.suspicious,
                ],
            )
            .context("failed to insert diagnostic snapshot")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn get_diagnostics_for_interview(
        &self,
        interview_id: &str,
    ) -> Result<Vec<DiagnosticSnapshot>> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    id,
                    interview_id,
                    captured_at,
                    pose_status,
                    face_status,
                    camera_image,
                    screen_json,
                    violations_json,
                    suspicious
                FROM diagnostics
                WHERE interview_id = ?1
                ORDER BY captured_at ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![interview_id])?;
            let mut snapshots = Vec::new();
            while let Some(row) = rows.next()? {
                let captured_at: String = row.get(2)?;
                let screen_json: Option<String> = row.get(6)?;
                let violations_json: String = row.get(7)?;
                let violations: Vec<Violation> = serde_json::from_str(&violations_json)
                    .context("failed to parse violations_json")?;

                snapshots.push(DiagnosticSnapshot {
                    id: row.get(0)?,
                    interview_id: row.get(1)?,
                    captured_at: parse_datetime(&captured_at, "captured_at")?,
                    pose_status: row.get(3)?,
                    face_status: row.get(4)?,
                    camera_image: row.get(5)?,
                    screen_data: parse_optional_json::<OcrResult>(screen_json, "screen_json")?,
                    violations,
                    suspicious: row.get(8)?,
                });
            }

            Ok(snapshots)
        })
        .await
    }
}

#[async_trait]
impl DiagnosticsSink for Database {
    async fn send(&self, snapshot: &DiagnosticSnapshot) -> Result<()> {
        self.insert_diagnostic(snapshot).await.map(|_| ())
    }
}

#[async_trait]
impl AnalysisService for Database {
    async fn request_analysis(&self, interview_id: &str) -> Result<serde_json::Value> {
        let snapshots = self.get_diagnostics_for_interview(interview_id).await?;
        let summary = DiagnosticsSummary::from_snapshots(interview_id, &snapshots);
        let analysis = serde_json::to_value(&summary).context("failed to serialize summary")?;

        self.save_analysis(interview_id, &analysis).await?;
        info!(
            "Saved analysis for {} ({} snapshots, {} violations)",
            interview_id, summary.snapshot_count, summary.violation_count
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InterviewStore;
    use crate::models::{ContentItem, InterviewConfig};
    use chrono::{Duration, Utc};

    fn snapshot(at: chrono::DateTime<Utc>, violations: Vec<Violation>) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            id: None,
            interview_id: "iv-1".into(),
            pose_status: Some("Good Pose".into()),
            face_status: Some("Left".into()),
            camera_image: None,
            screen_data: Some(OcrResult {
                data: vec![ContentItem::ocr("Google Search")],
            }),
            suspicious: !violations.is_empty(),
            violations,
            captured_at: at,
        }
    }

    #[tokio::test]
    async fn stores_snapshots_and_summarizes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("shortlist.sqlite3")).unwrap();
        db.create_interview(&InterviewConfig::new("iv-1", "Rust", true))
            .await
            .unwrap();

        let t0 = Utc::now();
        let first = vec![
            Violation::new("tab not active", t0),
            Violation::new("google", t0),
        ];
        db.send(&snapshot(t0, first.clone())).await.unwrap();
        db.send(&snapshot(t0 + Duration::seconds(10), first)).await.unwrap();

        let stored = db.get_diagnostics_for_interview("iv-1").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].id.is_some());
        assert_eq!(stored[0].violations.len(), 2);
        assert_eq!(
            stored[0].screen_data.as_ref().unwrap().data[0]
                .content
                .window_name
                .as_deref(),
            Some("Google Search")
        );

        let analysis = db.request_analysis("iv-1").await.unwrap();
        assert_eq!(analysis["snapshotCount"], 2);
        assert_eq!(analysis["violationCount"], 2);
        assert_eq!(analysis["verdict"], "suspicious");

        let interview = db.get_interview("iv-1").await.unwrap();
        assert_eq!(interview.analysis, Some(analysis));
    }

    #[tokio::test]
    async fn snapshot_for_unknown_interview_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("shortlist.sqlite3")).unwrap();
        assert!(db.send(&snapshot(Utc::now(), Vec::new())).await.is_err());
    }
}
