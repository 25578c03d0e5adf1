use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::backend::InterviewStore;
use crate::db::{
    helpers::{parse_optional_datetime, parse_optional_json, to_u32},
    Database,
};
use crate::models::InterviewConfig;

fn row_to_interview(row: &Row) -> Result<InterviewConfig> {
    let started_at: Option<String> = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let analysis_json: Option<String> = row.get("analysis_json")?;
    let question_count: i64 = row.get("question_count")?;
    let requires_monitoring: bool = row.get("requires_monitoring")?;

    Ok(InterviewConfig {
        id: row.get("id")?,
        topic: row.get("topic")?,
        question_count: to_u32(question_count, "question_count")?,
        requires_monitoring,
        started_at: parse_optional_datetime(started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        analysis: parse_optional_json(analysis_json, "analysis_json")?,
    })
}

impl Database {
    pub async fn create_interview(&self, interview: &InterviewConfig) -> Result<()> {
        let record = interview.clone();
        let now = Utc::now();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO interviews (id, topic, question_count, requires_monitoring, started_at, ended_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.topic,
                    i64::from(record.question_count),
                    record.requires_monitoring,
                    record.started_at.map(|dt| dt.to_rfc3339()),
                    record.ended_at.map(|dt| dt.to_rfc3339()),
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .context("failed to insert interview")?;
            Ok(())
        })
        .await
    }

    pub async fn find_interview(&self, interview_id: &str) -> Result<Option<InterviewConfig>> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, topic, question_count, requires_monitoring, started_at, ended_at, analysis_json
                 FROM interviews
                 WHERE id = ?1",
            )?;

            let interview = stmt
                .query_row(params![interview_id], |row| Ok(row_to_interview(row)))
                .optional()?
                .transpose()?;
            Ok(interview)
        })
        .await
    }

    pub async fn mark_interview_started(&self, interview_id: &str, started_at: DateTime<Utc>) -> Result<()> {
        self.update_timestamp(interview_id, "started_at", started_at).await
    }

    pub async fn mark_interview_ended(&self, interview_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        self.update_timestamp(interview_id, "ended_at", ended_at).await
    }

    pub async fn save_analysis(&self, interview_id: &str, analysis: &serde_json::Value) -> Result<()> {
        let interview_id = interview_id.to_string();
        let analysis_json =
            serde_json::to_string(analysis).context("failed to serialize analysis")?;
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE interviews
                     SET analysis_json = ?1,
                         updated_at = ?2
                     WHERE id = ?3",
                    params![analysis_json, Utc::now().to_rfc3339(), interview_id],
                )
                .context("failed to save interview analysis")?;
            if updated == 0 {
                return Err(anyhow!("interview {interview_id} not found"));
            }
            Ok(())
        })
        .await
    }

    async fn update_timestamp(
        &self,
        interview_id: &str,
        column: &'static str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let interview_id = interview_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "UPDATE interviews SET {column} = ?1, updated_at = ?2 WHERE id = ?3"
            );
            let updated = conn
                .execute(&sql, params![at.to_rfc3339(), Utc::now().to_rfc3339(), interview_id])
                .with_context(|| format!("failed to update {column}"))?;
            if updated == 0 {
                return Err(anyhow!("interview {interview_id} not found"));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl InterviewStore for Database {
    async fn get_interview(&self, interview_id: &str) -> Result<InterviewConfig> {
        self.find_interview(interview_id)
            .await?
            .ok_or_else(|| anyhow!("interview {interview_id} not found"))
    }

    async fn record_start(&self, interview_id: &str, started_at: DateTime<Utc>) -> Result<()> {
        self.mark_interview_started(interview_id, started_at).await
    }

    async fn record_end(&self, interview_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        self.mark_interview_ended(interview_id, ended_at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interview_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("shortlist.sqlite3")).unwrap();

        let mut interview = InterviewConfig::new("iv-1", "Rust systems", true);
        interview.question_count = 4;
        db.create_interview(&interview).await.unwrap();

        let loaded = db.get_interview("iv-1").await.unwrap();
        assert_eq!(loaded, interview);

        let started = Utc::now();
        db.record_start("iv-1", started).await.unwrap();
        db.record_end("iv-1", started + chrono::Duration::minutes(30))
            .await
            .unwrap();
        db.save_analysis("iv-1", &serde_json::json!({"verdict": "clean"}))
            .await
            .unwrap();

        let loaded = db.get_interview("iv-1").await.unwrap();
        assert_eq!(
            loaded.started_at.map(|dt| dt.timestamp_millis()),
            Some(started.timestamp_millis())
        );
        assert!(loaded.ended_at.is_some());
        assert_eq!(loaded.analysis.unwrap()["verdict"], "clean");
    }

    #[tokio::test]
    async fn unknown_interview_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("shortlist.sqlite3")).unwrap();

        assert!(db.find_interview("missing").await.unwrap().is_none());
        assert!(db.get_interview("missing").await.is_err());
        assert!(db.record_start("missing", Utc::now()).await.is_err());
    }
}
