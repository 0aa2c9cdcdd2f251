use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Artifact, ArtifactMetadata, CaseKey};

/// Record a stored video. `file_name` is `<case_key>.<ext>`.
pub fn insert_video(conn: &Connection, artifact: &Artifact, file_name: &str) -> Result<(), DatabaseError> {
    let meta = &artifact.metadata;
    conn.execute(
        "INSERT INTO patient_files
             (artifact_id, doctor_email, patient_email, file_type, file_url, file_name,
              case_key, storage_path, content_type, diagnosis_code, procedure_code,
              recovery_day, recovery_milestone, created_at)
         VALUES (?1, ?2, ?3, 'video', ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            artifact.id.to_string(),
            meta.doctor_id,
            meta.patient_id,
            artifact.video_url,
            file_name,
            artifact.case_key.as_str(),
            artifact.storage_path,
            artifact.content_type,
            meta.diagnosis_code,
            meta.procedure_code,
            meta.recovery_day,
            meta.recovery_milestone,
            artifact.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ],
    )?;
    Ok(())
}

/// Most recent video stored under `case_key`.
pub fn latest_video(conn: &Connection, case_key: &CaseKey) -> Result<Option<Artifact>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT artifact_id, file_url, storage_path, content_type, created_at,
                    doctor_email, patient_email, diagnosis_code, procedure_code,
                    recovery_day, recovery_milestone
             FROM patient_files
             WHERE case_key = ?1 AND file_type = 'video'
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            params![case_key.as_str()],
            |row| {
                Ok(VideoRow {
                    artifact_id: row.get(0)?,
                    file_url: row.get(1)?,
                    storage_path: row.get(2)?,
                    content_type: row.get(3)?,
                    created_at: row.get(4)?,
                    doctor_email: row.get(5)?,
                    patient_email: row.get(6)?,
                    diagnosis_code: row.get(7)?,
                    procedure_code: row.get(8)?,
                    recovery_day: row.get(9)?,
                    recovery_milestone: row.get(10)?,
                })
            },
        )
        .optional()?;

    row.map(|r| r.into_artifact(case_key)).transpose()
}

struct VideoRow {
    artifact_id: Option<String>,
    file_url: String,
    storage_path: Option<String>,
    content_type: Option<String>,
    created_at: String,
    doctor_email: String,
    patient_email: String,
    diagnosis_code: Option<String>,
    procedure_code: Option<String>,
    recovery_day: Option<i32>,
    recovery_milestone: Option<String>,
}

impl VideoRow {
    fn into_artifact(self, case_key: &CaseKey) -> Result<Artifact, DatabaseError> {
        let id = match self.artifact_id.as_deref() {
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|e| DatabaseError::ConstraintViolation(format!("artifact_id {raw}: {e}")))?,
            None => {
                return Err(DatabaseError::ConstraintViolation(format!(
                    "video for {case_key} has no artifact id"
                )))
            }
        };
        Ok(Artifact {
            id,
            case_key: case_key.clone(),
            video_url: self.file_url,
            storage_path: self.storage_path.unwrap_or_default(),
            content_type: self.content_type.unwrap_or_else(|| "video/mp4".into()),
            created_at: parse_timestamp(&self.created_at)?,
            metadata: ArtifactMetadata {
                doctor_id: self.doctor_email,
                patient_id: self.patient_email,
                diagnosis_code: self.diagnosis_code.unwrap_or_default(),
                procedure_code: self.procedure_code.unwrap_or_default(),
                recovery_day: self.recovery_day,
                recovery_milestone: self.recovery_milestone,
            },
        })
    }
}

/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS` (UTC).
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::ConstraintViolation(format!("created_at {raw}: {e}")))
}

/// Record an uploaded document and its extracted text.
pub fn insert_document(
    conn: &Connection,
    doctor_email: &str,
    patient_email: &str,
    file_url: &str,
    file_name: &str,
    extracted_text: Option<&str>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_files
             (doctor_email, patient_email, file_type, file_url, file_name, extracted_text)
         VALUES (?1, ?2, 'file', ?3, ?4, ?5)",
        params![
            doctor_email.to_lowercase(),
            patient_email.to_lowercase(),
            file_url,
            file_name,
            extracted_text,
        ],
    )?;
    Ok(())
}

/// Extracted text of the patient's `limit` most recent documents, newest
/// first. Blank texts are skipped.
pub fn recent_document_texts(
    conn: &Connection,
    patient_email: &str,
    limit: usize,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT extracted_text FROM patient_files
         WHERE patient_email = ?1 COLLATE NOCASE AND file_type = 'file'
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![patient_email, limit as i64], |row| {
        row.get::<_, Option<String>>(0)
    })?;

    let mut texts = Vec::new();
    for row in rows {
        if let Some(text) = row? {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                texts.push(trimmed.to_string());
            }
        }
    }
    Ok(texts)
}
