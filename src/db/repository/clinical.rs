use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::db::DatabaseError;

/// Latest EHR snapshot for a patient, with list fields decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalSnapshot {
    pub doctor_email: String,
    pub patient_email: String,
    pub epic_patient_id: String,
    pub clinical_notes: Option<String>,
    /// Display names, e.g. "Essential (primary) hypertension (I10)".
    pub diagnoses: Vec<String>,
    /// e.g. "Lisinopril 10mg, Once daily".
    pub medications: Vec<String>,
}

/// Insert or replace the snapshot for (doctor, EHR patient id).
/// `diagnoses` / `medications` are stored as given (JSON arrays).
pub fn upsert_snapshot(
    conn: &Connection,
    doctor_email: &str,
    patient_email: &str,
    epic_patient_id: &str,
    clinical_notes: Option<&str>,
    diagnoses: &Value,
    medications: &Value,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO epic_patient_data
             (doctor_email, patient_email, epic_patient_id, clinical_notes, diagnoses, medications)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (doctor_email, epic_patient_id) DO UPDATE SET
             patient_email = excluded.patient_email,
             clinical_notes = excluded.clinical_notes,
             diagnoses = excluded.diagnoses,
             medications = excluded.medications,
             last_synced = datetime('now')",
        params![
            doctor_email.to_lowercase(),
            patient_email.to_lowercase(),
            epic_patient_id,
            clinical_notes,
            diagnoses.to_string(),
            medications.to_string(),
        ],
    )?;
    Ok(())
}

pub fn latest_snapshot_for_patient(
    conn: &Connection,
    patient_email: &str,
) -> Result<Option<ClinicalSnapshot>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT doctor_email, patient_email, epic_patient_id, clinical_notes, diagnoses, medications
             FROM epic_patient_data
             WHERE patient_email = ?1 COLLATE NOCASE
             ORDER BY last_synced DESC, id DESC
             LIMIT 1",
            params![patient_email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?;

    Ok(row.map(
        |(doctor_email, patient, epic_patient_id, notes, diagnoses, medications)| ClinicalSnapshot {
            doctor_email,
            patient_email: patient.unwrap_or_default(),
            epic_patient_id,
            clinical_notes: notes.filter(|n| !n.trim().is_empty()),
            diagnoses: decode_list(diagnoses.as_deref(), diagnosis_label),
            medications: decode_list(medications.as_deref(), medication_label),
        },
    ))
}

/// Decode a JSON array column. Malformed JSON decodes to an empty list so a
/// bad sync row does not block video generation.
fn decode_list(raw: Option<&str>, label: fn(&Value) -> Option<String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items.iter().filter_map(label).collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable clinical list column");
            Vec::new()
        }
    }
}

fn diagnosis_label(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => non_empty(s),
        Value::Object(map) => {
            let name = map
                .get("display")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .and_then(non_empty)?;
            match map.get("code").and_then(Value::as_str).and_then(non_empty) {
                Some(code) => Some(format!("{name} ({code})")),
                None => Some(name),
            }
        }
        _ => None,
    }
}

fn medication_label(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => non_empty(s),
        Value::Object(map) => {
            let name = map.get("name").and_then(Value::as_str).and_then(non_empty)?;
            let dose = map.get("dosage").and_then(Value::as_str).and_then(non_empty);
            let frequency = map.get("frequency").and_then(Value::as_str).and_then(non_empty);
            let mut label = name;
            if let Some(dose) = dose {
                label = format!("{label} {dose}");
            }
            if let Some(frequency) = frequency {
                label = format!("{label}, {frequency}");
            }
            Some(label)
        }
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
