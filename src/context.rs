//! Clinical context from the local SQLite database.
//!
//! Patient and doctor must exist (`ContextError::NotFound` otherwise). The
//! EHR snapshot and uploaded documents are optional: a patient without
//! them still gets a video, just a less specific one.

use async_trait::async_trait;

use crate::db::{self, Database, DatabaseError, UserType};
use crate::generation::{ContextError, ContextProvider};
use crate::models::{ClinicalContext, ContextQuery, DoctorRecord, PatientRecord, RecoveryContext};
use crate::recovery_plan;

/// Documents whose extracted text is folded into the notes.
const RECENT_DOCUMENTS: usize = 5;

pub struct SqliteContextProvider {
    db: Database,
}

impl SqliteContextProvider {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl From<DatabaseError> for ContextError {
    fn from(err: DatabaseError) -> Self {
        ContextError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl ContextProvider for SqliteContextProvider {
    async fn doctor_specialty(&self, doctor_id: &str) -> Result<Option<String>, ContextError> {
        let email = doctor_id.to_string();
        let doctor = self
            .db
            .call(move |conn| db::get_user(conn, &email, UserType::Doctor))
            .await?;
        doctor
            .map(|d| d.specialty)
            .ok_or_else(|| ContextError::NotFound {
                entity: "doctor",
                id: doctor_id.to_string(),
            })
    }

    async fn fetch_context(&self, query: &ContextQuery) -> Result<ClinicalContext, ContextError> {
        let q = query.clone();
        let (patient, doctor, snapshot, documents) = self
            .db
            .call(move |conn| {
                Ok((
                    db::get_user(conn, &q.patient_id, UserType::Patient)?,
                    db::get_user(conn, &q.doctor_id, UserType::Doctor)?,
                    db::latest_snapshot_for_patient(conn, &q.patient_id)?,
                    db::recent_document_texts(conn, &q.patient_id, RECENT_DOCUMENTS)?,
                ))
            })
            .await?;

        let patient = patient.ok_or_else(|| ContextError::NotFound {
            entity: "patient",
            id: query.patient_id.clone(),
        })?;
        let doctor = doctor.ok_or_else(|| ContextError::NotFound {
            entity: "doctor",
            id: query.doctor_id.clone(),
        })?;

        let (diagnoses, medications, clinical_notes) = match snapshot {
            Some(s) => (s.diagnoses, s.medications, s.clinical_notes),
            None => {
                tracing::debug!(patient = %query.patient_id, "No clinical snapshot on file");
                (Vec::new(), Vec::new(), None)
            }
        };

        let notes: Vec<String> = clinical_notes.into_iter().chain(documents).collect();
        let notes = (!notes.is_empty()).then(|| notes.join("\n"));

        Ok(ClinicalContext {
            patient: PatientRecord {
                email: patient.email,
                first_name: patient.first_name,
                last_name: patient.last_name,
            },
            doctor: DoctorRecord {
                email: doctor.email,
                first_name: doctor.first_name,
                last_name: doctor.last_name,
                specialty: doctor.specialty,
            },
            diagnosis_code: query.diagnosis_code.clone(),
            procedure_code: query.procedure_code.clone(),
            diagnoses,
            medications,
            notes,
            recovery: query
                .recovery_day
                .map(|day| recovery_context(day, query.recovery_milestone.as_deref())),
        })
    }
}

fn recovery_context(day: u8, milestone: Option<&str>) -> RecoveryContext {
    let plan = recovery_plan::plan_for_day(day).cloned();
    let milestone_label = milestone
        .map(str::to_string)
        .or_else(|| plan.as_ref().map(|p| p.title.to_string()));
    RecoveryContext {
        day,
        plan,
        prior: recovery_plan::prior_plans(day).into_iter().cloned().collect(),
        milestone_label,
    }
}
