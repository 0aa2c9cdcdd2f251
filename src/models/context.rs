use serde::Serialize;

use crate::recovery_plan::RecoveryDayPlan;

/// A patient row from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// A doctor row from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

/// Lookup parameters for the context provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextQuery {
    pub doctor_id: String,
    pub patient_id: String,
    pub diagnosis_code: String,
    pub procedure_code: String,
    pub recovery_day: Option<u8>,
    pub recovery_milestone: Option<String>,
}

/// Recovery-day slice of the context.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryContext {
    pub day: u8,
    /// `None` when the day is between checkpoints.
    pub plan: Option<RecoveryDayPlan>,
    pub prior: Vec<RecoveryDayPlan>,
    /// Request milestone, else the plan title.
    pub milestone_label: Option<String>,
}

/// Everything the script synthesizer needs. Built per request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ClinicalContext {
    pub patient: PatientRecord,
    pub doctor: DoctorRecord,
    pub diagnosis_code: String,
    pub procedure_code: String,
    /// Display names from the latest clinical snapshot.
    pub diagnoses: Vec<String>,
    pub medications: Vec<String>,
    /// Extracted text of the most recent patient files.
    pub notes: Option<String>,
    pub recovery: Option<RecoveryContext>,
}
