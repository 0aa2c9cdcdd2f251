//! Demo clinic data: doctors with specialties, patients, EHR snapshots and
//! uploaded visit summaries.
//!
//! Seeding is idempotent. Existing users and documents are left alone;
//! snapshots are upserted, so a re-run refreshes them.

use rusqlite::Connection;
use serde_json::{json, Value};

use super::repository::{
    get_user, insert_document, insert_user, recent_document_texts, upsert_snapshot, UserRecord,
    UserType,
};
use super::DatabaseError;

/// What one seeding run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub doctors_added: usize,
    pub patients_added: usize,
    pub snapshots_upserted: usize,
    pub documents_added: usize,
}

struct DemoUser {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    specialty: Option<&'static str>,
}

const DOCTORS: &[DemoUser] = &[
    DemoUser {
        email: "demo.doctor@amma.health",
        first_name: "Dr. Sarah",
        last_name: "Chen",
        specialty: Some("Internal Medicine"),
    },
    DemoUser {
        email: "cardio.doctor@amma.health",
        first_name: "Dr. Michael",
        last_name: "Rodriguez",
        specialty: Some("Cardiology"),
    },
    DemoUser {
        email: "neuro.doctor@amma.health",
        first_name: "Dr. Priya",
        last_name: "Sharma",
        specialty: Some("Neurology"),
    },
    DemoUser {
        email: "ortho.doctor@amma.health",
        first_name: "Dr. James",
        last_name: "Thompson",
        specialty: Some("Orthopedics"),
    },
];

const PATIENTS: &[DemoUser] = &[
    DemoUser {
        email: "anish.polakala@gmail.com",
        first_name: "Anish",
        last_name: "Polakala",
        specialty: None,
    },
    DemoUser {
        email: "keisha.washington@email.com",
        first_name: "Keisha",
        last_name: "Washington",
        specialty: None,
    },
    DemoUser {
        email: "mei.zhang@email.com",
        first_name: "Mei Lin",
        last_name: "Zhang",
        specialty: None,
    },
    DemoUser {
        email: "jamal.thompson@email.com",
        first_name: "Jamal",
        last_name: "Thompson",
        specialty: None,
    },
    DemoUser {
        email: "david.williams@email.com",
        first_name: "David",
        last_name: "Williams",
        specialty: None,
    },
    DemoUser {
        email: "emily.rodriguez@email.com",
        first_name: "Emily",
        last_name: "Rodriguez",
        specialty: None,
    },
];

struct DemoSnapshot {
    doctor: &'static str,
    patient: &'static str,
    epic_patient_id: &'static str,
    notes: &'static str,
    /// (display, ICD-10 code)
    diagnoses: &'static [(&'static str, &'static str)],
    /// (name, dosage, frequency, route)
    medications: &'static [(&'static str, &'static str, &'static str, &'static str)],
}

const SNAPSHOTS: &[DemoSnapshot] = &[
    DemoSnapshot {
        doctor: "demo.doctor@amma.health",
        patient: "anish.polakala@gmail.com",
        epic_patient_id: "EPIC-001234",
        notes: "Routine follow-up of type 2 diabetes and hypertension. Glucose well \
                controlled on current regimen. Blood pressure stable at 128/82 mmHg. \
                Good adherence to diet and exercise. Recheck HbA1c in 3 months.",
        diagnoses: &[
            ("Type 2 Diabetes Mellitus without complications", "E11.9"),
            ("Essential (primary) hypertension", "I10"),
        ],
        medications: &[
            ("Metformin", "500mg", "Twice daily with meals", "Oral"),
            ("Lisinopril", "10mg", "Once daily", "Oral"),
        ],
    },
    DemoSnapshot {
        doctor: "demo.doctor@amma.health",
        patient: "keisha.washington@email.com",
        epic_patient_id: "EPIC-005678",
        notes: "Follow-up for persistent asthma. Improved symptom control with current \
                inhaler regimen. No recent exacerbations. Educated on inhaler technique \
                and trigger avoidance.",
        diagnoses: &[("Mild persistent asthma, uncomplicated", "J45.30")],
        medications: &[
            ("Albuterol HFA", "90mcg", "2 puffs as needed for shortness of breath", "Inhalation"),
            ("Fluticasone propionate", "110mcg", "2 puffs twice daily", "Inhalation"),
        ],
    },
    DemoSnapshot {
        doctor: "demo.doctor@amma.health",
        patient: "mei.zhang@email.com",
        epic_patient_id: "EPIC-009876",
        notes: "Management of generalized anxiety disorder and insomnia. Significant \
                improvement in anxiety and sleep quality. No side effects reported. \
                Discussed stress management and sleep hygiene.",
        diagnoses: &[
            ("Generalized anxiety disorder", "F41.1"),
            ("Insomnia, unspecified", "G47.00"),
        ],
        medications: &[
            ("Sertraline", "50mg", "Once daily in the morning", "Oral"),
            ("Trazodone", "50mg", "Once daily at bedtime as needed for sleep", "Oral"),
        ],
    },
    DemoSnapshot {
        doctor: "ortho.doctor@amma.health",
        patient: "jamal.thompson@email.com",
        epic_patient_id: "EPIC-004321",
        notes: "Follow-up for osteoarthritis of the right knee. Pain down from 7/10 to \
                4/10 with physical therapy. Range of motion improved. Consider \
                intra-articular injection if symptoms persist.",
        diagnoses: &[("Osteoarthritis of right knee", "M17.11")],
        medications: &[
            ("Ibuprofen", "400mg", "Three times daily with food", "Oral"),
            ("Acetaminophen", "500mg", "As needed for pain, maximum 4 times daily", "Oral"),
        ],
    },
    DemoSnapshot {
        doctor: "cardio.doctor@amma.health",
        patient: "david.williams@email.com",
        epic_patient_id: "EPIC-007654",
        notes: "Cardiology follow-up for coronary artery disease and hyperlipidemia. \
                Stable on current medications. Preserved left ventricular function. \
                LDL at target. Counseled on adherence and lifestyle changes.",
        diagnoses: &[
            ("Coronary artery disease, native coronary artery", "I25.10"),
            ("Hyperlipidemia, unspecified", "E78.5"),
        ],
        medications: &[
            ("Atorvastatin", "40mg", "Once daily at bedtime", "Oral"),
            ("Aspirin", "81mg", "Once daily", "Oral"),
            ("Metoprolol", "25mg", "Twice daily", "Oral"),
        ],
    },
    DemoSnapshot {
        doctor: "neuro.doctor@amma.health",
        patient: "emily.rodriguez@email.com",
        epic_patient_id: "EPIC-003456",
        notes: "Follow-up for migraine. Frequency down from 8-10 to 3-4 per month on \
                preventive therapy. Acute attacks controlled. Discussed trigger \
                identification.",
        diagnoses: &[("Migraine without aura, not intractable", "G43.909")],
        medications: &[
            ("Propranolol", "60mg", "Twice daily", "Oral"),
            ("Sumatriptan", "50mg", "As needed at onset of migraine, maximum 2 per day", "Oral"),
        ],
    },
];

/// (doctor, patient, file name, extracted text)
const DOCUMENTS: &[(&str, &str, &str, &str)] = &[
    (
        "cardio.doctor@amma.health",
        "david.williams@email.com",
        "stress-test-summary.pdf",
        "Exercise stress test: no inducible ischemia. Target heart rate reached.",
    ),
    (
        "ortho.doctor@amma.health",
        "jamal.thompson@email.com",
        "knee-xray-report.pdf",
        "Right knee X-ray: moderate medial joint space narrowing, small osteophytes.",
    ),
];

fn diagnoses_json(snapshot: &DemoSnapshot) -> Value {
    Value::Array(
        snapshot
            .diagnoses
            .iter()
            .map(|(display, code)| {
                json!({ "display": display, "code": code, "clinicalStatus": "active" })
            })
            .collect(),
    )
}

fn medications_json(snapshot: &DemoSnapshot) -> Value {
    Value::Array(
        snapshot
            .medications
            .iter()
            .map(|(name, dosage, frequency, route)| {
                json!({
                    "name": name,
                    "status": "active",
                    "dosage": dosage,
                    "frequency": frequency,
                    "route": route,
                })
            })
            .collect(),
    )
}

fn add_users(
    conn: &Connection,
    users: &[DemoUser],
    user_type: UserType,
) -> Result<usize, DatabaseError> {
    let mut added = 0;
    for user in users {
        if get_user(conn, user.email, user_type)?.is_some() {
            continue;
        }
        insert_user(
            conn,
            &UserRecord {
                email: user.email.into(),
                first_name: user.first_name.into(),
                last_name: user.last_name.into(),
                user_type,
                specialty: user.specialty.map(str::to_string),
            },
        )?;
        added += 1;
    }
    Ok(added)
}

/// Load the demo clinic into `conn`.
pub fn seed_demo_data(conn: &Connection) -> Result<SeedSummary, DatabaseError> {
    let mut summary = SeedSummary {
        doctors_added: add_users(conn, DOCTORS, UserType::Doctor)?,
        patients_added: add_users(conn, PATIENTS, UserType::Patient)?,
        ..SeedSummary::default()
    };

    for snapshot in SNAPSHOTS {
        upsert_snapshot(
            conn,
            snapshot.doctor,
            snapshot.patient,
            snapshot.epic_patient_id,
            Some(snapshot.notes),
            &diagnoses_json(snapshot),
            &medications_json(snapshot),
        )?;
        summary.snapshots_upserted += 1;
    }

    for (doctor, patient, file_name, text) in DOCUMENTS {
        if !recent_document_texts(conn, patient, 1)?.is_empty() {
            continue;
        }
        insert_document(
            conn,
            doctor,
            patient,
            &format!("/storage/files/{file_name}"),
            file_name,
            Some(*text),
        )?;
        summary.documents_added += 1;
    }

    tracing::info!(
        doctors_added = summary.doctors_added,
        patients_added = summary.patients_added,
        snapshots = summary.snapshots_upserted,
        documents_added = summary.documents_added,
        "Demo data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SqliteContextProvider;
    use crate::db::repository::latest_snapshot_for_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::db::Database;
    use crate::generation::ContextProvider;
    use crate::models::ContextQuery;

    #[test]
    fn seeds_every_table() {
        let conn = open_memory_database().unwrap();
        let summary = seed_demo_data(&conn).unwrap();
        assert_eq!(summary.doctors_added, 4);
        assert_eq!(summary.patients_added, 6);
        assert_eq!(summary.snapshots_upserted, 6);
        assert_eq!(summary.documents_added, 2);

        let cardio = get_user(&conn, "cardio.doctor@amma.health", UserType::Doctor)
            .unwrap()
            .unwrap();
        assert_eq!(cardio.specialty.as_deref(), Some("Cardiology"));

        let snapshot = latest_snapshot_for_patient(&conn, "anish.polakala@gmail.com")
            .unwrap()
            .unwrap();
        assert!(snapshot.diagnoses.iter().any(|d| d.contains("(I10)")));
        assert!(snapshot.medications.iter().any(|m| m.starts_with("Lisinopril 10mg")));
    }

    #[test]
    fn reseeding_adds_nothing() {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        let again = seed_demo_data(&conn).unwrap();
        assert_eq!(again.doctors_added, 0);
        assert_eq!(again.patients_added, 0);
        assert_eq!(again.documents_added, 0);
        assert_eq!(
            recent_document_texts(&conn, "david.williams@email.com", 10).unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn seeded_clinic_resolves_context() {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        let provider = SqliteContextProvider::new(Database::new(conn));

        let specialty = provider
            .doctor_specialty("Cardio.Doctor@amma.health")
            .await
            .unwrap();
        assert_eq!(specialty.as_deref(), Some("Cardiology"));

        let context = provider
            .fetch_context(&ContextQuery {
                doctor_id: "cardio.doctor@amma.health".into(),
                patient_id: "david.williams@email.com".into(),
                diagnosis_code: "I25.10".into(),
                procedure_code: "93015".into(),
                recovery_day: None,
                recovery_milestone: None,
            })
            .await
            .unwrap();
        assert_eq!(context.medications.len(), 3);
        assert!(context.notes.unwrap_or_default().contains("stress test"));
    }
}
