use crate::models::ClinicalContext;

pub const SCRIPT_SYSTEM_PROMPT: &str = r#"
You are a medical video script writer. You write narration for a short
explainer video a doctor sends to their patient after a visit.

RULES:
1. Use plain, compassionate, patient-friendly language.
2. Only mention diagnoses, medications and instructions present in the input.
3. Never change doses or add new treatment advice.
4. Address the patient by first name.
5. Output MUST be a single valid JSON object.
"#;

/// Sections the model is asked to return, in narration order.
pub const SCRIPT_SECTIONS: &[&str] = &["intro", "overview", "treatment", "reminders"];

const NO_NOTES: &str = "No supplemental notes provided.";

/// Build the narration prompt for one patient context.
pub fn build_script_prompt(context: &ClinicalContext) -> String {
    let diagnoses = if context.diagnoses.is_empty() {
        "Not specified".to_string()
    } else {
        context.diagnoses.join(", ")
    };
    let medications = if context.medications.is_empty() {
        "No active medications listed".to_string()
    } else {
        context.medications.join(", ")
    };
    let notes = context.notes.as_deref().unwrap_or(NO_NOTES);

    let mut prompt = format!(
        r#"You are creating a compassionate clinical explainer video.
Patient: {first} {last}
Doctor: Dr. {doctor}
Diagnosis code: {diagnosis_code}
Procedure code: {procedure_code}
Diagnoses: {diagnoses}
Medications: {medications}
Additional Notes:
{notes}
Generate a concise script with:
1. Friendly greeting
2. Plain-language condition overview
3. Treatment plan and expectations
4. Key reminders and next steps
Return JSON with keys {keys}."#,
        first = context.patient.first_name,
        last = context.patient.last_name,
        doctor = context.doctor.last_name,
        diagnosis_code = context.diagnosis_code,
        procedure_code = context.procedure_code,
        keys = SCRIPT_SECTIONS.join(", "),
    );

    if let Some(recovery) = &context.recovery {
        if let Some(plan) = &recovery.plan {
            let label = recovery.milestone_label.as_deref().unwrap_or(plan.title);
            prompt.push_str(&format!(
                "\n\nToday's recovery milestone (Day {day}): {title}.\n\
                 Focus: {focus}\n\
                 Checklist items: {checklist}\n\
                 Milestone label: {label}\n\
                 Ensure the script references today's objectives explicitly.",
                day = plan.day,
                title = plan.title,
                focus = plan.focus,
                checklist = plan.checklist.join(", "),
            ));
        } else {
            prompt.push_str(&format!(
                "\n\nThe patient is on day {} of recovery.",
                recovery.day
            ));
            if let Some(label) = &recovery.milestone_label {
                prompt.push_str(&format!(" Milestone label: {label}."));
            }
        }

        if !recovery.prior.is_empty() {
            let summaries: Vec<String> = recovery
                .prior
                .iter()
                .map(|p| format!("Day {}: {}", p.day, p.title))
                .collect();
            prompt.push_str(&format!(
                "\n\nPrevious recovery context that must be referenced for continuity:\n\
                 {}\n\
                 Acknowledge prior progress and set expectations for the next check-in.",
                summaries.join("; ")
            ));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoctorRecord, PatientRecord, RecoveryContext};
    use crate::recovery_plan::{plan_for_day, prior_plans};

    fn context() -> ClinicalContext {
        ClinicalContext {
            patient: PatientRecord {
                email: "alex@example.com".into(),
                first_name: "Alex".into(),
                last_name: "Rivera".into(),
            },
            doctor: DoctorRecord {
                email: "dr.grey@clinic.org".into(),
                first_name: "Meredith".into(),
                last_name: "Grey".into(),
                specialty: Some("Cardiology".into()),
            },
            diagnosis_code: "I10".into(),
            procedure_code: "99213".into(),
            diagnoses: vec!["Essential hypertension".into()],
            medications: vec!["Lisinopril 10mg once daily".into()],
            notes: None,
            recovery: None,
        }
    }

    #[test]
    fn prompt_names_patient_and_doctor() {
        let prompt = build_script_prompt(&context());
        assert!(prompt.contains("Patient: Alex Rivera"));
        assert!(prompt.contains("Doctor: Dr. Grey"));
        assert!(prompt.contains("Essential hypertension"));
        assert!(prompt.contains("intro, overview, treatment, reminders"));
        assert!(prompt.contains(NO_NOTES));
    }

    #[test]
    fn empty_lists_use_placeholders() {
        let mut ctx = context();
        ctx.diagnoses.clear();
        ctx.medications.clear();
        let prompt = build_script_prompt(&ctx);
        assert!(prompt.contains("Diagnoses: Not specified"));
        assert!(prompt.contains("No active medications listed"));
    }

    #[test]
    fn recovery_day_adds_objectives_and_continuity() {
        let mut ctx = context();
        ctx.recovery = Some(RecoveryContext {
            day: 7,
            plan: plan_for_day(7).cloned(),
            prior: prior_plans(7).into_iter().cloned().collect(),
            milestone_label: Some("first-walk".into()),
        });
        let prompt = build_script_prompt(&ctx);
        assert!(prompt.contains("(Day 7)"));
        assert!(prompt.contains("Milestone label: first-walk"));
        assert!(prompt.contains("Day 1:"));
        assert!(prompt.contains("Day 3:"));
        assert!(!prompt.contains("Day 7:"));
    }

    #[test]
    fn day_between_checkpoints_still_mentioned() {
        let mut ctx = context();
        ctx.recovery = Some(RecoveryContext {
            day: 2,
            plan: None,
            prior: prior_plans(2).into_iter().cloned().collect(),
            milestone_label: None,
        });
        let prompt = build_script_prompt(&ctx);
        assert!(prompt.contains("day 2 of recovery"));
        assert!(prompt.contains("Day 1:"));
    }

    #[test]
    fn system_prompt_requires_json() {
        assert!(SCRIPT_SYSTEM_PROMPT.contains("valid JSON"));
        assert!(SCRIPT_SYSTEM_PROMPT.contains("Never change doses"));
    }
}
