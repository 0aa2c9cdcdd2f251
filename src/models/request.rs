use serde::{Deserialize, Serialize};

use super::render::{AspectRatio, RenderParams};

/// Valid range for `recovery_day`.
pub const RECOVERY_DAY_MIN: i32 = 1;
pub const RECOVERY_DAY_MAX: i32 = 30;

/// A malformed generation request field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Inbound request for a patient explainer video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Doctor email address.
    pub doctor_id: String,
    /// Patient email address.
    pub patient_id: String,
    /// ICD-10 or SNOMED code of the condition.
    pub diagnosis_code: String,
    /// Procedure code tied to the visit.
    pub procedure_code: String,
    /// Day (1-30) of the recovery plan schedule.
    #[serde(default)]
    pub recovery_day: Option<i32>,
    /// Milestone identifier for recovery plan clips.
    #[serde(default)]
    pub recovery_milestone: Option<String>,
    /// Skip cache reuse and force a fresh generation.
    #[serde(default)]
    pub force_regenerate: bool,
    #[serde(default)]
    pub overrides: RenderOverrides,
}

impl GenerationRequest {
    pub fn new(
        doctor_id: &str,
        patient_id: &str,
        diagnosis_code: &str,
        procedure_code: &str,
    ) -> Self {
        Self {
            doctor_id: doctor_id.to_string(),
            patient_id: patient_id.to_string(),
            diagnosis_code: diagnosis_code.to_string(),
            procedure_code: procedure_code.to_string(),
            recovery_day: None,
            recovery_milestone: None,
            force_regenerate: false,
            overrides: RenderOverrides::default(),
        }
    }

    /// Validate every field and return the normalized request.
    ///
    /// Identifiers are emails: trimmed and lower-cased. Codes are trimmed.
    /// A blank milestone is treated as absent.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let doctor_id = normalize_email("doctor_id", &self.doctor_id)?;
        let patient_id = normalize_email("patient_id", &self.patient_id)?;
        let diagnosis_code = require_text("diagnosis_code", &self.diagnosis_code)?;
        let procedure_code = require_text("procedure_code", &self.procedure_code)?;

        if let Some(day) = self.recovery_day {
            if !(RECOVERY_DAY_MIN..=RECOVERY_DAY_MAX).contains(&day) {
                return Err(ValidationError(format!(
                    "recovery_day must be between {RECOVERY_DAY_MIN} and {RECOVERY_DAY_MAX}, got {day}"
                )));
            }
        }

        let recovery_milestone = self
            .recovery_milestone
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        Ok(Self {
            doctor_id,
            patient_id,
            diagnosis_code,
            procedure_code,
            recovery_day: self.recovery_day,
            recovery_milestone,
            force_regenerate: self.force_regenerate,
            overrides: self.overrides.normalized()?,
        })
    }

    /// Recovery day as the narrow type used by the recovery plan catalog.
    /// Only meaningful after `normalized()` succeeded.
    pub fn recovery_day_u8(&self) -> Option<u8> {
        self.recovery_day.and_then(|d| u8::try_from(d).ok())
    }
}

fn normalize_email(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn require_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

// ═══════════════════════════════════════════════════════════
// Render overrides
// ═══════════════════════════════════════════════════════════

/// Per-request render settings. Absent fields fall back to the
/// configured defaults; unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderOverrides {
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub ratio: Option<AspectRatio>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub captions: Option<bool>,
}

impl RenderOverrides {
    fn normalized(self) -> Result<Self, ValidationError> {
        let non_blank = |field: &str, value: Option<String>| match value {
            Some(v) if v.trim().is_empty() => {
                Err(ValidationError(format!("overrides.{field} must not be empty")))
            }
            Some(v) => Ok(Some(v.trim().to_string())),
            None => Ok(None),
        };
        Ok(Self {
            avatar_id: non_blank("avatar_id", self.avatar_id)?,
            voice_id: non_blank("voice_id", self.voice_id)?,
            ratio: self.ratio,
            background: self
                .background
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            captions: self.captions,
        })
    }

    /// Resolve the effective render parameters against the defaults.
    pub fn resolve(&self, defaults: &RenderParams) -> RenderParams {
        RenderParams {
            avatar_id: self
                .avatar_id
                .clone()
                .unwrap_or_else(|| defaults.avatar_id.clone()),
            voice_id: self
                .voice_id
                .clone()
                .unwrap_or_else(|| defaults.voice_id.clone()),
            ratio: self.ratio.unwrap_or(defaults.ratio),
            background: self.background.clone().or_else(|| defaults.background.clone()),
            captions: self.captions.unwrap_or(defaults.captions),
        }
    }
}
