use std::sync::Arc;

use async_trait::async_trait;

use super::ollama::LlmClient;
use super::prompt::{build_script_prompt, SCRIPT_SECTIONS, SCRIPT_SYSTEM_PROMPT};
use crate::generation::{ScriptSynthesizer, SynthesisError};
use crate::models::ClinicalContext;

/// Script synthesizer backed by a local language model.
pub struct LlmScriptSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl LlmScriptSynthesizer {
    pub fn new(client: Arc<dyn LlmClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ScriptSynthesizer for LlmScriptSynthesizer {
    async fn synthesize(&self, context: &ClinicalContext) -> Result<String, SynthesisError> {
        let prompt = build_script_prompt(context);
        let raw = self
            .client
            .generate(&self.model, &prompt, SCRIPT_SYSTEM_PROMPT, true)
            .await?;

        let narration = narration_from_response(&raw);
        if narration.is_empty() {
            tracing::warn!(model = %self.model, "Script model returned no usable narration");
            return Err(SynthesisError::EmptyScript);
        }
        tracing::debug!(model = %self.model, chars = narration.len(), "Narration synthesized");
        Ok(narration)
    }
}

/// Join the JSON sections into narration, in order.
///
/// Answers that are not a JSON object are used verbatim. A JSON object
/// without any known section falls back to its `content`/`script` field.
pub fn narration_from_response(raw: &str) -> String {
    let trimmed = raw.trim();
    let value = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return trimmed.to_string(),
    };

    let sections: Vec<String> = SCRIPT_SECTIONS
        .iter()
        .filter_map(|key| value.get(*key))
        .filter_map(section_text)
        .collect();
    if !sections.is_empty() {
        return sections.join("\n\n");
    }

    ["content", "script"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(section_text)
        .unwrap_or_default()
}

fn section_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoctorRecord, PatientRecord};
    use crate::script::ollama::MockLlmClient;

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
                specialty: None,
            },
            diagnosis_code: "I10".into(),
            procedure_code: "99213".into(),
            diagnoses: vec![],
            medications: vec![],
            notes: None,
            recovery: None,
        }
    }

    #[test]
    fn sections_joined_in_order() {
        let raw = r#"{"reminders":"Check your pressure daily.","intro":"Hi Alex.","overview":"High blood pressure is common.","treatment":"Take lisinopril."}"#;
        assert_eq!(
            narration_from_response(raw),
            "Hi Alex.\n\nHigh blood pressure is common.\n\nTake lisinopril.\n\nCheck your pressure daily."
        );
    }

    #[test]
    fn missing_sections_skipped() {
        let raw = r#"{"intro":"Hi Alex.","overview":"","reminders":["Walk daily.","Sleep well."]}"#;
        assert_eq!(narration_from_response(raw), "Hi Alex.\n\nWalk daily. Sleep well.");
    }

    #[test]
    fn plain_text_used_verbatim() {
        assert_eq!(narration_from_response("  Hello Alex.  "), "Hello Alex.");
    }

    #[test]
    fn content_field_fallback() {
        assert_eq!(narration_from_response(r#"{"content":"Whole script"}"#), "Whole script");
        assert_eq!(narration_from_response(r#"{"unrelated":1}"#), "");
    }

    #[tokio::test]
    async fn synthesizer_sends_prompt_and_returns_narration() {
        let client = Arc::new(MockLlmClient::new(r#"{"intro":"Hi Alex.","overview":"You have hypertension."}"#));
        let synthesizer = LlmScriptSynthesizer::new(client.clone(), "medgemma:4b");
        let script = synthesizer.synthesize(&context()).await.unwrap();
        assert_eq!(script, "Hi Alex.\n\nYou have hypertension.");
        assert!(client.prompts()[0].contains("Patient: Alex Rivera"));
    }

    #[tokio::test]
    async fn empty_answer_is_error() {
        let synthesizer = LlmScriptSynthesizer::new(Arc::new(MockLlmClient::new("{}")), "m");
        let err = synthesizer.synthesize(&context()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyScript));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let synthesizer = LlmScriptSynthesizer::new(Arc::new(MockLlmClient::failing(500)), "m");
        let err = synthesizer.synthesize(&context()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Provider { status: 500, .. }));
    }
}
