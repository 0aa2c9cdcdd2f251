//! Case key derivation.
//!
//! Maps the clinically relevant request attributes (diagnosis, procedure,
//! recovery milestone, doctor specialty) to a stable identifier. Pure: no
//! I/O, no randomness, no timestamps, so the same inputs give the same key
//! across processes and restarts.
//!
//! Each field is normalized (trimmed, case-folded, inner whitespace
//! collapsed) and encoded as either `-` (absent) or `+<len>:<text>`. The
//! length tag keeps an absent field distinct from any real text and stops
//! separators inside values from shifting field boundaries.

use sha2::{Digest, Sha256};

use crate::models::CaseKey;

/// Bumping this invalidates every previously stored key.
const KEY_VERSION: &str = "careclip/v1";

/// Derive the reuse key for a request.
pub fn derive(
    diagnosis_code: &str,
    procedure_code: &str,
    recovery_milestone: Option<&str>,
    doctor_specialty: Option<&str>,
) -> CaseKey {
    let mut encoded = String::from(KEY_VERSION);
    for field in [
        Some(diagnosis_code),
        Some(procedure_code),
        recovery_milestone,
        doctor_specialty,
    ] {
        encoded.push('|');
        encode_field(&mut encoded, field);
    }

    let digest = Sha256::digest(encoded.as_bytes());
    CaseKey::from_raw(format!("{digest:x}"))
}

fn encode_field(out: &mut String, value: Option<&str>) {
    match value.map(normalize).filter(|v| !v.is_empty()) {
        Some(text) => {
            out.push('+');
            out.push_str(&text.len().to_string());
            out.push(':');
            out.push_str(&text);
        }
        None => out.push('-'),
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
