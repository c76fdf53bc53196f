//! Verdict normalization across backend schema generations
//!
//! Each output field is resolved by its own ordered chain of field checks.
//! The payload's generation is never inferred as a whole, so hybrid payloads
//! resolve field by field.

use super::{Verdict, VerdictLabel};
use crate::fields::{clamp_percent, first_number, first_str};
use serde_json::Value;

/// Confidence reported when no scoring field is present
pub const DEFAULT_CONFIDENCE: u8 = 30;

const RAW_LABEL: &str = "verdict_raw_label";
const MACHINE_LABEL: &str = "verdict_machine_label";
const LEGACY_VERDICT: &str = "verdict";
const DISPLAY_LABEL: &str = "verdict_label";
const PERCENT: &str = "verdict_percent";
const LEGACY_SCORE: &str = "verdict_score";
const RESULT_COUNT: &str = "result_count";
const CREDIBLE_HOST_COUNT: &str = "credible_host_count";
const SUMMARY_FIELDS: &[&str] = &["verdict_summary", "summary", "explanation"];
const REASON_FIELDS: &[&str] = &["verdict_reason", "reason"];

/// Verdict normalizer
#[derive(Debug, Clone)]
pub struct VerdictNormalizer {
    default_confidence: u8,
}

impl VerdictNormalizer {
    pub fn new(default_confidence: u8) -> Self {
        Self {
            default_confidence: default_confidence.min(100),
        }
    }

    /// Normalize a raw payload; never fails
    pub fn normalize(&self, raw: Option<&Value>) -> Verdict {
        let raw = match raw {
            None | Some(Value::Null) => return Verdict::absent(),
            Some(raw) => raw,
        };

        let label = resolve_label(raw);
        let confidence = self.resolve_confidence(raw);

        let summary = first_str(raw, SUMMARY_FIELDS)
            .unwrap_or_else(|| label.canned_summary())
            .to_string();
        let reason = first_str(raw, REASON_FIELDS).unwrap_or_default().to_string();
        let display_label = first_str(raw, &[DISPLAY_LABEL]).map(str::to_string);

        Verdict {
            label,
            confidence,
            summary,
            reason,
            display_label,
        }
    }

    fn resolve_confidence(&self, raw: &Value) -> u8 {
        if let Some(percent) = first_number(raw, &[PERCENT]) {
            return clamp_percent(percent);
        }

        if let Some(score) = raw.get(LEGACY_SCORE) {
            let result_count = first_number(score, &[RESULT_COUNT]);
            let credible = first_number(score, &[CREDIBLE_HOST_COUNT]);
            if result_count.is_some() || credible.is_some() {
                let ratio = credible.unwrap_or(0.0) / result_count.unwrap_or(0.0).max(1.0);
                return clamp_percent(ratio * 100.0);
            }
        }

        self.default_confidence
    }
}

impl Default for VerdictNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE)
    }
}

/// Normalize with the default heuristics
pub fn normalize_verdict(raw: Option<&Value>) -> Verdict {
    VerdictNormalizer::default().normalize(raw)
}

fn resolve_label(raw: &Value) -> VerdictLabel {
    resolve_label_with_source(raw).0
}

/// Resolve the label together with the field text that decided it
fn resolve_label_with_source(raw: &Value) -> (VerdictLabel, Option<&str>) {
    let raw_label = first_str(raw, &[RAW_LABEL]);

    match raw_label {
        Some("True") => return (VerdictLabel::True, raw_label),
        Some("False") => return (VerdictLabel::False, raw_label),
        _ => {}
    }

    let machine_label = first_str(raw, &[MACHINE_LABEL]);
    if let Some(machine) = machine_label {
        let lowered = machine.to_lowercase();
        if lowered.contains("true") {
            return (VerdictLabel::True, machine_label);
        }
        if lowered.contains("false") {
            return (VerdictLabel::False, machine_label);
        }
    }

    if matches!(raw_label, Some("Mixture" | "Unverifiable")) {
        return (VerdictLabel::Unverifiable, raw_label);
    }

    let legacy = first_str(raw, &[LEGACY_VERDICT]);
    match legacy {
        Some("likely_real") => (VerdictLabel::True, legacy),
        Some("suspicious") => (VerdictLabel::False, legacy),
        _ => (
            VerdictLabel::Unverifiable,
            raw_label.or(machine_label).or(legacy),
        ),
    }
}

/// Payload-wide label used to infer stance for evidence that carries none.
///
/// This is the text of whichever field decided the verdict label, so the
/// inferred stance agrees with the verdict on hybrid payloads.
pub fn context_label(raw: &Value) -> Option<&str> {
    resolve_label_with_source(raw).1
}
