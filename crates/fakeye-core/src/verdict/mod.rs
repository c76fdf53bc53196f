//! Canonical verdict model

pub mod normalizer;

pub use normalizer::{context_label, normalize_verdict, VerdictNormalizer, DEFAULT_CONFIDENCE};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized claim outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictLabel {
    True,
    False,
    Unverifiable,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::True => "True",
            VerdictLabel::False => "False",
            VerdictLabel::Unverifiable => "Unverifiable",
        }
    }

    /// Sentence shown when the backend gives no summary of its own
    pub fn canned_summary(&self) -> &'static str {
        match self {
            VerdictLabel::True => "Multiple credible sources report similar information.",
            VerdictLabel::False => {
                "No matching credible sources found; the claim appears dubious."
            }
            VerdictLabel::Unverifiable => {
                "Some matches found but context is uncertain; inspect the links."
            }
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    /// Always within `0..=100`
    pub confidence: u8,
    pub summary: String,
    /// Rationale tied to the strongest piece of evidence, empty when absent
    pub reason: String,
    /// Backend-provided human label such as "Likely True"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
}

impl Verdict {
    /// Verdict for a missing payload
    pub fn absent() -> Self {
        Self {
            label: VerdictLabel::Unverifiable,
            confidence: 0,
            summary: String::new(),
            reason: String::new(),
            display_label: None,
        }
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }
}

/// Coarse reading of a confidence percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceBand {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: u8) -> Self {
        match confidence {
            80..=u8::MAX => ConfidenceBand::High,
            60..=79 => ConfidenceBand::Moderate,
            40..=59 => ConfidenceBand::Low,
            _ => ConfidenceBand::VeryLow,
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceBand::High => write!(f, "High"),
            ConfidenceBand::Moderate => write!(f, "Moderate"),
            ConfidenceBand::Low => write!(f, "Low"),
            ConfidenceBand::VeryLow => write!(f, "Very Low"),
        }
    }
}
