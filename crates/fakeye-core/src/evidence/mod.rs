//! Canonical evidence model

pub mod normalizer;

pub use normalizer::{normalize_evidence, EvidenceNormalizer};

use crate::fields::{clamp_percent, clamp_unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship of one source to the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Support,
    Contradict,
    Neutral,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Support => "support",
            Stance::Contradict => "contradict",
            Stance::Neutral => "neutral",
        }
    }

    /// Parse an explicit backend value; anything unrecognized is neutral
    pub fn from_explicit(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "support" => Stance::Support,
            "contradict" => Stance::Contradict,
            _ => Stance::Neutral,
        }
    }

    /// Infer a stance from a payload-wide verdict label
    pub fn from_context(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Stance::Neutral;
        };
        let label = label.to_lowercase();

        if ["true", "real", "support"].iter().any(|k| label.contains(k)) {
            Stance::Support
        } else if ["false", "suspicious", "contradict"]
            .iter()
            .any(|k| label.contains(k))
        {
            Stance::Contradict
        } else {
            Stance::Neutral
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One matched source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub url: Option<String>,
    pub publisher: Option<String>,
    /// Headline of the match, when the backend sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub snippet: String,
    pub stance: Stance,
    /// Within `[0, 1]`
    pub stance_confidence: f64,
    /// Within `[0, 1]`
    pub semantic_similarity: f64,
}

impl Evidence {
    pub fn stance_percent(&self) -> u8 {
        clamp_percent(self.stance_confidence * 100.0)
    }

    pub fn similarity_percent(&self) -> u8 {
        clamp_percent(self.semantic_similarity * 100.0)
    }
}

/// Stance confidence assumed when an item carries none
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceDefaults {
    pub support: f64,
    pub contradict: f64,
    pub neutral: f64,
}

impl Default for StanceDefaults {
    fn default() -> Self {
        Self {
            support: 0.85,
            contradict: 0.78,
            neutral: 0.45,
        }
    }
}

impl StanceDefaults {
    pub fn for_stance(&self, stance: Stance) -> f64 {
        let value = match stance {
            Stance::Support => self.support,
            Stance::Contradict => self.contradict,
            Stance::Neutral => self.neutral,
        };
        clamp_unit(value)
    }
}

/// Placeholder similarity derived from snippet length.
///
/// This is not an embedding comparison. It only gives longer excerpts a
/// higher score so that evidence without a backend similarity still sorts and
/// renders sensibly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityHeuristic {
    /// Snippet length (in chars) that maps to a similarity of 1.0
    pub chars_per_unit: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for SimilarityHeuristic {
    fn default() -> Self {
        Self {
            chars_per_unit: 200.0,
            min: 0.12,
            max: 0.99,
        }
    }
}

impl SimilarityHeuristic {
    /// Monotonic in snippet length, bounded by `[min, max]`
    pub fn estimate(&self, snippet: &str) -> f64 {
        let lo = clamp_unit(self.min);
        let hi = clamp_unit(self.max).max(lo);

        let ratio = if self.chars_per_unit > 0.0 {
            snippet.chars().count() as f64 / self.chars_per_unit
        } else {
            hi
        };
        ratio.max(lo).min(hi)
    }
}
