//! Fakeye client core
//!
//! This crate turns raw verification-backend payloads into a canonical
//! verdict and evidence model, keeps a bounded history of past checks, and
//! drives the request lifecycle of a checking session.

pub mod backend;
pub mod evidence;
pub mod fields;
pub mod history;
pub mod report;
pub mod session;
pub mod verdict;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use backend::{CheckError, VerificationBackend};
pub use evidence::{Evidence, EvidenceNormalizer, SimilarityHeuristic, Stance, StanceDefaults};
pub use history::{HistoryEntry, HistorySnapshot, HistoryStore};
pub use session::{RequestTicket, Session, SessionHandle, SessionState, Settlement};
pub use verdict::{ConfidenceBand, Verdict, VerdictLabel, VerdictNormalizer};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Tunable heuristics used when the backend leaves a signal out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Confidence reported when no scoring field is present at all
    pub default_confidence: u8,
    /// Stance confidence used when an evidence item carries none
    pub stance_defaults: StanceDefaults,
    /// Snippet-length similarity placeholder
    pub similarity: SimilarityHeuristic,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            default_confidence: verdict::DEFAULT_CONFIDENCE,
            stance_defaults: StanceDefaults::default(),
            similarity: SimilarityHeuristic::default(),
        }
    }
}

impl NormalizeConfig {
    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.default_confidence > 100 {
            return Err(CoreError::Config(format!(
                "default_confidence must be within 0..=100, got {}",
                config.default_confidence
            )));
        }
        Ok(config)
    }
}

/// Display model for one settled check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub query: String,
    pub verdict: Verdict,
    pub evidence: Vec<Evidence>,
}

/// Runs both normalizers over a backend payload
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizeConfig,
    verdicts: VerdictNormalizer,
    evidence: EvidenceNormalizer,
}

impl Normalizer {
    /// Create a normalizer with the default heuristics
    pub fn new() -> Self {
        Self::with_config(NormalizeConfig::default())
    }

    /// Create a normalizer with custom heuristics
    pub fn with_config(config: NormalizeConfig) -> Self {
        let verdicts = VerdictNormalizer::new(config.default_confidence);
        let evidence = EvidenceNormalizer::new(config.stance_defaults, config.similarity);

        Self {
            config,
            verdicts,
            evidence,
        }
    }

    /// Normalize a raw payload into the display model
    pub fn normalize(&self, query: &str, raw: &Value) -> CheckResult {
        let verdict = self.verdicts.normalize(Some(raw));

        let matches = raw
            .get("top_matches")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let evidence = self
            .evidence
            .normalize(matches, verdict::context_label(raw));

        CheckResult {
            query: query.to_string(),
            verdict,
            evidence,
        }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
