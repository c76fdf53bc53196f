//! Evidence normalization from heterogeneous match records

use super::{Evidence, SimilarityHeuristic, Stance, StanceDefaults};
use crate::fields::{clamp_unit, first_number, first_str};
use serde_json::Value;
use url::Url;

const URL_FIELDS: &[&str] = &["link", "url", "href"];
const PUBLISHER_FIELDS: &[&str] = &["publisher", "source"];
const TITLE_FIELDS: &[&str] = &["title"];
const SNIPPET_FIELDS: &[&str] = &["snippet", "description", "text"];
const STANCE_FIELDS: &[&str] = &["stance"];
const STANCE_CONFIDENCE_FIELDS: &[&str] = &["stance_conf", "stance_confidence"];
const SIMILARITY_FIELDS: &[&str] = &["semantic_sim", "semantic_similarity"];

/// Evidence normalizer
#[derive(Debug, Clone, Default)]
pub struct EvidenceNormalizer {
    stance_defaults: StanceDefaults,
    similarity: SimilarityHeuristic,
}

impl EvidenceNormalizer {
    pub fn new(stance_defaults: StanceDefaults, similarity: SimilarityHeuristic) -> Self {
        Self {
            stance_defaults,
            similarity,
        }
    }

    /// Normalize every match, keeping order and cardinality
    pub fn normalize(&self, raw_matches: &[Value], context_label: Option<&str>) -> Vec<Evidence> {
        raw_matches
            .iter()
            .map(|raw| self.normalize_one(raw, context_label))
            .collect()
    }

    /// Normalize a single match record
    pub fn normalize_one(&self, raw: &Value, context_label: Option<&str>) -> Evidence {
        let url = first_str(raw, URL_FIELDS).map(|s| s.trim().to_string());

        let publisher = first_str(raw, PUBLISHER_FIELDS)
            .map(str::to_string)
            .or_else(|| url.as_deref().map(publisher_from_url));

        let title = first_str(raw, TITLE_FIELDS).map(str::to_string);
        let snippet = first_str(raw, SNIPPET_FIELDS).unwrap_or_default().to_string();

        let stance = match first_str(raw, STANCE_FIELDS) {
            Some(explicit) => Stance::from_explicit(explicit),
            None => Stance::from_context(context_label),
        };

        let stance_confidence = first_number(raw, STANCE_CONFIDENCE_FIELDS)
            .map(clamp_unit)
            .unwrap_or_else(|| self.stance_defaults.for_stance(stance));

        let semantic_similarity = first_number(raw, SIMILARITY_FIELDS)
            .map(clamp_unit)
            .unwrap_or_else(|| self.similarity.estimate(&snippet));

        Evidence {
            url,
            publisher,
            title,
            snippet,
            stance,
            stance_confidence,
            semantic_similarity,
        }
    }
}

/// Normalize with the default heuristics
pub fn normalize_evidence(raw_matches: &[Value], context_label: Option<&str>) -> Vec<Evidence> {
    EvidenceNormalizer::default().normalize(raw_matches, context_label)
}

/// Display name for a source URL: its host without a leading `www.`, or the
/// URL itself when no host can be parsed out of it
pub fn publisher_from_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.strip_prefix("www.").unwrap_or(host).to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}
