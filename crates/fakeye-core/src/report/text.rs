//! Plain-text report generation for terminals

use crate::evidence::Evidence;
use crate::history::HistoryEntry;
use crate::CheckResult;

pub fn generate(result: &CheckResult) -> String {
    let verdict = &result.verdict;
    let mut lines = Vec::new();

    lines.push(format!("Claim: {}", result.query));
    match verdict.display_label.as_deref() {
        Some(display) if display != verdict.label.as_str() => {
            lines.push(format!("Verdict: {} ({})", verdict.label, display))
        }
        _ => lines.push(format!("Verdict: {}", verdict.label)),
    }
    lines.push(format!(
        "Confidence: {}% ({})",
        verdict.confidence,
        verdict.band()
    ));

    if !verdict.summary.is_empty() {
        lines.push(String::new());
        lines.push(verdict.summary.clone());
    }
    if !verdict.reason.is_empty() {
        lines.push(format!("Reason: {}", verdict.reason));
    }

    lines.push(String::new());
    if result.evidence.is_empty() {
        lines.push("No evidence found.".to_string());
    } else {
        lines.push(format!("Evidence ({}):", result.evidence.len()));
        for (i, item) in result.evidence.iter().enumerate() {
            lines.extend(evidence_lines(i + 1, item));
        }
    }

    lines.join("\n")
}

fn evidence_lines(position: usize, item: &Evidence) -> Vec<String> {
    let publisher = item.publisher.as_deref().unwrap_or("Unknown source");
    let mut lines = vec![format!("  {}. [{}] {}", position, item.stance, publisher)];

    if let Some(title) = &item.title {
        lines.push(format!("     {}", title));
    }
    if let Some(url) = &item.url {
        lines.push(format!("     {}", url));
    }
    if !item.snippet.is_empty() {
        lines.push(format!("     {}", item.snippet));
    }
    lines.push(format!(
        "     Conf: {}% \u{2022} Sim: {}%",
        item.stance_percent(),
        item.similarity_percent()
    ));

    lines
}

/// Numbered history list, newest first
pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history yet.".to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>3}  {}  {}",
                i,
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.query
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
