//! JSON report generation

use crate::history::HistoryEntry;
use crate::{CheckResult, CoreResult};

pub fn generate(result: &CheckResult) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn history(entries: &[HistoryEntry]) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}
