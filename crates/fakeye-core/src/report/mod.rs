//! Report generation

pub mod json;
pub mod text;

use crate::history::HistoryEntry;
use crate::{CheckResult, CoreResult};

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Render a settled check in the specified format
pub fn generate_report(result: &CheckResult, format: ReportFormat) -> CoreResult<String> {
    match format {
        ReportFormat::Text => Ok(text::generate(result)),
        ReportFormat::Json => json::generate(result),
    }
}

/// Render the history list in the specified format
pub fn generate_history(entries: &[HistoryEntry], format: ReportFormat) -> CoreResult<String> {
    match format {
        ReportFormat::Text => Ok(text::history(entries)),
        ReportFormat::Json => json::history(entries),
    }
}
