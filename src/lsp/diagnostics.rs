//! Diagnostics generation from parsed lint records

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

use crate::parser::types::LintRecord;

/// Source label attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "analysis-tool";

/// The tool reports lines only, so every diagnostic anchors to this column
const ANCHOR_CHARACTER: u32 = 1;

/// Converts lint records into LSP diagnostics, preserving order
pub fn generate_diagnostics(records: &[LintRecord]) -> Vec<Diagnostic> {
    records.iter().map(create_diagnostic).collect()
}

fn create_diagnostic(record: &LintRecord) -> Diagnostic {
    let anchor = Position {
        line: record.line,
        character: ANCHOR_CHARACTER,
    };

    Diagnostic {
        range: Range {
            start: anchor,
            end: anchor,
        },
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: record.message.clone(),
        ..Default::default()
    }
}
