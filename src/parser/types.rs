//! Common types produced by the report parser

/// One finding reported by the analysis tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRecord {
    /// Rule identifier as printed by the tool (e.g. "ARG.001")
    pub rule_id: String,
    /// Line number (0-indexed)
    pub line: u32,
    /// Message text, truncated at the first `:` after the line field
    pub message: String,
}

impl LintRecord {
    pub fn new(rule_id: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            line,
            message: message.into(),
        }
    }
}
