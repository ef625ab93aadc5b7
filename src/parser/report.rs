//! Lint report parser
//!
//! The analysis tool prints one finding per line as `rule:line:message`,
//! followed by a terminating newline:
//!
//! ```text
//! ARG.001:3:Avoid leading wildcards in LIKE
//! CLA.001:7:SELECT without WHERE
//! ```
//!
//! Lines that do not fit this shape are skipped.

use tracing::debug;

use crate::parser::types::LintRecord;

/// Message text some tool builds print when a field is missing
const UNDEFINED_MESSAGE: &str = "undefined";

/// Parser for `rule:line:message` lint reports
pub struct LintReportParser;

impl LintReportParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a complete report, keeping the tool's emission order.
    pub fn parse(&self, report: &str) -> Vec<LintRecord> {
        let mut lines: Vec<&str> = report.split('\n').collect();
        // The last element is whatever follows the final newline
        lines.pop();

        lines
            .into_iter()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Parses a single report line, returning `None` for anything malformed.
    fn parse_line(&self, line: &str) -> Option<LintRecord> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return None;
        }

        let mut fields = line.split(':');
        let rule_id = fields.next()?;
        let line_field = fields.next();
        // Only the third field is kept; text after a further ':' is dropped
        let message = fields.next();

        let (Some(line_field), Some(message)) = (line_field, message) else {
            debug!("Skipping report line with too few fields: {:?}", line);
            return None;
        };

        let Some(line_number) = Self::parse_line_number(line_field) else {
            debug!("Skipping report line with invalid line number: {:?}", line);
            return None;
        };

        if message.is_empty() || message == UNDEFINED_MESSAGE {
            debug!("Skipping report line without message: {:?}", line);
            return None;
        }

        Some(LintRecord::new(rule_id, line_number, message))
    }

    /// Converts a 1-based line field to a 0-based line index
    fn parse_line_number(field: &str) -> Option<u32> {
        field.trim().parse::<u32>().ok()?.checked_sub(1)
    }
}

impl Default for LintReportParser {
    fn default() -> Self {
        Self::new()
    }
}
