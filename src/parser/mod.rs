//! Parser layer
//! - types.rs: Common types (LintRecord)
//! - report.rs: `rule:line:message` lint report parser

pub mod report;
pub mod types;

pub use report::LintReportParser;
pub use types::LintRecord;
