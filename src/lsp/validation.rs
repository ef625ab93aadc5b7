//! Document validation: runs the tool, parses its report and decides what
//! to publish.
//!
//! Every run takes a ticket from a process-wide counter. When a run
//! finishes, its result is kept only if its ticket is still the latest for
//! the document, so a slow earlier run can never overwrite a newer one.
//! Only tracked (open) documents are validated.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tower_lsp::lsp_types::{Diagnostic, Url};
use tracing::debug;

use crate::lsp::diagnostics::generate_diagnostics;
use crate::lsp::settings::Settings;
use crate::parser::LintReportParser;
use crate::tool::{ToolError, ToolRunner};

/// Result of a completed tool run for one document
#[derive(Debug)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Number of diagnostics dropped by `maxNumberOfProblems`
    pub truncated: usize,
    pub stderr: Option<String>,
    pub error: Option<ToolError>,
}

impl ValidationReport {
    /// Whether this report should reach the client
    pub fn should_publish(&self, settings: &Settings) -> bool {
        settings.always_publish || !self.diagnostics.is_empty()
    }

    /// Keeps at most `max` diagnostics, recording how many were dropped
    pub fn limit(&mut self, max: usize) {
        self.truncated = self.diagnostics.len().saturating_sub(max);
        self.diagnostics.truncate(max);
    }
}

#[derive(Debug)]
pub enum ValidationOutcome {
    Completed(ValidationReport),
    /// A newer validation started while this one ran
    Superseded,
    /// The document is not open, or closed while this one ran
    Closed,
    /// The URI does not name a local file
    Unsupported,
}

/// Resolves the on-disk path the tool should read for a document URI
pub fn resolve_path(uri: &Url) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        return None;
    }
    uri.to_file_path().ok()
}

pub struct Validator {
    runner: Arc<dyn ToolRunner>,
    parser: LintReportParser,
    next_ticket: AtomicU64,
    latest: Mutex<HashMap<Url, u64>>,
}

impl Validator {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            parser: LintReportParser::new(),
            next_ticket: AtomicU64::new(1),
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// Starts tracking an open document. Existing tickets are kept.
    pub async fn track(&self, uri: &Url) {
        self.latest.lock().await.entry(uri.clone()).or_insert(0);
    }

    pub async fn validate(&self, uri: &Url) -> ValidationOutcome {
        let Some(path) = resolve_path(uri) else {
            return ValidationOutcome::Unsupported;
        };

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        match self.latest.lock().await.get_mut(uri) {
            Some(latest) => *latest = ticket,
            None => return ValidationOutcome::Closed,
        }

        let output = self.runner.run(&path).await;

        match self.latest.lock().await.get(uri) {
            Some(&latest) if latest == ticket => {}
            Some(_) => {
                debug!("Discarding superseded validation #{} for {}", ticket, uri);
                return ValidationOutcome::Superseded;
            }
            None => {
                debug!("Discarding validation #{} for closed {}", ticket, uri);
                return ValidationOutcome::Closed;
            }
        }

        let stderr = output.stderr_text().map(str::to_string);

        let diagnostics = if output.stdout.is_empty() {
            Vec::new()
        } else {
            generate_diagnostics(&self.parser.parse(&output.stdout))
        };

        ValidationOutcome::Completed(ValidationReport {
            diagnostics,
            truncated: 0,
            stderr,
            error: output.error,
        })
    }

    /// Stops tracking a closed document; runs still in flight are discarded
    pub async fn forget(&self, uri: &Url) {
        self.latest.lock().await.remove(uri);
    }
}
