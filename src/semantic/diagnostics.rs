//! # Structured Diagnostics
//!
//! Shared diagnostic sink for the semantic analyses. Diagnostics are
//! accumulated, never thrown, so a single compilation reports as much as
//! possible.

use crate::lexer::Token;
use serde::Serialize;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A single reported problem with its source position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
    pub hints: Vec<String>,
}

/// Accumulator for diagnostics produced during analysis
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    file: String,
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticSink {
    /// Create a sink reporting against the given file name
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            diagnostics: Vec::new(),
            error_count: 0,
        }
    }

    /// Append an error diagnostic at the token's position
    pub fn report(&mut self, token: &Token, message: impl Into<String>, hints: &[&str]) {
        self.diagnostics.push(Diagnostic {
            file: self.file.clone(),
            line: token.line,
            column: token.column,
            severity: Severity::Error,
            message: message.into(),
            hints: hints.iter().map(|h| h.to_string()).collect(),
        });
        self.error_count += 1;
    }

    /// Number of errors reported so far
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Whether no errors have been reported
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }

    /// All diagnostics in emission order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the sink, yielding its diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
