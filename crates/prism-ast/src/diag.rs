//! Accumulated diagnostics. Positions always refer to the original source.

use crate::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Syntax,
    UnsupportedFeature,
    Type,
    UndefinedSymbol,
    Redefinition,
    VersionMismatch,
}

impl DiagnosticKind {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::UnsupportedFeature => "unsupported-feature",
            DiagnosticKind::Type => "type",
            DiagnosticKind::UndefinedSymbol => "undefined-symbol",
            DiagnosticKind::Redefinition => "redefinition",
            DiagnosticKind::VersionMismatch => "version-mismatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            line: span.line,
            column: span.column,
            kind,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            line: span.line,
            column: span.column,
            kind,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Strict mode escalates warnings to errors.
    pub fn escalated(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{}:{}: {sev} [{}]: {}",
            self.line,
            self.column,
            self.kind.label(),
            self.message
        )
    }
}
