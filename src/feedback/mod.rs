//! Structured Feedback Module
//!
//! Machine-readable diagnostics for `--error-format json`.

use serde::Serialize;

use crate::utils::{Error, ParseError, ParseErrors, RuntimeError};

/// Which stage of running a script failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Io,
    Parse,
    Runtime,
}

/// One problem found in a script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    /// 1-based; absent for runtime errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn from_parse_error(error: &ParseError) -> Self {
        let span = error.span();
        Self {
            phase: Phase::Parse,
            message: error.to_string(),
            line: Some(span.line),
            column: Some(span.column),
        }
    }

    pub fn from_runtime_error(error: &RuntimeError) -> Self {
        Self {
            phase: Phase::Runtime,
            message: error.to_string(),
            line: None,
            column: None,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Io,
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

/// Everything reported for one source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub file: String,
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn success(file: &str) -> Self {
        Self {
            file: file.to_string(),
            success: true,
            diagnostics: vec![],
        }
    }

    pub fn from_diagnostics(file: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            file: file.to_string(),
            success: diagnostics.is_empty(),
            diagnostics,
        }
    }

    pub fn from_parse_errors(file: &str, errors: &ParseErrors) -> Self {
        Self::from_diagnostics(file, errors.iter().map(Diagnostic::from_parse_error).collect())
    }

    pub fn from_error(file: &str, error: &Error) -> Self {
        match error {
            Error::Parse(errors) => Self::from_parse_errors(file, errors),
            Error::Runtime(err) => Self::from_diagnostics(file, vec![Diagnostic::from_runtime_error(err)]),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
