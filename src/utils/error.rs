//! Error handling for Kestrel
//!
//! Errors come in two tiers. Parse failures accumulate into [`ParseErrors`],
//! and fatal evaluation failures surface as [`RuntimeError`]. Recoverable
//! evaluation failures are not errors at all: they travel through the
//! program as `Value::Error`.

use crate::utils::Span;
use thiserror::Error;

/// Result type alias for the fatal evaluation tier
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Parser error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Unexpected token {got} at start of statement")]
    ExpectedStatement { got: String, span: Span },

    #[error("No prefix parse function for {got}")]
    ExpectedExpr { got: String, span: Span },

    #[error("Could not parse {literal} as type integer")]
    InvalidInteger { literal: String, span: Span },

    #[error("Could not parse {literal} as type float")]
    InvalidFloat { literal: String, span: Span },

    #[error("Expected a function call after '.'")]
    ExpectedCall { span: Span },

    #[error("Unterminated {construct}: reached end of input")]
    Unterminated { construct: &'static str, span: Span },
}

impl ParseError {
    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::ExpectedStatement { span, .. } => *span,
            Self::ExpectedExpr { span, .. } => *span,
            Self::InvalidInteger { span, .. } => *span,
            Self::InvalidFloat { span, .. } => *span,
            Self::ExpectedCall { span } => *span,
            Self::Unterminated { span, .. } => *span,
        }
    }
}

/// Every parse error found in a program, in source order
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", render_list(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn render_list(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.span(), e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fatal evaluation error. Ends the run of the whole program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Identifier {name} is not defined")]
    UndefinedIdentifier { name: String },

    #[error("Variable {name} has not been declared")]
    UndeclaredVariable { name: String },

    #[error("Condition must return a boolean, got {got}")]
    NonBooleanCondition { got: &'static str },

    #[error("Function {name} is not defined")]
    UndefinedFunction { name: String },

    #[error("{name} is a {got}, not a function")]
    NotCallable { name: String, got: &'static str },

    #[error("Expected {expected} arguments for function {name}, received {got}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Maximum call depth of {depth} exceeded calling {name}")]
    RecursionLimit { name: String, depth: usize },
}

/// Any failure that stops a script from running to completion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Parse(#[from] ParseErrors),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_render_with_positions() {
        let errors = ParseErrors(vec![
            ParseError::ExpectedCall { span: Span::new(3, 4, 1, 4) },
            ParseError::Unterminated { construct: "block", span: Span::new(9, 9, 2, 1) },
        ]);
        assert_eq!(
            errors.to_string(),
            "1:4: Expected a function call after '.'\n2:1: Unterminated block: reached end of input"
        );
    }

    #[test]
    fn test_runtime_error_messages() {
        let err = RuntimeError::ArgCountMismatch { name: "f".into(), expected: 2, got: 1 };
        assert_eq!(err.to_string(), "Expected 2 arguments for function f, received 1");
    }
}
