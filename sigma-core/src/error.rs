//! Structured errors
//!
//! Errors are values. Engine operations return them, solver dispatchers turn
//! them into the human-readable strings carried by a result envelope.

use crate::NumberError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const PARSE_WARNING: &str = "PARSE_WARNING";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const COMPUTATION_ERROR: &str = "COMPUTATION_ERROR";
    pub const UNSUPPORTED_MODE: &str = "UNSUPPORTED_MODE";
    pub const UNSUPPORTED: &str = "UNSUPPORTED";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const RENDER_ERROR: &str = "RENDER_ERROR";
    pub const OVERFLOW: &str = "OVERFLOW";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input was reinterpreted, processing continued
    Warning,
    /// The request failed
    Error,
    /// Defect in the pipeline itself
    Fatal,
}

/// Context about where an error occurred
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Expression being processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Byte offset in the query text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    /// Propagation notes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmaError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Where the error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    pub severity: Severity,
}

impl SigmaError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            context: None,
            severity: Severity::Error,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.expression = Some(expression.into());
        self
    }

    pub fn at_position(mut self, position: usize) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.position = Some(position);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, details)
            .with_suggestion("Check the expression syntax")
    }

    pub fn parse_warning(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_WARNING, details).with_severity(Severity::Warning)
    }

    pub fn validation(details: impl Into<String>) -> Self {
        Self::new(codes::VALIDATION_ERROR, details)
    }

    pub fn computation(details: impl Into<String>) -> Self {
        Self::new(codes::COMPUTATION_ERROR, details)
    }

    pub fn unsupported_mode(mode: &str) -> Self {
        Self::new(codes::UNSUPPORTED_MODE, format!("Unsupported mode: {}", mode))
            .with_suggestion("Use list_solvers to see the modes of each subject")
    }

    pub fn unsupported(details: impl Into<String>) -> Self {
        Self::new(codes::UNSUPPORTED, details)
    }

    pub fn div_zero() -> Self {
        Self::new(codes::DIV_ZERO, "Division by zero")
    }

    pub fn domain_error(details: impl Into<String>) -> Self {
        Self::new(codes::DOMAIN_ERROR, format!("Domain error: {}", details.into()))
    }

    pub fn render_error(details: impl Into<String>) -> Self {
        Self::new(codes::RENDER_ERROR, format!("Render error: {}", details.into()))
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_severity(Severity::Fatal)
    }
}

impl std::fmt::Display for SigmaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for SigmaError {}

impl From<NumberError> for SigmaError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::ParseError(s) => Self::parse_error(format!("invalid number '{}'", s)),
            NumberError::DivisionByZero => Self::div_zero(),
            NumberError::DomainError(s) => Self::domain_error(s),
            NumberError::Overflow => Self::new(codes::OVERFLOW, "Numeric overflow"),
        }
    }
}
