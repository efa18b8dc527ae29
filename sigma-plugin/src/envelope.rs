//! Parsed input and the result envelope handed back to callers

use crate::steps::Step;
use serde::{Deserialize, Serialize};
use sigma_core::SigmaError;
use sigma_expr::Expr;
use sigma_matrix::Matrix;

/// Outcome of query parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedExpression {
    Expression(Expr),
    Matrix(Matrix),
    /// Text no strategy could parse (equations included)
    Raw(String),
}

impl ParsedExpression {
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedExpression::Expression(_) => "expression",
            ParsedExpression::Matrix(_) => "matrix",
            ParsedExpression::Raw(_) => "raw",
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            ParsedExpression::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            ParsedExpression::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ParsedExpression::Raw(_))
    }
}

/// Everything a solve returns: result, trace, diagnostics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    pub result_latex: Option<String>,
    pub steps: Vec<Step>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub elapsed_ms: Option<f64>,
}

impl ResultEnvelope {
    pub fn success(result_latex: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            ok: true,
            result_latex: Some(result_latex.into()),
            steps,
            ..Default::default()
        }
    }

    /// Failed solve keeping the steps recorded before the failure
    pub fn failure(error: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            ok: false,
            steps,
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    pub fn from_error(err: &SigmaError) -> Self {
        Self::failure(err.message.clone(), Vec::new())
    }

    pub fn unsupported_mode(mode: &str) -> Self {
        Self::from_error(&SigmaError::unsupported_mode(mode))
    }

    /// Prepend parser warnings
    pub fn with_warnings(mut self, mut warnings: Vec<String>) -> Self {
        warnings.append(&mut self.warnings);
        self.warnings = warnings;
        self
    }

    pub fn with_elapsed_ms(mut self, ms: f64) -> Self {
        self.elapsed_ms = Some(ms);
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_has_error() {
        let env = ResultEnvelope::unsupported_mode("recurrence");
        assert!(!env.ok);
        assert_eq!(env.errors, vec!["Unsupported mode: recurrence".to_string()]);
        assert!(env.steps.is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let env = ResultEnvelope::success("5 x", Vec::new())
            .with_warnings(vec!["LaTeX parse warning: x".into()])
            .with_elapsed_ms(1.5);
        let json = env.to_json();
        assert_eq!(json["ok"], serde_json::json!(true));
        assert_eq!(json["result_latex"], serde_json::json!("5 x"));
        assert_eq!(json["warnings"][0], serde_json::json!("LaTeX parse warning: x"));
        assert_eq!(json["elapsed_ms"], serde_json::json!(1.5));
        assert!(json["steps"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parsed_kind() {
        assert_eq!(ParsedExpression::Raw("x = 1".into()).kind(), "raw");
        assert!(ParsedExpression::Expression(Expr::int(1)).as_expr().is_some());
    }
}
