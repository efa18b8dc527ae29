//! Query parsing with cascading strategies
//!
//! The classified format picks the first strategy; the structure-preserving
//! infix parse and the permissive parse always follow. Every failed attempt
//! leaves exactly one warning, and when everything fails the trimmed text is
//! handed on as `Raw` so solvers that read text (equations, ODEs, counting
//! templates) still get their chance.

use crate::classify::{classify, Format};
use sigma_core::SigmaError;
use sigma_plugin::{Engine, ParsedExpression, Subject};

/// One way of turning text into a parsed expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MatrixLiteral,
    Latex,
    Infix,
    Permissive,
}

impl Strategy {
    /// Attempt order for a classified format
    pub fn cascade(format: Format) -> &'static [Strategy] {
        match format {
            Format::MatrixLiteral => &[Strategy::MatrixLiteral, Strategy::Infix, Strategy::Permissive],
            Format::Latex => &[Strategy::Latex, Strategy::Infix, Strategy::Permissive],
            Format::PlainInfix => &[Strategy::Infix, Strategy::Permissive],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Strategy::MatrixLiteral => "Matrix",
            Strategy::Latex => "LaTeX",
            Strategy::Infix => "Plain",
            Strategy::Permissive => "Permissive",
        }
    }

    fn attempt(&self, engine: &dyn Engine, text: &str) -> Result<ParsedExpression, SigmaError> {
        match self {
            Strategy::MatrixLiteral => engine.parse_matrix(text).map(ParsedExpression::Matrix),
            Strategy::Latex => engine.parse_latex(text),
            Strategy::Infix => engine.parse_infix(text).map(ParsedExpression::Expression),
            Strategy::Permissive => engine.parse_evaluating(text).map(ParsedExpression::Expression),
        }
    }
}

/// Parse a query. Never fails: the worst outcome is `Raw` plus warnings.
pub fn parse(engine: &dyn Engine, subject: Subject, raw: &str) -> (ParsedExpression, Vec<String>) {
    let text = raw.trim();
    let mut warnings = Vec::new();
    if text.is_empty() {
        warnings.push(SigmaError::parse_warning("empty query").message);
        return (ParsedExpression::Raw(String::new()), warnings);
    }

    for strategy in Strategy::cascade(classify(subject, text)) {
        match strategy.attempt(engine, text) {
            Ok(parsed) => {
                tracing::debug!(strategy = ?strategy, kind = parsed.kind(), "parsed query");
                return (parsed, warnings);
            }
            Err(err) => {
                let warning = SigmaError::parse_warning(format!("{} parse warning: {}", strategy.label(), err.message))
                    .with_expression(text);
                tracing::debug!(strategy = ?strategy, code = %warning.code, cause = %err.code, "parse attempt failed");
                warnings.push(warning.message);
            }
        }
    }
    (ParsedExpression::Raw(text.to_string()), warnings)
}
