//! Input format classification
//!
//! Decides which parse strategy is tried first. Purely lexical: one pass
//! over the text, no parsing.

use serde::Serialize;
use sigma_plugin::Subject;
use std::fmt;

/// Substrings that mark a query as LaTeX
pub const LATEX_MARKERS: [&str; 16] = [
    "\\frac",
    "\\int",
    "\\sum",
    "\\begin{bmatrix}",
    "\\begin{pmatrix}",
    "\\left",
    "\\right",
    "\\log",
    "\\ln",
    "\\sin",
    "\\cos",
    "\\tan",
    "\\exp",
    "\\lim",
    "\\sqrt",
    "\\partial",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    MatrixLiteral,
    Latex,
    PlainInfix,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::MatrixLiteral => "matrix_literal",
            Format::Latex => "latex",
            Format::PlainInfix => "plain_infix",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a query. Only linear algebra queries can be matrix literals.
pub fn classify(subject: Subject, text: &str) -> Format {
    let t = text.trim();
    let format = if subject == Subject::La && looks_like_matrix(t) {
        Format::MatrixLiteral
    } else if LATEX_MARKERS.iter().any(|m| t.contains(m)) {
        Format::Latex
    } else {
        Format::PlainInfix
    };
    tracing::debug!(subject = %subject, format = %format, "classified query");
    format
}

/// Nested brackets, or bracketed rows separated by commas
fn looks_like_matrix(t: &str) -> bool {
    t.starts_with("[[") || (t.starts_with('[') && t.contains("],"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_only_for_linear_algebra() {
        assert_eq!(classify(Subject::La, "[[1,2],[3,4]]"), Format::MatrixLiteral);
        assert_eq!(classify(Subject::La, "  [1,2],[3,4]"), Format::MatrixLiteral);
        assert_eq!(classify(Subject::Algebra, "[[1,2],[3,4]]"), Format::PlainInfix);
        assert_eq!(classify(Subject::La, "[1, 2]"), Format::PlainInfix);
    }

    #[test]
    fn test_latex_markers() {
        assert_eq!(classify(Subject::Calc1, "\\frac{1}{x}"), Format::Latex);
        assert_eq!(classify(Subject::Calc1, "\\int_0^1 x dx"), Format::Latex);
        assert_eq!(
            classify(Subject::La, "\\begin{bmatrix}1 & 0\\\\0 & 1\\end{bmatrix}"),
            Format::Latex
        );
        assert_eq!(classify(Subject::Calc1, "sin(x)"), Format::PlainInfix);
    }

    #[test]
    fn test_matrix_wins_over_latex() {
        assert_eq!(classify(Subject::La, "[[\\sqrt{2}, 0], [0, 1]]"), Format::MatrixLiteral);
    }

    #[test]
    fn test_deterministic() {
        for text in ["", "x", "\\lim", "[[", "[a],"] {
            assert_eq!(classify(Subject::La, text), classify(Subject::La, text));
        }
    }
}
