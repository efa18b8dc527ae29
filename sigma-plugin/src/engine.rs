//! The symbolic engine the solvers talk to
//!
//! Solvers never call `sigma-expr` or `sigma-matrix` directly; every symbolic
//! operation goes through [`Engine`], so a different backend can be swapped
//! in without touching the dispatchers.

use crate::envelope::ParsedExpression;
use sigma_core::{Number, SigmaError};
use sigma_expr::{Direction, Expr, LatexValue, ParseContext};
use sigma_matrix::{Eigenpair, Matrix};

/// Capability surface consumed by the solvers
pub trait Engine: Send + Sync {
    // ========== Parsing ==========

    /// Structure-preserving infix parse
    fn parse_infix(&self, text: &str) -> Result<Expr, SigmaError>;

    /// Permissive parse: typographic operators normalised, result simplified
    fn parse_evaluating(&self, text: &str) -> Result<Expr, SigmaError>;

    /// LaTeX parse yielding an expression or a matrix
    fn parse_latex(&self, text: &str) -> Result<ParsedExpression, SigmaError>;

    fn parse_matrix(&self, text: &str) -> Result<Matrix, SigmaError>;

    /// `lhs = rhs` (or a bare expression) where `functions` are read as
    /// undefined functions of `var`
    fn parse_equation(&self, text: &str, functions: &[&str], var: &str) -> Result<Expr, SigmaError>;

    // ========== Rendering ==========

    fn latex(&self, e: &Expr) -> Result<String, SigmaError>;

    fn matrix_latex(&self, m: &Matrix) -> Result<String, SigmaError>;

    // ========== Algebra ==========

    fn expand(&self, e: &Expr) -> Expr;

    fn factor(&self, e: &Expr) -> Expr;

    fn simplify(&self, e: &Expr) -> Expr;

    fn solve(&self, equation: &Expr, var: &str) -> Result<Vec<Expr>, SigmaError>;

    // ========== Calculus ==========

    fn differentiate(&self, e: &Expr, var: &str) -> Result<Expr, SigmaError>;

    fn integrate(&self, e: &Expr, var: &str) -> Result<Expr, SigmaError>;

    fn integrate_definite(&self, e: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, SigmaError>;

    fn limit(&self, e: &Expr, var: &str, point: &Expr, dir: Direction) -> Result<Expr, SigmaError>;

    fn series(&self, e: &Expr, var: &str, point: &Expr, order: u32) -> Result<Expr, SigmaError>;

    /// The applied function to solve an ODE for, if any
    fn unknown_function(&self, equation: &Expr, func: &str, var: &str) -> Option<Expr>;

    fn dsolve(&self, equation: &Expr, unknown: &Expr) -> Result<Expr, SigmaError>;

    // ========== Linear algebra ==========

    fn rref(&self, m: &Matrix) -> (Matrix, Vec<usize>);

    fn eigenvects(&self, m: &Matrix) -> Result<Vec<Eigenpair>, SigmaError>;

    fn det(&self, m: &Matrix) -> Result<Expr, SigmaError>;

    fn nullspace(&self, m: &Matrix) -> Vec<Matrix>;

    // ========== Discrete ==========

    fn simplify_logic(&self, e: &Expr) -> Result<Expr, SigmaError>;

    fn factorial(&self, n: u64) -> Result<Number, SigmaError>;

    fn binomial(&self, n: u64, k: u64) -> Result<Number, SigmaError>;

    fn permutations(&self, n: u64, k: u64) -> Result<Number, SigmaError>;

    /// Exact value when one exists, otherwise a decimal approximation
    fn evaluate(&self, e: &Expr) -> Result<Expr, SigmaError>;
}

/// Engine backed by the workspace's own symbolic crates
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for NativeEngine {
    fn parse_infix(&self, text: &str) -> Result<Expr, SigmaError> {
        sigma_expr::parse_infix(text)
    }

    fn parse_evaluating(&self, text: &str) -> Result<Expr, SigmaError> {
        let e = sigma_expr::parse_infix(&sigma_expr::tidy_query(text))?;
        Ok(sigma_expr::simplify(&e))
    }

    fn parse_latex(&self, text: &str) -> Result<ParsedExpression, SigmaError> {
        match sigma_expr::parse_latex(text)? {
            LatexValue::Expr(e) => Ok(ParsedExpression::Expression(e)),
            LatexValue::Matrix(rows) => Matrix::new(rows).map(ParsedExpression::Matrix),
        }
    }

    fn parse_matrix(&self, text: &str) -> Result<Matrix, SigmaError> {
        Matrix::parse_literal(text)
    }

    fn parse_equation(&self, text: &str, functions: &[&str], var: &str) -> Result<Expr, SigmaError> {
        let ctx = functions
            .iter()
            .fold(ParseContext::default().with_var(var), |ctx, f| ctx.with_function(*f));
        sigma_expr::parse_equation(&sigma_expr::tidy_query(text), &ctx)
    }

    fn latex(&self, e: &Expr) -> Result<String, SigmaError> {
        sigma_expr::to_latex(e)
    }

    fn matrix_latex(&self, m: &Matrix) -> Result<String, SigmaError> {
        m.to_latex()
    }

    fn expand(&self, e: &Expr) -> Expr {
        sigma_expr::expand(e)
    }

    fn factor(&self, e: &Expr) -> Expr {
        sigma_expr::factor(e)
    }

    fn simplify(&self, e: &Expr) -> Expr {
        sigma_expr::simplify(e)
    }

    fn solve(&self, equation: &Expr, var: &str) -> Result<Vec<Expr>, SigmaError> {
        sigma_expr::solve(equation, var)
    }

    fn differentiate(&self, e: &Expr, var: &str) -> Result<Expr, SigmaError> {
        sigma_expr::differentiate(e, var)
    }

    fn integrate(&self, e: &Expr, var: &str) -> Result<Expr, SigmaError> {
        sigma_expr::integrate(e, var)
    }

    fn integrate_definite(&self, e: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, SigmaError> {
        sigma_expr::integrate_definite(e, var, lower, upper)
    }

    fn limit(&self, e: &Expr, var: &str, point: &Expr, dir: Direction) -> Result<Expr, SigmaError> {
        sigma_expr::limit(e, var, point, dir)
    }

    fn series(&self, e: &Expr, var: &str, point: &Expr, order: u32) -> Result<Expr, SigmaError> {
        sigma_expr::series(e, var, point, order)
    }

    fn unknown_function(&self, equation: &Expr, func: &str, var: &str) -> Option<Expr> {
        sigma_expr::unknown_function(equation, func, var)
    }

    fn dsolve(&self, equation: &Expr, unknown: &Expr) -> Result<Expr, SigmaError> {
        sigma_expr::dsolve(equation, unknown)
    }

    fn rref(&self, m: &Matrix) -> (Matrix, Vec<usize>) {
        m.rref()
    }

    fn eigenvects(&self, m: &Matrix) -> Result<Vec<Eigenpair>, SigmaError> {
        m.eigenvectors()
    }

    fn det(&self, m: &Matrix) -> Result<Expr, SigmaError> {
        m.det()
    }

    fn nullspace(&self, m: &Matrix) -> Vec<Matrix> {
        m.nullspace()
    }

    fn simplify_logic(&self, e: &Expr) -> Result<Expr, SigmaError> {
        sigma_expr::simplify_logic(e)
    }

    fn factorial(&self, n: u64) -> Result<Number, SigmaError> {
        Ok(Number::factorial(n)?)
    }

    fn binomial(&self, n: u64, k: u64) -> Result<Number, SigmaError> {
        Ok(Number::binomial(n, k)?)
    }

    fn permutations(&self, n: u64, k: u64) -> Result<Number, SigmaError> {
        Ok(Number::permutations(n, k)?)
    }

    fn evaluate(&self, e: &Expr) -> Result<Expr, SigmaError> {
        let simplified = sigma_expr::simplify(e);
        if simplified.is_number() || !simplified.free_symbols().is_empty() {
            return Ok(simplified);
        }
        sigma_expr::evaluate_number(&simplified).map(Expr::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_infix_preserves_structure() {
        let engine = NativeEngine::new();
        let e = engine.parse_infix("2x + 3x").unwrap();
        assert!(matches!(e, Expr::Add(ref terms) if terms.len() == 2));
        assert_eq!(engine.simplify(&e).to_string(), "5*x");
    }

    #[test]
    fn test_parse_evaluating_normalizes() {
        let engine = NativeEngine::new();
        let e = engine.parse_evaluating("2 × 3 − 1").unwrap();
        assert_eq!(e, Expr::int(5));
    }

    #[test]
    fn test_latex_matrix() {
        let engine = NativeEngine::new();
        let parsed = engine
            .parse_latex(r"\begin{bmatrix}1 & 2\\3 & 4\end{bmatrix}")
            .unwrap();
        let m = parsed.as_matrix().unwrap();
        assert_eq!((m.rows, m.cols), (2, 2));
    }

    #[test]
    fn test_equation_with_unknown_function() {
        let engine = NativeEngine::new();
        let eq = engine.parse_equation("y'' + y = 0", &["y"], "x").unwrap();
        let y = engine.unknown_function(&eq, "y", "x").unwrap();
        assert_eq!(y.to_string(), "y(x)");
    }

    #[test]
    fn test_exact_counting() {
        let engine = NativeEngine::new();
        assert_eq!(engine.binomial(5, 2).unwrap(), Number::from_i64(10));
        assert_eq!(engine.permutations(5, 2).unwrap(), Number::from_i64(20));
        assert_eq!(engine.factorial(0).unwrap(), Number::one());
    }

    #[test]
    fn test_evaluate_numeric_fallback() {
        let engine = NativeEngine::new();
        let e = engine.parse_infix("sqrt(2)").unwrap();
        let v = engine.evaluate(&e).unwrap();
        assert!(matches!(v, Expr::Number(ref n) if !n.is_exact()));
        let exact = engine.parse_infix("3!").unwrap();
        assert_eq!(engine.evaluate(&exact).unwrap(), Expr::int(6));
    }
}
