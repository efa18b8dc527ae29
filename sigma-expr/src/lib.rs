//! Sigma Expr - Symbolic expressions
//!
//! The expression tree and everything that operates on it:
//! - Infix and LaTeX parsing, plain and LaTeX rendering
//! - Canonical forms, simplification, expansion and factoring
//! - Equation solving, differentiation, integration, limits and series
//! - Linear ODEs and boolean minimization

mod ast;
mod diff;
mod eval;
mod expand;
mod factor;
mod integrate;
mod latex;
mod lexer;
mod limit;
mod logic;
mod ode;
mod parser;
mod poly;
mod render;
mod series;
mod simplify;
mod solve;

pub use ast::{Constant, Direction, Expr, Function, Shape};
pub use diff::{differentiate, differentiate_n};
pub use eval::{apply_function, evaluate, evaluate_at, evaluate_number};
pub use expand::expand;
pub use factor::factor;
pub use integrate::{integrate, integrate_definite};
pub use latex::{parse_latex, parse_latex_expr, LatexValue};
pub use limit::limit;
pub use logic::{simplify_logic, truth, MAX_VARIABLES};
pub use ode::{dsolve, unknown_function};
pub use parser::{parse_equation, parse_infix, parse_infix_with, tidy_query, ParseContext};
pub use poly::{as_numer_denom, collect_in, Poly};
pub use render::{number_latex, to_latex, MAX_RENDER_DEPTH};
pub use series::{series, MAX_ORDER};
pub use simplify::{canonical, cancel_rational, complexity, simplify};
pub use solve::{polynomial_roots, solve};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simplify_render() {
        let e = parse_infix("2x + 3x").unwrap();
        let s = simplify(&e);
        assert_eq!(s.to_string(), "5*x");
        assert_eq!(to_latex(&s).unwrap(), "5 x");
    }

    #[test]
    fn test_latex_and_infix_agree() {
        let a = canonical(&parse_latex_expr(r"\frac{x^{2}}{2}").unwrap());
        let b = canonical(&parse_infix("x^2/2").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_derivative_then_integral() {
        let e = parse_infix("x^3 + 2x").unwrap();
        let back = integrate(&differentiate(&e, "x").unwrap(), "x").unwrap();
        assert_eq!(simplify(&back), simplify(&e));
    }

    #[test]
    fn test_solve_quadratic() {
        let eq = parse_equation("x^2 + 3x - 4 = 0", &ParseContext::default()).unwrap();
        let roots: Vec<String> = solve(&eq, "x").unwrap().iter().map(|r| r.to_string()).collect();
        assert_eq!(roots, vec!["-4", "1"]);
    }
}
