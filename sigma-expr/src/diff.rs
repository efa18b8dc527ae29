//! Symbolic differentiation

use crate::ast::{Constant, Expr, Function};
use crate::simplify::{canonical, make_add, make_func, make_mul, make_pow};
use sigma_core::SigmaError;

/// First derivative of `e` with respect to `var`, in canonical form
pub fn differentiate(e: &Expr, var: &str) -> Result<Expr, SigmaError> {
    d(&canonical(e), var)
}

/// n-th derivative
pub fn differentiate_n(e: &Expr, var: &str, n: u32) -> Result<Expr, SigmaError> {
    let mut out = canonical(e);
    for _ in 0..n {
        out = d(&out, var)?;
    }
    Ok(out)
}

fn neg(e: Expr) -> Expr {
    make_mul(vec![Expr::int(-1), e])
}

fn recip(e: Expr) -> Expr {
    make_pow(e, Expr::int(-1))
}

fn d(e: &Expr, var: &str) -> Result<Expr, SigmaError> {
    if !e.contains_symbol(var) {
        return Ok(Expr::int(0));
    }
    match e {
        Expr::Symbol(_) => Ok(Expr::int(1)),
        Expr::Add(terms) => {
            let parts = terms.iter().map(|t| d(t, var)).collect::<Result<Vec<_>, _>>()?;
            Ok(make_add(parts))
        }
        Expr::Mul(factors) => {
            let mut terms = Vec::with_capacity(factors.len());
            for (i, f) in factors.iter().enumerate() {
                if !f.contains_symbol(var) {
                    continue;
                }
                let mut product: Vec<Expr> = factors
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, g)| g.clone())
                    .collect();
                product.push(d(f, var)?);
                terms.push(make_mul(product));
            }
            Ok(make_add(terms))
        }
        Expr::Pow(b, k) => {
            let b = b.as_ref();
            let k = k.as_ref();
            if !k.contains_symbol(var) {
                // k * b^(k-1) * b'
                let lowered = make_pow(b.clone(), make_add(vec![k.clone(), Expr::int(-1)]));
                return Ok(make_mul(vec![k.clone(), lowered, d(b, var)?]));
            }
            let ln_b = make_func(Function::Ln, b.clone());
            if !b.contains_symbol(var) {
                return Ok(make_mul(vec![e.clone(), ln_b, d(k, var)?]));
            }
            // b^k * (k' ln b + k b'/b)
            let inner = make_add(vec![
                make_mul(vec![d(k, var)?, ln_b]),
                make_mul(vec![k.clone(), d(b, var)?, recip(b.clone())]),
            ]);
            Ok(make_mul(vec![e.clone(), inner]))
        }
        Expr::Func(f, u) => {
            let u = u.as_ref();
            let outer = function_derivative(*f, u);
            Ok(make_mul(vec![outer, d(u, var)?]))
        }
        Expr::Apply(_, args) => {
            if args.len() == 1 && args[0].is_symbol(var) {
                Ok(Expr::Derivative(Box::new(e.clone()), var.to_string(), 1))
            } else {
                Err(SigmaError::unsupported(format!(
                    "cannot differentiate the undefined function {}",
                    e
                )))
            }
        }
        Expr::Derivative(inner, v, n) if v == var && matches!(inner.as_ref(), Expr::Apply(..)) => {
            Ok(Expr::Derivative(inner.clone(), v.clone(), n + 1))
        }
        Expr::Equation(l, r) => Ok(Expr::equation(d(l, var)?, d(r, var)?)),
        Expr::Constant(Constant::Infinity) | Expr::Constant(Constant::Undefined) => Ok(Expr::undefined()),
        other => Err(SigmaError::unsupported(format!(
            "cannot differentiate {}",
            other
        ))),
    }
}

/// `f'(u)` for the elementary functions
fn function_derivative(f: Function, u: &Expr) -> Expr {
    let u2 = || make_pow(u.clone(), Expr::int(2));
    let one_minus_u2 = || make_add(vec![Expr::int(1), neg(u2())]);
    match f {
        Function::Sin => make_func(Function::Cos, u.clone()),
        Function::Cos => neg(make_func(Function::Sin, u.clone())),
        Function::Tan => make_add(vec![make_pow(make_func(Function::Tan, u.clone()), Expr::int(2)), Expr::int(1)]),
        Function::Cot => neg(make_add(vec![make_pow(make_func(Function::Cot, u.clone()), Expr::int(2)), Expr::int(1)])),
        Function::Sec => make_mul(vec![make_func(Function::Sec, u.clone()), make_func(Function::Tan, u.clone())]),
        Function::Csc => neg(make_mul(vec![make_func(Function::Csc, u.clone()), make_func(Function::Cot, u.clone())])),
        Function::Asin => make_pow(one_minus_u2(), Expr::rational(-1, 2)),
        Function::Acos => neg(make_pow(one_minus_u2(), Expr::rational(-1, 2))),
        Function::Atan => recip(make_add(vec![u2(), Expr::int(1)])),
        Function::Sinh => make_func(Function::Cosh, u.clone()),
        Function::Cosh => make_func(Function::Sinh, u.clone()),
        Function::Tanh => make_add(vec![Expr::int(1), neg(make_pow(make_func(Function::Tanh, u.clone()), Expr::int(2)))]),
        Function::Exp => make_func(Function::Exp, u.clone()),
        Function::Ln => recip(u.clone()),
        Function::Abs => make_mul(vec![u.clone(), recip(make_func(Function::Abs, u.clone()))]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_infix, parse_infix_with, ParseContext};

    fn dx(s: &str) -> String {
        differentiate(&parse_infix(s).unwrap(), "x").unwrap().to_string()
    }

    #[test]
    fn test_power_rule() {
        assert_eq!(dx("x^3"), "3*x^2");
        assert_eq!(dx("x^2 + 3x - 4"), "2*x + 3");
        assert_eq!(dx("5"), "0");
    }

    #[test]
    fn test_chain_rule() {
        assert_eq!(dx("sin(x^2)"), "2*x*cos(x^2)");
        assert_eq!(dx("exp(3x)"), "3*exp(3*x)");
    }

    #[test]
    fn test_unicode_root_and_square() {
        assert_eq!(dx("x²"), "2*x");
        let d = differentiate(&parse_infix("√x").unwrap(), "x").unwrap();
        let expected = parse_infix("1/(2 sqrt(x))").unwrap();
        for x in [0.25, 1.0, 4.0] {
            let got = crate::eval::evaluate_at(&d, "x", x).unwrap();
            let want = crate::eval::evaluate_at(&expected, "x", x).unwrap();
            assert!((got - want).abs() < 1e-12, "at {}: {} vs {}", x, got, want);
        }
    }

    #[test]
    fn test_product_rule() {
        assert_eq!(dx("x*sin(x)"), "x*cos(x) + sin(x)");
    }

    #[test]
    fn test_log_and_reciprocal() {
        assert_eq!(dx("log(x)"), "1/x");
        assert_eq!(dx("1/x"), "-1/x^2");
    }

    #[test]
    fn test_variable_exponent() {
        assert_eq!(dx("2^x"), "2^x*log(2)");
    }

    #[test]
    fn test_higher_order() {
        let e = parse_infix("x^4").unwrap();
        assert_eq!(differentiate_n(&e, "x", 2).unwrap().to_string(), "12*x^2");
    }

    #[test]
    fn test_undefined_function() {
        let ctx = ParseContext::default().with_function("y");
        let e = parse_infix_with("y(x)", &ctx).unwrap();
        let d1 = differentiate(&e, "x").unwrap();
        assert!(matches!(d1, Expr::Derivative(_, _, 1)));
        let d2 = differentiate(&d1, "x").unwrap();
        assert!(matches!(d2, Expr::Derivative(_, _, 2)));
    }

    #[test]
    fn test_other_variables_are_constants() {
        let e = parse_infix("a*x^2 + b").unwrap();
        assert_eq!(differentiate(&e, "x").unwrap().to_string(), "2*a*x");
    }
}
