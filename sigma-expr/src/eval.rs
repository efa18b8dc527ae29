//! Floating-point evaluation
//!
//! Used by the numeric fallbacks (limits, root polishing, eigenvectors) and by
//! `make_func` for approximate arguments.

use crate::ast::{Constant, Expr, Function};
use sigma_core::{Number, SigmaError};
use std::collections::HashMap;

pub fn apply_function(f: Function, x: f64) -> f64 {
    match f {
        Function::Sin => x.sin(),
        Function::Cos => x.cos(),
        Function::Tan => x.tan(),
        Function::Cot => 1.0 / x.tan(),
        Function::Sec => 1.0 / x.cos(),
        Function::Csc => 1.0 / x.sin(),
        Function::Asin => x.asin(),
        Function::Acos => x.acos(),
        Function::Atan => x.atan(),
        Function::Sinh => x.sinh(),
        Function::Cosh => x.cosh(),
        Function::Tanh => x.tanh(),
        Function::Exp => x.exp(),
        Function::Ln => x.ln(),
        Function::Abs => x.abs(),
    }
}

/// Evaluate with the given symbol bindings
pub fn evaluate(e: &Expr, bindings: &HashMap<String, f64>) -> Result<f64, SigmaError> {
    match e {
        Expr::Number(n) => n
            .to_f64()
            .ok_or_else(|| SigmaError::computation(format!("number {} is out of floating-point range", n))),
        Expr::Symbol(s) => bindings
            .get(s)
            .copied()
            .ok_or_else(|| SigmaError::validation(format!("no value for symbol '{}'", s))),
        Expr::Constant(c) => match c {
            Constant::Pi => Ok(std::f64::consts::PI),
            Constant::E => Ok(std::f64::consts::E),
            Constant::Infinity => Ok(f64::INFINITY),
            Constant::Undefined => Ok(f64::NAN),
            Constant::I => Err(SigmaError::unsupported("complex values cannot be evaluated numerically")),
        },
        Expr::Add(terms) => terms.iter().try_fold(0.0, |acc, t| Ok(acc + evaluate(t, bindings)?)),
        Expr::Mul(factors) => factors.iter().try_fold(1.0, |acc, f| Ok(acc * evaluate(f, bindings)?)),
        Expr::Pow(b, x) => {
            let base = evaluate(b, bindings)?;
            let exp = evaluate(x, bindings)?;
            // odd roots of negative numbers are real
            if base < 0.0 && exp.fract() != 0.0 {
                if let Some(k) = x.as_number() {
                    let q = Number::from_ibig(k.denom());
                    if q.to_i64().is_some_and(|d| d % 2 == 1) {
                        return Ok(-(-base).powf(exp));
                    }
                }
            }
            Ok(base.powf(exp))
        }
        Expr::Func(f, a) => Ok(apply_function(*f, evaluate(a, bindings)?)),
        Expr::Factorial(a) => {
            let n = evaluate(a, bindings)?;
            if n < 0.0 || n.fract() != 0.0 || n > 170.0 {
                return Ok(f64::NAN);
            }
            Ok((1..=n as u64).map(|i| i as f64).product())
        }
        Expr::Apply(name, args) if name == "binomial" && args.len() == 2 => {
            let n = evaluate(&args[0], bindings)?;
            let k = evaluate(&args[1], bindings)?;
            if k < 0.0 || k > n || k.fract() != 0.0 || n.fract() != 0.0 {
                return Ok(0.0);
            }
            let mut acc = 1.0;
            for i in 0..k as u64 {
                acc = acc * (n - i as f64) / (i as f64 + 1.0);
            }
            Ok(acc)
        }
        other => Err(SigmaError::unsupported(format!(
            "cannot evaluate '{}' numerically",
            other
        ))),
    }
}

/// Evaluate a univariate expression at a point. `None` when not numeric.
pub fn evaluate_at(e: &Expr, var: &str, x: f64) -> Option<f64> {
    let mut bindings = HashMap::new();
    bindings.insert(var.to_string(), x);
    evaluate(e, &bindings).ok()
}

/// Evaluate a closed expression to an approximate `Number`
pub fn evaluate_number(e: &Expr) -> Result<Number, SigmaError> {
    let v = evaluate(e, &HashMap::new())?;
    if v.is_finite() {
        Ok(Number::from_f64(v))
    } else {
        Err(SigmaError::computation(format!("'{}' does not evaluate to a finite number", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    #[test]
    fn test_evaluate_polynomial() {
        let e = parse_infix("x^2 + 3x - 4").unwrap();
        assert_eq!(evaluate_at(&e, "x", 1.0), Some(0.0));
        assert_eq!(evaluate_at(&e, "x", 2.0), Some(6.0));
    }

    #[test]
    fn test_evaluate_functions() {
        let e = parse_infix("sin(pi/2) + exp(0)").unwrap();
        let v = evaluate(&e, &HashMap::new()).unwrap();
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unbound_symbol() {
        let e = parse_infix("x + y").unwrap();
        assert!(evaluate_at(&e, "x", 1.0).is_none());
    }

    #[test]
    fn test_real_cube_root() {
        let e = Expr::pow(Expr::int(-8), Expr::rational(1, 3));
        let v = evaluate(&e, &HashMap::new()).unwrap();
        assert!((v + 2.0).abs() < 1e-12);
    }
}
