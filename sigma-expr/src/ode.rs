//! Linear ordinary differential equations
//!
//! Constant-coefficient equations of any order are solved through the roots
//! of the characteristic polynomial. Forcing terms are handled for constants
//! (any order), by an integrating factor (first order) and by variation of
//! parameters (second order).

use crate::ast::{Expr, Function};
use crate::diff::differentiate;
use crate::eval::evaluate;
use crate::expand::expand;
use crate::integrate::integrate;
use crate::poly::{collect_in, Poly};
use crate::simplify::{canonical, make_add, make_func, make_mul, make_pow, simplify};
use crate::solve::polynomial_roots;
use sigma_core::{Number, SigmaError};
use std::collections::HashMap;

/// The unknown function in `eq`: `func(var)` when it occurs, else the first
/// undefined function applied to a single symbol
pub fn unknown_function(eq: &Expr, func: &str, var: &str) -> Option<Expr> {
    let preferred = Expr::Apply(func.to_string(), vec![Expr::sym(var)]);
    if eq.contains(&preferred) {
        return Some(preferred);
    }
    eq.applied_functions()
        .into_iter()
        .find(|f| matches!(f, Expr::Apply(_, args) if args.len() == 1))
}

fn order_symbol(k: u32) -> String {
    format!("_d{}", k)
}

/// Replace `y(x)` and its derivatives by placeholder symbols
fn lower(e: &Expr, unknown: &Expr, var: &str) -> Expr {
    if e == unknown {
        return Expr::sym(&order_symbol(0));
    }
    if let Expr::Derivative(inner, v, n) = e {
        if v == var {
            let mut total = *n;
            let mut cur = inner.as_ref();
            while let Expr::Derivative(next, v2, n2) = cur {
                if v2 != var {
                    break;
                }
                total += n2;
                cur = next.as_ref();
            }
            if cur == unknown {
                return Expr::sym(&order_symbol(total));
            }
        }
    }
    e.map_children(|c| lower(c, unknown, var))
}

/// `a_k` coefficients (index = derivative order) and the right-hand side of
/// `sum a_k y^(k) = rhs`
fn linear_form(f: &Expr, max_order: u32) -> Result<(Vec<Expr>, Expr), SigmaError> {
    let terms = match f {
        Expr::Add(ts) => ts.clone(),
        other => vec![other.clone()],
    };
    let mut coeffs: Vec<Vec<Expr>> = vec![Vec::new(); max_order as usize + 1];
    let mut forcing = Vec::new();
    for t in terms {
        let present: Vec<u32> = (0..=max_order).filter(|k| t.contains_symbol(&order_symbol(*k))).collect();
        match present[..] {
            [] => forcing.push(t),
            [k] => {
                let c = collect_in(&t, &order_symbol(k))
                    .filter(|c| c.len() == 2 && c[0].is_zero())
                    .ok_or_else(nonlinear)?;
                coeffs[k as usize].push(c[1].clone());
            }
            _ => return Err(nonlinear()),
        }
    }
    let a = coeffs.into_iter().map(make_add).collect();
    let rhs = make_mul(vec![Expr::int(-1), make_add(forcing)]);
    Ok((a, rhs))
}

fn nonlinear() -> SigmaError {
    SigmaError::unsupported("only linear differential equations are supported")
}

/// Solve `eq` for `unknown` (an applied function such as `y(x)`), returning
/// `y(x) = solution` with arbitrary constants `C1, C2, ...`
pub fn dsolve(eq: &Expr, unknown: &Expr) -> Result<Expr, SigmaError> {
    let var = match unknown {
        Expr::Apply(_, args) if args.len() == 1 => match &args[0] {
            Expr::Symbol(s) => s.clone(),
            _ => return Err(SigmaError::validation(format!("{} is not a function of one variable", unknown))),
        },
        _ => return Err(SigmaError::validation(format!("{} is not an undefined function", unknown))),
    };
    let f = match eq {
        Expr::Equation(l, r) => Expr::sub(l.as_ref().clone(), r.as_ref().clone()),
        other => other.clone(),
    };
    let lowered = expand(&canonical(&lower(&canonical(&f), unknown, &var)));
    if lowered.contains(unknown) {
        return Err(nonlinear());
    }

    let max_order = lowered
        .free_symbols()
        .iter()
        .filter_map(|s| s.strip_prefix("_d").and_then(|k| k.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    if max_order == 0 {
        return Err(SigmaError::validation(format!(
            "equation contains no derivatives of {}",
            unknown
        )));
    }

    let (a, rhs) = linear_form(&lowered, max_order)?;
    tracing::debug!(order = max_order, rhs = %rhs, "solving linear ode");
    let constant = a.iter().all(|c| c.is_number());

    let solution = if max_order == 1 && (!constant || rhs.contains_symbol(&var)) {
        integrating_factor(&a[1], &a[0], &rhs, &var)?
    } else if constant {
        constant_coefficients(&a, &rhs, &var)?
    } else {
        return Err(SigmaError::unsupported(
            "variable-coefficient equations above first order are not supported",
        ));
    };
    Ok(Expr::equation(unknown.clone(), solution))
}

fn constant_symbol(i: usize) -> Expr {
    Expr::sym(&format!("C{}", i))
}

/// `y = (∫ mu Q dx + C1) / mu` with `mu = exp(∫ P dx)`
fn integrating_factor(a1: &Expr, a0: &Expr, rhs: &Expr, var: &str) -> Result<Expr, SigmaError> {
    let inv = make_pow(a1.clone(), Expr::int(-1));
    let p = simplify(&make_mul(vec![a0.clone(), inv.clone()]));
    let q = simplify(&make_mul(vec![rhs.clone(), inv]));
    let mu = simplify(&make_func(Function::Exp, integrate(&p, var)?));
    let accumulated = integrate(&make_mul(vec![mu.clone(), q]), var)?;
    Ok(simplify(&make_mul(vec![
        make_add(vec![accumulated, constant_symbol(1)]),
        make_pow(mu, Expr::int(-1)),
    ])))
}

/// Real and imaginary part of an expression linear in `I`
fn split_complex(e: &Expr) -> (Expr, Expr) {
    let re = canonical(&e.replace(&Expr::imaginary(), &Expr::int(0)));
    let with_one = canonical(&e.replace(&Expr::imaginary(), &Expr::int(1)));
    let im = canonical(&make_add(vec![with_one, make_mul(vec![Expr::int(-1), re.clone()])]));
    (re, im)
}

/// Fundamental solutions from the characteristic roots
fn basis(a: &[Expr], var: &str) -> Result<Vec<Expr>, SigmaError> {
    let coeffs = a
        .iter()
        .map(|c| c.as_number().cloned().ok_or_else(nonlinear))
        .collect::<Result<Vec<Number>, _>>()?;
    let characteristic = Poly::new(coeffs);
    let x = Expr::sym(var);
    let mut out = Vec::new();
    for (root, m) in polynomial_roots(&characteristic) {
        let powers = (0..m).map(|j| make_pow(x.clone(), Expr::int(j as i64)));
        if !root.contains(&Expr::imaginary()) {
            let e = make_func(Function::Exp, make_mul(vec![root.clone(), x.clone()]));
            out.extend(powers.map(|p| make_mul(vec![p, e.clone()])));
            continue;
        }
        let (re, im) = split_complex(&root);
        // each conjugate pair contributes once, from the root with positive imaginary part
        if evaluate(&im, &HashMap::new()).map_or(true, |v| v <= 0.0) {
            continue;
        }
        let envelope = make_func(Function::Exp, make_mul(vec![re, x.clone()]));
        let angle = make_mul(vec![im, x.clone()]);
        for p in powers {
            out.push(make_mul(vec![p.clone(), envelope.clone(), make_func(Function::Sin, angle.clone())]));
            out.push(make_mul(vec![p, envelope.clone(), make_func(Function::Cos, angle.clone())]));
        }
    }
    Ok(out)
}

fn constant_coefficients(a: &[Expr], rhs: &Expr, var: &str) -> Result<Expr, SigmaError> {
    let fundamental = basis(a, var)?;
    let mut terms: Vec<Expr> = fundamental
        .iter()
        .enumerate()
        .map(|(i, y)| make_mul(vec![constant_symbol(i + 1), y.clone()]))
        .collect();

    if !rhs.is_zero() {
        let particular = if !rhs.contains_symbol(var) {
            constant_forcing(a, rhs, var)?
        } else if a.len() == 3 && fundamental.len() == 2 {
            variation_of_parameters(&fundamental[0], &fundamental[1], &a[2], rhs, var)?
        } else {
            return Err(SigmaError::unsupported(
                "non-constant forcing is supported up to second order",
            ));
        };
        terms.push(particular);
    }
    Ok(canonical(&make_add(terms)))
}

/// `y_p = rhs / (a_j j!) * x^j` for the lowest non-vanishing `a_j`
fn constant_forcing(a: &[Expr], rhs: &Expr, var: &str) -> Result<Expr, SigmaError> {
    let (j, aj) = a
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_zero())
        .ok_or_else(|| SigmaError::validation("equation has no derivative terms"))?;
    let factorial = Number::factorial(j as u64)?;
    Ok(make_mul(vec![
        rhs.clone(),
        make_pow(make_mul(vec![aj.clone(), Expr::Number(factorial)]), Expr::int(-1)),
        make_pow(Expr::sym(var), Expr::int(j as i64)),
    ]))
}

/// `y_p = -y1 ∫ y2 r / W + y2 ∫ y1 r / W` with `r = rhs / a2`
fn variation_of_parameters(y1: &Expr, y2: &Expr, a2: &Expr, rhs: &Expr, var: &str) -> Result<Expr, SigmaError> {
    let wronskian = simplify(&make_add(vec![
        make_mul(vec![y1.clone(), differentiate(y2, var)?]),
        make_mul(vec![Expr::int(-1), differentiate(y1, var)?, y2.clone()]),
    ]));
    if wronskian.is_zero() {
        return Err(SigmaError::computation("fundamental solutions are linearly dependent"));
    }
    let r = make_mul(vec![
        rhs.clone(),
        make_pow(make_mul(vec![a2.clone(), wronskian]), Expr::int(-1)),
    ]);
    let u1 = integrate(&simplify(&make_mul(vec![y2.clone(), r.clone()])), var)?;
    let u2 = integrate(&simplify(&make_mul(vec![y1.clone(), r])), var)?;
    Ok(simplify(&make_add(vec![
        make_mul(vec![Expr::int(-1), y1.clone(), u1]),
        make_mul(vec![y2.clone(), u2]),
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::evaluate_at;
    use crate::parser::{parse_equation, ParseContext};

    fn ode(text: &str) -> Expr {
        let ctx = ParseContext::default().with_function("y");
        let eq = parse_equation(text, &ctx).unwrap();
        let y = unknown_function(&eq, "y", "x").unwrap();
        dsolve(&eq, &y).unwrap()
    }

    fn rhs(e: &Expr) -> Expr {
        match e {
            Expr::Equation(_, r) => r.as_ref().clone(),
            other => other.clone(),
        }
    }

    #[test]
    fn test_exponential_growth() {
        assert_eq!(rhs(&ode("y' = y")).to_string(), "C1*exp(x)");
    }

    #[test]
    fn test_harmonic_oscillator() {
        assert_eq!(rhs(&ode("y'' + y = 0")).to_string(), "C1*sin(x) + C2*cos(x)");
    }

    #[test]
    fn test_distinct_real_roots() {
        let sol = rhs(&ode("y'' - 3y' + 2y = 0"));
        assert!(sol.contains(&Expr::exp(Expr::sym("x"))));
        assert!(sol.contains_symbol("C2"));
    }

    #[test]
    fn test_repeated_root() {
        let sol = rhs(&ode("y'' - 2y' + y = 0"));
        let expected = canonical(&crate::parser::parse_infix("C1*exp(x) + C2*x*exp(x)").unwrap());
        assert_eq!(sol, expected);
    }

    #[test]
    fn test_constant_forcing() {
        let expected = canonical(&crate::parser::parse_infix("C1*exp(-x) + 2").unwrap());
        assert_eq!(rhs(&ode("y' + y = 2")), expected);
    }

    #[test]
    fn test_integrating_factor() {
        // y' + y = x  ->  y = x - 1 + C1*exp(-x)
        let sol = rhs(&ode("y' + y = x"));
        let at_c0 = sol.substitute("C1", &Expr::int(0));
        for x in [0.5, 2.0] {
            let v = evaluate_at(&at_c0, "x", x).unwrap();
            assert!((v - (x - 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_unknown_function() {
        let eq = parse_equation("x + 1 = 0", &ParseContext::default()).unwrap();
        assert!(unknown_function(&eq, "y", "x").is_none());
    }

    #[test]
    fn test_nonlinear_rejected() {
        let ctx = ParseContext::default().with_function("y");
        let eq = parse_equation("y' = y^2", &ctx).unwrap();
        let y = unknown_function(&eq, "y", "x").unwrap();
        assert!(dsolve(&eq, &y).is_err());
    }
}
