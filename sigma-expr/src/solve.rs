//! Solving a single equation for one unknown
//!
//! Polynomial equations get exact rational roots first, then closed forms for
//! the remaining quadratic (or biquadratic) factor, then Durand–Kerner for
//! whatever is left. Non-polynomial equations are handled by isolating the
//! unknown through inverse functions.

use crate::ast::{Expr, Function};
use crate::eval::{evaluate, evaluate_at};
use crate::expand::expand;
use crate::poly::{as_numer_denom, collect_in, Poly};
use crate::simplify::{canonical, make_add, make_func, make_mul, make_pow, simplify};
use sigma_core::{Number, SigmaError};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Durand–Kerner sweeps before giving up on convergence
const MAX_ITERATIONS: usize = 500;

/// Nesting of inverse functions unwound while isolating the unknown
const MAX_ISOLATE_DEPTH: usize = 12;

/// Residual above which an isolated candidate is rejected as extraneous
const RESIDUAL_TOLERANCE: f64 = 1e-7;

/// Solve `eq` (an `Equation`, or an expression taken as `= 0`) for `var`.
///
/// Returns the distinct solutions, real ones ascending, complex ones after.
/// An equation that holds identically is an error; one with no solutions
/// gives an empty list.
pub fn solve(eq: &Expr, var: &str) -> Result<Vec<Expr>, SigmaError> {
    let f = match eq {
        Expr::Equation(l, r) => canonical(&Expr::sub(l.as_ref().clone(), r.as_ref().clone())),
        other => canonical(other),
    };
    if !f.contains_symbol(var) {
        if f.is_zero() {
            return Err(SigmaError::computation(format!(
                "Equation holds for every value of {}",
                var
            )));
        }
        return Ok(Vec::new());
    }

    let (num, den) = as_numer_denom(&f);
    let num = expand(&num);
    let den = canonical(&den);
    tracing::debug!(numerator = %num, var, "solving");

    let mut roots: Vec<Expr> = if let Some(p) = Poly::from_expr(&num, var) {
        polynomial_roots(&p).into_iter().map(|(r, _)| r).collect()
    } else if let Some(r) = solve_collected(&num, var) {
        r
    } else {
        let candidates = isolate(&f, &Expr::int(0), var, 0)?;
        candidates.into_iter().filter(|r| satisfies(&f, var, r)).collect()
    };

    if den.contains_symbol(var) {
        roots.retain(|r| !canonical(&den.substitute(var, r)).is_zero());
    }
    let mut distinct: Vec<Expr> = Vec::new();
    for r in roots {
        if !distinct.contains(&r) {
            distinct.push(r);
        }
    }
    distinct.sort_by(root_order);
    Ok(distinct)
}

/// Roots of a polynomial with multiplicity, ordered like `solve`
pub fn polynomial_roots(p: &Poly) -> Vec<(Expr, usize)> {
    if p.degree() == 0 {
        return Vec::new();
    }
    if p.coeffs().iter().any(|c| !c.is_exact()) {
        return numeric_roots(p).into_iter().map(|r| (r, 1)).collect();
    }

    let (rational, rest) = p.rational_roots();
    let mut out: Vec<(Expr, usize)> = rational.into_iter().map(|(r, m)| (Expr::Number(r), m)).collect();

    let (_, rest) = rest.primitive();
    // a repeated irreducible factor shows up in gcd(p, p')
    let repeated = rest.gcd(&rest.derivative());
    let (square_free, mult) = if repeated.degree() > 0 {
        match rest.div_rem(&repeated) {
            Some((q, _)) if q.gcd(&repeated).degree() == q.degree() => (q, 2),
            _ => (rest, 1),
        }
    } else {
        (rest, 1)
    };

    let irrational = match square_free.degree() {
        0 => Vec::new(),
        1 => {
            let root = square_free.coeff(0).neg().checked_div(&square_free.coeff(1)).ok();
            root.map(|r| vec![Expr::Number(r)]).unwrap_or_default()
        }
        2 => quadratic_roots(&square_free.coeff(2), &square_free.coeff(1), &square_free.coeff(0)),
        4 if square_free.coeff(1).is_zero() && square_free.coeff(3).is_zero() => {
            // biquadratic: z = x^2
            quadratic_roots(&square_free.coeff(4), &square_free.coeff(2), &square_free.coeff(0))
                .into_iter()
                .flat_map(|z| {
                    let r = make_pow(z, Expr::rational(1, 2));
                    [make_mul(vec![Expr::int(-1), r.clone()]), r]
                })
                .collect()
        }
        _ => numeric_roots(&square_free),
    };
    out.extend(irrational.into_iter().map(|r| (r, mult)));
    out.sort_by(|a, b| root_order(&a.0, &b.0));
    out
}

/// `(-b ± sqrt(b^2 - 4ac)) / 2a`, minus branch first
fn quadratic_roots(a: &Number, b: &Number, c: &Number) -> Vec<Expr> {
    let disc = b.mul(b).sub(&Number::from_i64(4).mul(a).mul(c));
    let two_a = Number::from_i64(2).mul(a);
    let inv = match two_a.recip() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let sq = make_pow(Expr::Number(disc), Expr::rational(1, 2));
    [-1, 1]
        .iter()
        .map(|s| {
            make_mul(vec![
                Expr::Number(inv.clone()),
                make_add(vec![
                    Expr::Number(b.neg()),
                    make_mul(vec![Expr::int(*s), sq.clone()]),
                ]),
            ])
        })
        .collect()
}

// ========== Numeric roots ==========

type Complex = (f64, f64);

fn cmul(a: Complex, b: Complex) -> Complex {
    (a.0 * b.0 - a.1 * b.1, a.0 * b.1 + a.1 * b.0)
}

fn csub(a: Complex, b: Complex) -> Complex {
    (a.0 - b.0, a.1 - b.1)
}

fn cdiv(a: Complex, b: Complex) -> Complex {
    let d = b.0 * b.0 + b.1 * b.1;
    ((a.0 * b.0 + a.1 * b.1) / d, (a.1 * b.0 - a.0 * b.1) / d)
}

/// All roots by simultaneous Durand–Kerner iteration
fn numeric_roots(p: &Poly) -> Vec<Expr> {
    let n = p.degree();
    let lc = match p.lc().to_f64() {
        Some(v) if v != 0.0 => v,
        _ => return Vec::new(),
    };
    let mut monic = Vec::with_capacity(n + 1);
    for c in p.coeffs() {
        match c.to_f64() {
            Some(v) => monic.push(v / lc),
            None => return Vec::new(),
        }
    }
    let eval = |z: Complex| -> Complex {
        monic
            .iter()
            .rev()
            .fold((0.0, 0.0), |acc, c| {
                let m = cmul(acc, z);
                (m.0 + c, m.1)
            })
    };

    let mut z: Vec<Complex> = Vec::with_capacity(n);
    let mut w: Complex = (1.0, 0.0);
    for _ in 0..n {
        z.push(w);
        w = cmul(w, (0.4, 0.9));
    }
    for _ in 0..MAX_ITERATIONS {
        let mut largest = 0.0_f64;
        for i in 0..n {
            let mut den = (1.0, 0.0);
            for j in 0..n {
                if i != j {
                    den = cmul(den, csub(z[i], z[j]));
                }
            }
            let step = cdiv(eval(z[i]), den);
            z[i] = csub(z[i], step);
            largest = largest.max(step.0.hypot(step.1));
        }
        if largest < 1e-14 {
            break;
        }
    }
    if z.iter().any(|c| !c.0.is_finite() || !c.1.is_finite()) {
        tracing::warn!(degree = n, "root iteration diverged");
        return Vec::new();
    }
    z.into_iter().map(complex_expr).collect()
}

fn complex_expr((re, im): Complex) -> Expr {
    let clean = |v: f64| if v.abs() < 1e-12 { 0.0 } else { v };
    let (re, im) = (clean(re), clean(im));
    let real = Expr::Number(Number::from_f64(re));
    if im.abs() < 1e-10 * re.abs().max(1.0) {
        return real;
    }
    make_add(vec![
        real,
        make_mul(vec![Expr::Number(Number::from_f64(im)), Expr::imaginary()]),
    ])
}

fn real_value(e: &Expr) -> Option<f64> {
    evaluate(e, &HashMap::new()).ok().filter(|v| v.is_finite())
}

fn root_order(a: &Expr, b: &Expr) -> Ordering {
    match (real_value(a), real_value(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_string().cmp(&b.to_string()),
    }
}

// ========== Symbolic coefficients ==========

/// Linear or quadratic in `var` with coefficients in other symbols
fn solve_collected(num: &Expr, var: &str) -> Option<Vec<Expr>> {
    let mut c = collect_in(num, var)?;
    while c.last().is_some_and(|x| x.is_zero()) {
        c.pop();
    }
    match c.len() {
        2 => Some(vec![simplify(&make_mul(vec![
            Expr::int(-1),
            c[0].clone(),
            make_pow(c[1].clone(), Expr::int(-1)),
        ]))]),
        3 => {
            let (a, b, c0) = (&c[2], &c[1], &c[0]);
            let disc = simplify(&make_add(vec![
                make_pow(b.clone(), Expr::int(2)),
                make_mul(vec![Expr::int(-4), a.clone(), c0.clone()]),
            ]));
            let sq = make_pow(disc, Expr::rational(1, 2));
            let inv = make_pow(make_mul(vec![Expr::int(2), a.clone()]), Expr::int(-1));
            let neg_b = make_mul(vec![Expr::int(-1), b.clone()]);
            Some(
                [-1, 1]
                    .iter()
                    .map(|s| {
                        simplify(&make_mul(vec![
                            make_add(vec![neg_b.clone(), make_mul(vec![Expr::int(*s), sq.clone()])]),
                            inv.clone(),
                        ]))
                    })
                    .collect(),
            )
        }
        _ => None,
    }
}

// ========== Isolation ==========

fn unsolvable(lhs: &Expr, rhs: &Expr, var: &str) -> SigmaError {
    SigmaError::unsupported(format!("cannot solve {} = {} for {}", lhs, rhs, var))
        .with_suggestion("Equations must be polynomial or invert through a single function")
}

/// Undo the outermost operation around the single occurrence of `var`
fn isolate(lhs: &Expr, rhs: &Expr, var: &str, depth: usize) -> Result<Vec<Expr>, SigmaError> {
    if depth > MAX_ISOLATE_DEPTH {
        return Err(unsolvable(lhs, rhs, var));
    }
    if lhs.is_symbol(var) {
        return Ok(vec![canonical(rhs)]);
    }

    match lhs {
        Expr::Add(terms) => {
            let (dep, indep): (Vec<&Expr>, Vec<&Expr>) = terms.iter().partition(|t| t.contains_symbol(var));
            if dep.len() == 1 {
                let mut moved = vec![rhs.clone()];
                moved.extend(indep.iter().map(|t| make_mul(vec![Expr::int(-1), (*t).clone()])));
                return isolate(dep[0], &make_add(moved), var, depth + 1);
            }
        }
        Expr::Mul(factors) => {
            let (dep, indep): (Vec<&Expr>, Vec<&Expr>) = factors.iter().partition(|f| f.contains_symbol(var));
            if dep.len() == 1 {
                let k = make_mul(indep.into_iter().cloned().collect());
                let moved = make_mul(vec![rhs.clone(), make_pow(k, Expr::int(-1))]);
                return isolate(dep[0], &moved, var, depth + 1);
            }
            if rhs.is_zero() {
                // zero product: solve each factor on its own
                let mut out = Vec::new();
                let mut solved_any = false;
                for f in dep {
                    if let Ok(r) = solve(f, var) {
                        solved_any = true;
                        out.extend(r);
                    }
                }
                if solved_any {
                    return Ok(out);
                }
            }
        }
        Expr::Pow(b, k) if !k.contains_symbol(var) => {
            if rhs.is_zero() && k.as_number().is_some_and(|n| n.is_positive()) {
                return isolate(b, rhs, var, depth + 1);
            }
            let even = k
                .as_number()
                .filter(|n| n.is_exact_integer())
                .and_then(|n| n.to_i64())
                .is_some_and(|n| n % 2 == 0);
            let root = make_pow(rhs.clone(), make_pow(k.as_ref().clone(), Expr::int(-1)));
            let branches = if even {
                vec![make_mul(vec![Expr::int(-1), root.clone()]), root]
            } else {
                vec![root]
            };
            return isolate_each(b, branches, var, depth);
        }
        Expr::Pow(b, k) if !b.contains_symbol(var) => {
            let target = make_mul(vec![
                make_func(Function::Ln, rhs.clone()),
                make_pow(make_func(Function::Ln, b.as_ref().clone()), Expr::int(-1)),
            ]);
            return isolate(k, &target, var, depth + 1);
        }
        Expr::Func(f, u) => {
            let r = rhs.clone();
            let candidates = match f {
                Function::Exp => {
                    if r.as_number().is_some_and(|n| !n.is_positive()) {
                        return Ok(Vec::new());
                    }
                    vec![make_func(Function::Ln, r)]
                }
                Function::Ln => vec![make_func(Function::Exp, r)],
                Function::Sin => {
                    let a = make_func(Function::Asin, r);
                    vec![a.clone(), make_add(vec![Expr::pi(), make_mul(vec![Expr::int(-1), a])])]
                }
                Function::Cos => {
                    let a = make_func(Function::Acos, r);
                    vec![
                        a.clone(),
                        make_add(vec![
                            make_mul(vec![Expr::int(2), Expr::pi()]),
                            make_mul(vec![Expr::int(-1), a]),
                        ]),
                    ]
                }
                Function::Tan => vec![make_func(Function::Atan, r)],
                Function::Asin => vec![make_func(Function::Sin, r)],
                Function::Acos => vec![make_func(Function::Cos, r)],
                Function::Atan => vec![make_func(Function::Tan, r)],
                Function::Abs => {
                    if r.as_number().is_some_and(|n| n.is_negative()) {
                        return Ok(Vec::new());
                    }
                    vec![make_mul(vec![Expr::int(-1), r.clone()]), r]
                }
                _ => return Err(unsolvable(lhs, rhs, var)),
            };
            return isolate_each(u, candidates, var, depth);
        }
        _ => {}
    }
    Err(unsolvable(lhs, rhs, var))
}

fn isolate_each(lhs: &Expr, targets: Vec<Expr>, var: &str, depth: usize) -> Result<Vec<Expr>, SigmaError> {
    let mut out = Vec::new();
    let mut seen: Vec<Expr> = Vec::new();
    for t in targets {
        if seen.contains(&t) {
            continue;
        }
        out.extend(isolate(lhs, &t, var, depth + 1)?);
        seen.push(t);
    }
    Ok(out)
}

/// Reject candidates that do not satisfy `f = 0` numerically; anything that
/// cannot be evaluated is kept
fn satisfies(f: &Expr, var: &str, root: &Expr) -> bool {
    let Some(x) = real_value(root) else {
        return true;
    };
    match evaluate_at(f, var, x) {
        Some(v) if v.is_finite() => v.abs() <= RESIDUAL_TOLERANCE * x.abs().max(1.0),
        Some(_) => false,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_equation, parse_infix, ParseContext};

    fn roots(text: &str) -> Vec<String> {
        let eq = parse_equation(text, &ParseContext::default()).unwrap();
        solve(&eq, "x").unwrap().iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_quadratic_rational() {
        assert_eq!(roots("x^2 + 3x - 4 = 0"), vec!["-4", "1"]);
    }

    #[test]
    fn test_linear() {
        assert_eq!(roots("2x + 3 = 7"), vec!["2"]);
        assert_eq!(roots("1/x = 2"), vec!["1/2"]);
    }

    #[test]
    fn test_quadratic_irrational_and_complex() {
        assert_eq!(roots("x^2 = 2"), vec!["-sqrt(2)", "sqrt(2)"]);
        assert_eq!(roots("x^2 + 1 = 0"), vec!["-I", "I"]);
    }

    #[test]
    fn test_repeated_root_reported_once() {
        assert_eq!(roots("x^2 - 2x + 1 = 0"), vec!["1"]);
    }

    #[test]
    fn test_cubic_mixes_rational_and_radical() {
        // (x - 1)(x^2 - 3)
        assert_eq!(roots("x^3 - x^2 - 3x + 3 = 0"), vec!["-sqrt(3)", "1", "sqrt(3)"]);
    }

    #[test]
    fn test_numeric_fallback() {
        let p = Poly::from_expr(&canonical(&parse_infix("x^5 - x - 1").unwrap()), "x").unwrap();
        let rs = polynomial_roots(&p);
        assert_eq!(rs.len(), 5);
        let real = real_value(&rs[0].0).unwrap();
        assert!((real - 1.1673039782614187).abs() < 1e-9);
    }

    #[test]
    fn test_isolation() {
        let ln2 = make_func(Function::Ln, Expr::int(2)).to_string();
        assert_eq!(roots("exp(x) = 2"), vec![ln2]);
        assert_eq!(roots("sqrt(x) = 3"), vec!["9"]);
        assert_eq!(roots("sin(x) = 0"), vec!["0", "pi"]);
    }

    #[test]
    fn test_extraneous_root_rejected() {
        assert!(roots("sqrt(x) = -2").is_empty());
    }

    #[test]
    fn test_symbolic_coefficients() {
        let eq = parse_equation("a*x + b = 0", &ParseContext::default()).unwrap();
        let r = solve(&eq, "x").unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].free_symbols().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_identity_and_contradiction() {
        let eq = parse_equation("x + 1 = x + 1", &ParseContext::default()).unwrap();
        assert!(solve(&eq, "x").is_err());
        assert!(roots("x + 1 = x + 2").is_empty());
    }

    #[test]
    fn test_pole_excluded() {
        // (x^2 - 1)/(x - 1) = 0 has no root at x = 1
        assert_eq!(roots("(x^2 - 1)/(x - 1) = 0"), vec!["-1"]);
    }
}
