//! Heuristic symbolic integration
//!
//! Linearity, a table of standard forms with linear inner arguments, rational
//! functions by partial fractions, substitution and integration by parts.
//! Integrals outside these rules are reported as unsupported rather than
//! approximated.

use crate::ast::{Direction, Expr, Function};
use crate::diff::differentiate;
use crate::eval::evaluate;
use crate::expand::expand;
use crate::limit::{infinity_sign, limit, signed_infinity};
use crate::poly::{as_numer_denom, collect_in, Poly};
use crate::simplify::{canonical, make_add, make_func, make_mul, make_pow, simplify};
use crate::solve::solve;
use sigma_core::{Number, SigmaError};
use std::collections::HashMap;

/// Nesting of substitution / parts / expansion attempts
const MAX_DEPTH: usize = 8;

/// Placeholder symbol for u-substitution
const SUBSTITUTE: &str = "_u";

/// Antiderivative without the constant of integration
pub fn integrate(e: &Expr, var: &str) -> Result<Expr, SigmaError> {
    let e = canonical(e);
    match integ(&e, var, 0) {
        Some(r) => Ok(canonical(&r)),
        None => Err(SigmaError::unsupported(format!(
            "no closed form found for the integral of {} d{}",
            e, var
        ))
        .with_suggestion("Try splitting the integrand or substituting manually")),
    }
}

/// `F(upper) - F(lower)`, taking one-sided limits at infinite or singular bounds.
///
/// An integrand that blows up strictly between the bounds is integrated piece
/// by piece around each singular point. Pieces that all diverge the same way
/// give that infinity; any other divergence is an error.
pub fn integrate_definite(e: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, SigmaError> {
    let anti = integrate(e, var)?;
    let poles = interior_poles(&canonical(e), var, lower, upper)?;
    if poles.is_empty() {
        return between(&anti, var, lower, upper);
    }
    tracing::debug!(count = poles.len(), "integrand singular between the bounds");

    let mut cuts = Vec::with_capacity(poles.len() + 2);
    cuts.push(lower.clone());
    cuts.extend(poles.iter().cloned());
    cuts.push(upper.clone());

    let mut finite = Vec::new();
    let mut signs = Vec::new();
    for w in cuts.windows(2) {
        match between(&anti, var, &w[0], &w[1]).ok().as_ref().and_then(piece_value) {
            Some(Piece::Finite(v)) => finite.push(v),
            Some(Piece::Infinite(sign)) => signs.push(sign),
            None => return Err(divergent(var, &poles)),
        }
    }
    match signs.first() {
        None => Ok(simplify(&make_add(finite))),
        Some(&sign) if signs.iter().all(|s| *s == sign) => Ok(signed_infinity(sign)),
        Some(_) => Err(divergent(var, &poles)),
    }
}

/// `F(b) - F(a)`, approaching each bound from inside the interval
fn between(anti: &Expr, var: &str, a: &Expr, b: &Expr) -> Result<Expr, SigmaError> {
    let ascending = match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x <= y,
        _ => true,
    };
    let (into_a, into_b) = if ascending {
        (Direction::Plus, Direction::Minus)
    } else {
        (Direction::Minus, Direction::Plus)
    };
    let at = |p: &Expr, dir: Direction| -> Result<Expr, SigmaError> {
        if !p.is_infinite() {
            let direct = canonical(&anti.substitute(var, p));
            if !direct.has_singularity() {
                return Ok(direct);
            }
        }
        limit(anti, var, p, dir)
    };
    let hi = at(b, into_b)?;
    let lo = at(a, into_a)?;
    Ok(simplify(&make_add(vec![hi, neg(lo)])))
}

fn divergent(var: &str, poles: &[Expr]) -> SigmaError {
    let at: Vec<String> = poles.iter().map(|p| format!("{} = {}", var, p)).collect();
    SigmaError::computation("the integral diverges")
        .with_note(format!("integrand unbounded at {}", at.join(", ")))
        .with_suggestion("Split the interval at the singular points")
}

enum Piece {
    Finite(Expr),
    Infinite(i32),
}

/// A piece of an improper integral: a real number or a signed infinity
fn piece_value(v: &Expr) -> Option<Piece> {
    if let Some(sign) = infinity_sign(v) {
        return Some(Piece::Infinite(sign));
    }
    if v.has_singularity() {
        return None;
    }
    numeric(v).filter(|x| x.is_finite()).map(|_| Piece::Finite(v.clone()))
}

fn numeric(e: &Expr) -> Option<f64> {
    evaluate(e, &HashMap::new()).ok().filter(|x| !x.is_nan())
}

// ========== Interior singularities ==========

/// Most singular points split around before giving up
const MAX_POLES: usize = 64;

/// Points strictly between the bounds where the integrand is unbounded,
/// ordered from `lower` to `upper`. Empty when a bound is not numeric.
fn interior_poles(e: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Result<Vec<Expr>, SigmaError> {
    let (Some(a), Some(b)) = (numeric(lower), numeric(upper)) else {
        return Ok(Vec::new());
    };
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut points = Vec::new();
    collect_poles(e, var, lo, hi, &mut points)?;
    points.sort_by(|x, y| x.0.total_cmp(&y.0));
    points.dedup_by(|x, y| (x.0 - y.0).abs() < 1e-9);
    if points.len() > MAX_POLES {
        return Err(SigmaError::computation("the integrand has too many singular points between the bounds"));
    }
    if a > b {
        points.reverse();
    }
    Ok(points.into_iter().map(|(_, p)| p).collect())
}

fn collect_poles(e: &Expr, var: &str, lo: f64, hi: f64, out: &mut Vec<(f64, Expr)>) -> Result<(), SigmaError> {
    for c in e.children() {
        collect_poles(c, var, lo, hi, out)?;
    }
    match e {
        Expr::Pow(b, k) if b.contains_symbol(var) && k.as_number().is_some_and(|n| n.is_negative()) => {
            zeros_between(b, var, lo, hi, out);
        }
        Expr::Func(Function::Ln, arg) => zeros_between(arg, var, lo, hi, out),
        Expr::Func(Function::Tan | Function::Sec, arg) => periodic_between(arg, var, true, lo, hi, out)?,
        Expr::Func(Function::Cot | Function::Csc, arg) => periodic_between(arg, var, false, lo, hi, out)?,
        _ => {}
    }
    Ok(())
}

fn inside(x: f64, lo: f64, hi: f64) -> bool {
    x.is_finite() && x > lo + 1e-12 && x < hi - 1e-12
}

/// Real zeros of `f` strictly inside `(lo, hi)`
fn zeros_between(f: &Expr, var: &str, lo: f64, hi: f64, out: &mut Vec<(f64, Expr)>) {
    let roots = match solve(&Expr::equation(f.clone(), Expr::int(0)), var) {
        Ok(roots) => roots,
        Err(err) => {
            tracing::debug!(error = %err.message, "singular points not located");
            return;
        }
    };
    for r in roots {
        if let Some(x) = numeric(&r).filter(|x| inside(*x, lo, hi)) {
            out.push((x, r));
        }
    }
}

/// Points where `cos(u)` (`half_turn`) or `sin(u)` vanishes, for `u` linear in `var`
fn periodic_between(
    u: &Expr,
    var: &str,
    half_turn: bool,
    lo: f64,
    hi: f64,
    out: &mut Vec<(f64, Expr)>,
) -> Result<(), SigmaError> {
    let Some(c) = collect_in(&expand(u), var) else {
        return Ok(());
    };
    if c.len() != 2 {
        return Ok(());
    }
    let (Some(b), Some(a)) = (numeric(&c[0]), numeric(&c[1])) else {
        return Ok(());
    };
    if a == 0.0 {
        return Ok(());
    }
    let offset = if half_turn { 0.5 } else { 0.0 };
    let (u_lo, u_hi) = {
        let (p, q) = (a * lo + b, a * hi + b);
        (p.min(q), p.max(q))
    };
    let k_lo = (u_lo / std::f64::consts::PI - offset).ceil();
    let k_hi = (u_hi / std::f64::consts::PI - offset).floor();
    if !k_lo.is_finite() || !k_hi.is_finite() || k_hi - k_lo >= MAX_POLES as f64 {
        return Err(SigmaError::computation("the integrand has too many singular points between the bounds"));
    }
    let mut k = k_lo as i64;
    while k as f64 <= k_hi {
        let (num, den) = if half_turn { (2 * k + 1, 2) } else { (k, 1) };
        let target = Expr::mul(vec![Expr::rational(num, den), Expr::pi()]);
        let point = canonical(&Expr::div(Expr::sub(target, c[0].clone()), c[1].clone()));
        if let Some(x) = numeric(&point).filter(|x| inside(*x, lo, hi)) {
            out.push((x, point));
        }
        k += 1;
    }
    Ok(())
}

fn neg(e: Expr) -> Expr {
    make_mul(vec![Expr::int(-1), e])
}

fn recip(e: Expr) -> Expr {
    make_pow(e, Expr::int(-1))
}

fn ln(e: Expr) -> Expr {
    make_func(Function::Ln, e)
}

fn integ(e: &Expr, var: &str, depth: usize) -> Option<Expr> {
    if depth > MAX_DEPTH {
        return None;
    }
    if !e.contains_symbol(var) {
        return Some(make_mul(vec![e.clone(), Expr::sym(var)]));
    }
    match e {
        Expr::Add(terms) => {
            let mut parts = Vec::with_capacity(terms.len());
            for t in terms {
                parts.push(integ(t, var, depth)?);
            }
            return Some(make_add(parts));
        }
        Expr::Mul(factors) => {
            let (dep, indep): (Vec<Expr>, Vec<Expr>) = factors.iter().cloned().partition(|f| f.contains_symbol(var));
            if !indep.is_empty() {
                let inner = integ(&make_mul(dep), var, depth)?;
                let mut all = indep;
                all.push(inner);
                return Some(make_mul(all));
            }
        }
        _ => {}
    }

    standard_form(e, var)
        .or_else(|| rational(e, var))
        .or_else(|| substitution(e, var, depth))
        .or_else(|| by_parts(e, var, depth))
        .or_else(|| {
            let expanded = expand(e);
            if expanded != *e {
                integ(&expanded, var, depth + 1)
            } else {
                None
            }
        })
}

/// `a` when `u = a*x + b` with `a, b` free of `x`
fn slope(u: &Expr, var: &str) -> Option<Expr> {
    let c = collect_in(&expand(u), var)?;
    if c.len() != 2 || c[1].is_zero() {
        return None;
    }
    Some(c[1].clone())
}

// ========== Table of standard forms ==========

fn standard_form(e: &Expr, var: &str) -> Option<Expr> {
    let x = Expr::sym(var);
    match e {
        Expr::Symbol(_) => Some(make_mul(vec![Expr::rational(1, 2), make_pow(x, Expr::int(2))])),
        Expr::Pow(b, k) if !k.contains_symbol(var) => {
            if let Some(a) = slope(b, var) {
                if k.as_number().is_some_and(|n| *n == Number::from_i64(-1)) {
                    return Some(make_mul(vec![recip(a), ln(b.as_ref().clone())]));
                }
                let k1 = make_add(vec![k.as_ref().clone(), Expr::int(1)]);
                return Some(make_mul(vec![
                    recip(make_mul(vec![a, k1.clone()])),
                    make_pow(b.as_ref().clone(), k1),
                ]));
            }
            trig_square(b, k, var).or_else(|| inverse_root(b, k, var))
        }
        Expr::Pow(b, k) if !b.contains_symbol(var) => {
            let a = slope(k, var)?;
            Some(make_mul(vec![e.clone(), recip(make_mul(vec![a, ln(b.as_ref().clone())]))]))
        }
        Expr::Func(f, u) => {
            let a = slope(u, var)?;
            let u = u.as_ref().clone();
            let sqrt_1mu2 = || {
                make_pow(
                    make_add(vec![Expr::int(1), neg(make_pow(u.clone(), Expr::int(2)))]),
                    Expr::rational(1, 2),
                )
            };
            let anti = match f {
                Function::Sin => neg(make_func(Function::Cos, u)),
                Function::Cos => make_func(Function::Sin, u),
                Function::Tan => neg(ln(make_func(Function::Cos, u))),
                Function::Cot => ln(make_func(Function::Sin, u)),
                Function::Sec => ln(make_add(vec![
                    make_func(Function::Sec, u.clone()),
                    make_func(Function::Tan, u),
                ])),
                Function::Csc => neg(ln(make_add(vec![
                    make_func(Function::Csc, u.clone()),
                    make_func(Function::Cot, u),
                ]))),
                Function::Exp => make_func(Function::Exp, u),
                Function::Ln => make_add(vec![make_mul(vec![u.clone(), ln(u.clone())]), neg(u)]),
                Function::Sinh => make_func(Function::Cosh, u),
                Function::Cosh => make_func(Function::Sinh, u),
                Function::Tanh => ln(make_func(Function::Cosh, u)),
                Function::Asin => make_add(vec![
                    make_mul(vec![u.clone(), make_func(Function::Asin, u.clone())]),
                    sqrt_1mu2(),
                ]),
                Function::Acos => make_add(vec![
                    make_mul(vec![u.clone(), make_func(Function::Acos, u.clone())]),
                    neg(sqrt_1mu2()),
                ]),
                Function::Atan => make_add(vec![
                    make_mul(vec![u.clone(), make_func(Function::Atan, u.clone())]),
                    make_mul(vec![
                        Expr::rational(-1, 2),
                        ln(make_add(vec![make_pow(u, Expr::int(2)), Expr::int(1)])),
                    ]),
                ]),
                Function::Abs => make_mul(vec![Expr::rational(1, 2), u.clone(), make_func(Function::Abs, u)]),
            };
            Some(make_mul(vec![recip(a), anti]))
        }
        _ => None,
    }
}

/// `sin(u)^2`, `cos(u)^2`, `tan(u)^2`, `sec(u)^2`, `csc(u)^2`
fn trig_square(b: &Expr, k: &Expr, var: &str) -> Option<Expr> {
    if k.as_number() != Some(&Number::from_i64(2)) {
        return None;
    }
    let (f, u) = match b {
        Expr::Func(f, u) => (*f, u.as_ref()),
        _ => return None,
    };
    let a = slope(u, var)?;
    let x = Expr::sym(var);
    let half_x = make_mul(vec![Expr::rational(1, 2), x.clone()]);
    let sin_2u = make_func(Function::Sin, make_mul(vec![Expr::int(2), u.clone()]));
    let quarter = |sign: i64| make_mul(vec![Expr::rational(sign, 4), recip(a.clone()), sin_2u.clone()]);
    Some(match f {
        Function::Sin => make_add(vec![half_x, quarter(-1)]),
        Function::Cos => make_add(vec![half_x, quarter(1)]),
        Function::Sec => make_mul(vec![recip(a), make_func(Function::Tan, u.clone())]),
        Function::Csc => neg(make_mul(vec![recip(a), make_func(Function::Cot, u.clone())])),
        Function::Tan => make_add(vec![make_mul(vec![recip(a), make_func(Function::Tan, u.clone())]), neg(x)]),
        _ => return None,
    })
}

/// `1/sqrt(c - a*x^2)` and `1/sqrt(a*x^2 + c)`
fn inverse_root(b: &Expr, k: &Expr, var: &str) -> Option<Expr> {
    if k.as_number() != Some(&Number::from_ratio(-1, 2)) {
        return None;
    }
    let p = Poly::from_expr(&expand(b), var)?;
    if p.degree() != 2 || !p.coeff(1).is_zero() {
        return None;
    }
    let (a, c) = (p.coeff(2), p.coeff(0));
    let x = Expr::sym(var);
    let sqrt = |n: Number| make_pow(Expr::Number(n), Expr::rational(1, 2));
    if a.is_negative() && c.is_positive() {
        let a = a.neg();
        let ratio = a.checked_div(&c).ok()?;
        return Some(make_mul(vec![
            recip(sqrt(a)),
            make_func(Function::Asin, make_mul(vec![x, sqrt(ratio)])),
        ]));
    }
    if a.is_positive() && !c.is_zero() {
        return Some(make_mul(vec![
            recip(sqrt(a.clone())),
            ln(make_add(vec![
                make_mul(vec![sqrt(a), x]),
                make_pow(b.clone(), Expr::rational(1, 2)),
            ])),
        ]));
    }
    None
}

// ========== Rational functions ==========

fn poly_integral(q: &Poly, var: &str) -> Expr {
    let mut coeffs = vec![Number::zero()];
    for (k, c) in q.coeffs().iter().enumerate() {
        coeffs.push(c.checked_div(&Number::from_i64(k as i64 + 1)).unwrap_or_else(|_| Number::zero()));
    }
    Poly::new(coeffs).to_expr(var)
}

fn rational(e: &Expr, var: &str) -> Option<Expr> {
    let (num, den) = as_numer_denom(e);
    let pd = Poly::from_expr(&expand(&den), var)?;
    if pd.degree() == 0 {
        return None;
    }
    let pn = Poly::from_expr(&expand(&num), var)?;
    if pn.coeffs().iter().chain(pd.coeffs()).any(|c| !c.is_exact()) {
        return None;
    }
    let (q, r) = pn.div_rem(&pd)?;
    let mut parts = vec![poly_integral(&q, var)];
    if !r.is_zero() {
        let (roots, rest) = pd.rational_roots();
        if rest.degree() == 0 {
            parts.extend(partial_fractions(&r, &pd, &roots, var)?);
        } else if roots.is_empty() && rest.degree() == 2 {
            parts.push(quadratic_denominator(&r, &pd, var)?);
        } else {
            return None;
        }
    }
    Some(make_add(parts))
}

/// `r/d` where `d` splits into rational linear factors
fn partial_fractions(r: &Poly, d: &Poly, roots: &[(Number, usize)], var: &str) -> Option<Vec<Expr>> {
    let mut terms = Vec::new();
    for (root, m) in roots {
        let linear = Poly::linear_factor(root);
        let mut power = Poly::constant(Number::one());
        for _ in 0..*m {
            power = power.mul(&linear);
        }
        let (other, _) = d.div_rem(&power)?;

        // coefficient of 1/(x - root)^(m - l) is g^(l)(root) / l! with g = r/other
        let (mut gn, mut gd) = (r.clone(), other);
        let mut fact = Number::one();
        for l in 0..*m {
            if l > 0 {
                let next_n = gn.derivative().mul(&gd).sub(&gn.mul(&gd.derivative()));
                gd = gd.mul(&gd);
                gn = next_n;
                fact = fact.mul(&Number::from_i64(l as i64));
            }
            let value = gn.eval(root).checked_div(&gd.eval(root).mul(&fact)).ok()?;
            if value.is_zero() {
                continue;
            }
            let j = (*m - l) as i64;
            let lin = linear.to_expr(var);
            terms.push(if j == 1 {
                make_mul(vec![Expr::Number(value), ln(lin)])
            } else {
                let c = value.checked_div(&Number::from_i64(1 - j)).ok()?;
                make_mul(vec![Expr::Number(c), make_pow(lin, Expr::int(1 - j))])
            });
        }
    }
    Some(terms)
}

/// `(p*x + s)/(a*x^2 + b*x + c)` with an irreducible denominator
fn quadratic_denominator(r: &Poly, d: &Poly, var: &str) -> Option<Expr> {
    let (a, b, c) = (d.coeff(2), d.coeff(1), d.coeff(0));
    let (p, s) = (r.coeff(1), r.coeff(0));
    let two_a = Number::from_i64(2).mul(&a);
    let x = Expr::sym(var);

    let log_coeff = p.checked_div(&two_a).ok()?;
    let rest = s.sub(&log_coeff.mul(&b));
    let disc = Number::from_i64(4).mul(&a).mul(&c).sub(&b.mul(&b));
    let linear = make_add(vec![make_mul(vec![Expr::Number(two_a), x]), Expr::Number(b)]);

    let mut parts = vec![make_mul(vec![Expr::Number(log_coeff), ln(d.to_expr(var))])];
    if !rest.is_zero() {
        if disc.is_positive() {
            let sq = make_pow(Expr::Number(disc), Expr::rational(1, 2));
            parts.push(make_mul(vec![
                Expr::Number(rest.mul(&Number::from_i64(2))),
                recip(sq.clone()),
                make_func(Function::Atan, make_mul(vec![linear, recip(sq)])),
            ]));
        } else {
            let sq = make_pow(Expr::Number(disc.neg()), Expr::rational(1, 2));
            let ratio = make_mul(vec![
                make_add(vec![linear.clone(), neg(sq.clone())]),
                recip(make_add(vec![linear, sq.clone()])),
            ]);
            parts.push(make_mul(vec![Expr::Number(rest), recip(sq), ln(ratio)]));
        }
    }
    Some(make_add(parts))
}

// ========== Substitution and parts ==========

/// Candidate inner expressions `u`, outermost first
fn kernels(e: &Expr, var: &str, out: &mut Vec<Expr>) {
    let mut push = |u: &Expr| {
        if u.contains_symbol(var) && !u.is_symbol(var) && !out.contains(u) {
            out.push(u.clone());
        }
    };
    match e {
        Expr::Func(_, u) => {
            push(e);
            push(u);
        }
        Expr::Pow(b, k) => {
            push(b);
            push(k);
        }
        _ => {}
    }
    for c in e.children() {
        kernels(c, var, out);
    }
}

fn substitution(e: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let mut candidates = Vec::new();
    kernels(e, var, &mut candidates);
    let u_sym = Expr::sym(SUBSTITUTE);
    for u in candidates {
        let du = match differentiate(&u, var) {
            Ok(du) if !du.is_zero() => du,
            _ => continue,
        };
        let q = canonical(&make_mul(vec![e.clone(), recip(du)]));
        let replaced = canonical(&q.replace(&u, &u_sym));
        if replaced.contains_symbol(var) {
            continue;
        }
        if let Some(r) = integ(&replaced, SUBSTITUTE, depth + 1) {
            tracing::trace!(u = %u, "substitution succeeded");
            return Some(canonical(&r.substitute(SUBSTITUTE, &u)));
        }
    }
    None
}

/// Lower is picked first as `u`: logarithms and inverse trig, then polynomials
fn parts_priority(f: &Expr, var: &str) -> Option<u8> {
    match f {
        Expr::Func(Function::Ln | Function::Asin | Function::Acos | Function::Atan, _) => Some(0),
        _ => Poly::from_expr(f, var).filter(|p| p.degree() >= 1).map(|_| 1),
    }
}

fn by_parts(e: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let factors: Vec<Expr> = match e {
        Expr::Mul(fs) => fs.clone(),
        other => vec![other.clone()],
    };
    let (idx, priority) = factors
        .iter()
        .enumerate()
        .filter_map(|(i, f)| parts_priority(f, var).map(|p| (i, p)))
        .min_by_key(|(_, p)| *p)?;
    let u = factors[idx].clone();
    let rest: Vec<Expr> = factors
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, f)| f.clone())
        .collect();
    if rest.is_empty() && priority > 0 {
        return None;
    }
    let dv = make_mul(rest);
    let v = integ(&dv, var, depth + 1)?;
    let du = differentiate(&u, var).ok()?;
    let remaining = integ(&canonical(&make_mul(vec![v.clone(), du])), var, depth + 1)?;
    Some(make_add(vec![make_mul(vec![u, v]), neg(remaining)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    fn int(s: &str) -> String {
        integrate(&parse_infix(s).unwrap(), "x").unwrap().to_string()
    }

    /// d/dx of the result gives back the integrand
    fn check_inverse(s: &str) {
        let e = parse_infix(s).unwrap();
        let anti = integrate(&e, "x").unwrap();
        let back = differentiate(&anti, "x").unwrap();
        let diff = simplify(&make_add(vec![back.clone(), neg(canonical(&e))]));
        if !diff.is_zero() {
            // fall back to a numeric comparison for forms simplify cannot close
            for x in [0.3, 0.7, 1.9] {
                let a = crate::eval::evaluate_at(&back, "x", x).unwrap();
                let b = crate::eval::evaluate_at(&e, "x", x).unwrap();
                assert!((a - b).abs() < 1e-9, "{}: {} vs {}", s, a, b);
            }
        }
    }

    #[test]
    fn test_power_rule() {
        assert_eq!(int("x^2"), "x^3/3");
        assert_eq!(int("3"), "3*x");
        assert_eq!(int("1/x"), "log(x)");
    }

    #[test]
    fn test_sum_rule() {
        assert_eq!(int("x^2 + 2x"), "x^3/3 + x^2");
    }

    #[test]
    fn test_standard_functions() {
        assert_eq!(int("cos(x)"), "sin(x)");
        assert_eq!(int("sin(2x)"), "-cos(2*x)/2");
        assert_eq!(int("exp(x)"), "exp(x)");
    }

    #[test]
    fn test_rational_functions() {
        assert_eq!(int("1/(x^2 + 1)"), "atan(x)");
        check_inverse("1/(x^2 - 1)");
        check_inverse("(2x + 3)/(x^2 + 3x + 2)");
        check_inverse("1/(x - 1)^2");
    }

    #[test]
    fn test_substitution() {
        check_inverse("x*cos(x^2)");
        check_inverse("sin(x)*cos(x)");
        check_inverse("log(x)/x");
    }

    #[test]
    fn test_by_parts() {
        check_inverse("x*exp(x)");
        check_inverse("x*log(x)");
        check_inverse("x^2*sin(x)");
    }

    #[test]
    fn test_unsupported() {
        assert!(integrate(&parse_infix("exp(x^2)").unwrap(), "x").is_err());
    }

    #[test]
    fn test_definite() {
        let e = parse_infix("x^2").unwrap();
        let r = integrate_definite(&e, "x", &Expr::int(0), &Expr::int(1)).unwrap();
        assert_eq!(r.to_string(), "1/3");
    }

    mod singular_tests {
        use super::*;

        fn definite(s: &str, lo: Expr, hi: Expr) -> Result<Expr, SigmaError> {
            integrate_definite(&parse_infix(s).unwrap(), "x", &lo, &hi)
        }

        #[test]
        fn test_pole_inside_diverges_to_infinity() {
            let r = definite("1/x^2", Expr::int(-1), Expr::int(1)).unwrap();
            assert_eq!(r, Expr::infinity());
        }

        #[test]
        fn test_odd_pole_is_an_error() {
            let err = definite("1/x", Expr::int(-1), Expr::int(1)).unwrap_err();
            assert_eq!(err.message, "the integral diverges");
            assert!(err.context.unwrap().notes[0].contains("x = 0"));
        }

        #[test]
        fn test_tangent_across_half_pi() {
            let r = definite("tan(x)", Expr::int(0), Expr::int(3));
            assert!(!matches!(r, Ok(ref v) if !v.is_infinite()), "{:?}", r);
        }

        #[test]
        fn test_poles_outside_are_ignored() {
            let r = definite("1/x^2", Expr::int(1), Expr::int(2)).unwrap();
            assert_eq!(r.to_string(), "1/2");
            let r = definite("tan(x)", Expr::int(0), Expr::int(1)).unwrap();
            assert!(!r.has_singularity());
        }

        #[test]
        fn test_reversed_bounds() {
            let r = definite("1/x^2", Expr::int(1), Expr::int(-1)).unwrap();
            assert_eq!(r, Expr::neg_infinity());
        }
    }

    #[test]
    fn test_improper() {
        let e = parse_infix("1/x^2").unwrap();
        let r = integrate_definite(&e, "x", &Expr::int(1), &Expr::infinity()).unwrap();
        assert_eq!(r.to_string(), "1");
    }
}
