//! Limits
//!
//! Direct substitution first, then rational cancellation, degree comparison
//! at infinity and L'Hôpital's rule on indeterminate forms. A numeric sampling
//! settles what the symbolic rules leave open, or reports that the limit
//! could not be determined.

use crate::ast::{Constant, Direction, Expr, Function};
use crate::diff::differentiate;
use crate::eval::{evaluate, evaluate_at};
use crate::poly::{as_numer_denom, Poly};
use crate::simplify::{cancel_rational, canonical, make_add, make_func, make_mul, make_pow};
use sigma_core::{Number, SigmaError};
use std::collections::HashMap;

/// Nested applications of L'Hôpital's rule and friends
const MAX_DEPTH: usize = 10;

/// Limit of `e` as `var` approaches `point` from `dir`.
///
/// `Direction::Both` at a finite point requires both one-sided limits to
/// agree; at an infinite point the direction is irrelevant.
pub fn limit(e: &Expr, var: &str, point: &Expr, dir: Direction) -> Result<Expr, SigmaError> {
    let e = canonical(e);
    let point = canonical(point);
    if dir == Direction::Both && !point.is_infinite() {
        let plus = lim(&e, var, &point, Direction::Plus, 0)?;
        let minus = lim(&e, var, &point, Direction::Minus, 0)?;
        if plus == minus {
            return Ok(plus);
        }
        return Err(SigmaError::computation(format!(
            "The limit does not exist: the one-sided limits are {} and {}",
            minus, plus
        )));
    }
    lim(&e, var, &point, dir, 0)
}

fn cannot(e: &Expr, var: &str, point: &Expr) -> SigmaError {
    SigmaError::computation(format!(
        "could not determine the limit of {} as {} -> {}",
        e, var, point
    ))
}

pub(crate) fn infinity_sign(e: &Expr) -> Option<i32> {
    match e {
        Expr::Constant(Constant::Infinity) => Some(1),
        Expr::Mul(fs) if e.is_infinite() => fs[0].as_number().map(|n| n.signum()),
        _ => None,
    }
}

pub(crate) fn signed_infinity(sign: i32) -> Expr {
    if sign < 0 {
        Expr::neg_infinity()
    } else {
        Expr::infinity()
    }
}

/// A finite value or a signed infinity, as opposed to `nan` or `sin(oo)`
fn determinate(e: &Expr) -> bool {
    !e.has_singularity() || e.is_infinite()
}

fn lim(e: &Expr, var: &str, point: &Expr, dir: Direction, depth: usize) -> Result<Expr, SigmaError> {
    if !e.contains_symbol(var) {
        return Ok(e.clone());
    }
    if depth > MAX_DEPTH {
        return Err(cannot(e, var, point));
    }

    let direct = canonical(&e.substitute(var, point));
    if determinate(&direct) {
        return Ok(direct);
    }
    if let Some(sign) = infinity_sign(point) {
        return at_infinity(e, var, sign, depth);
    }

    let cancelled = cancel_rational(e);
    if cancelled != *e {
        let v = canonical(&cancelled.substitute(var, point));
        if determinate(&v) {
            return Ok(v);
        }
    }
    match indeterminate(e, var, point, dir, depth) {
        Ok(Some(v)) => return Ok(v),
        Ok(None) => {}
        Err(err) => tracing::trace!(error = %err, "symbolic limit rules gave up"),
    }
    numeric(e, var, point, dir)
}

fn at_infinity(e: &Expr, var: &str, sign: i32, depth: usize) -> Result<Expr, SigmaError> {
    // rational functions: compare degrees
    let (n, d) = as_numer_denom(e);
    if let (Some(pn), Some(pd)) = (Poly::from_expr(&n, var), Poly::from_expr(&d, var)) {
        if !pd.is_zero() && pn.coeffs().iter().chain(pd.coeffs()).all(|c| c.is_exact()) {
            let (dn, dd) = (pn.degree(), pd.degree());
            if pn.is_zero() || dn < dd {
                return Ok(Expr::int(0));
            }
            let ratio = pn.lc().checked_div(&pd.lc())?;
            if dn == dd {
                return Ok(Expr::Number(ratio));
            }
            let parity = if sign < 0 && (dn - dd) % 2 == 1 { -1 } else { 1 };
            return Ok(signed_infinity(ratio.signum() * parity));
        }
    }

    // x = ±1/t with t -> 0+
    let t = format!("_t{}", depth);
    let inv = make_mul(vec![Expr::int(i64::from(sign)), make_pow(Expr::sym(&t), Expr::int(-1))]);
    let flipped = canonical(&e.substitute(var, &inv));
    lim(&flipped, &t, &Expr::int(0), Direction::Plus, depth + 1)
        .map_err(|_| cannot(e, var, &signed_infinity(sign)))
}

fn lhopital(n: &Expr, d: &Expr, var: &str, point: &Expr, dir: Direction, depth: usize) -> Result<Expr, SigmaError> {
    let dn = differentiate(n, var)?;
    let dd = differentiate(d, var)?;
    if dd.is_zero() {
        return Err(cannot(n, var, point));
    }
    tracing::trace!(numerator = %dn, denominator = %dd, "l'hopital");
    let q = canonical(&make_mul(vec![dn, make_pow(dd, Expr::int(-1))]));
    lim(&q, var, point, dir, depth + 1)
}

/// Symbolic rules for forms where substitution fails. `Ok(None)` when no
/// rule applies.
fn indeterminate(e: &Expr, var: &str, point: &Expr, dir: Direction, depth: usize) -> Result<Option<Expr>, SigmaError> {
    let sub = |x: &Expr| lim(x, var, point, dir, depth + 1).ok();

    let (n, d) = as_numer_denom(e);
    if d.contains_symbol(var) {
        if let (Some(ln), Some(ld)) = (sub(&n), sub(&d)) {
            let both_zero = ln.is_zero() && ld.is_zero();
            let both_infinite = ln.is_infinite() && ld.is_infinite();
            if both_zero || both_infinite {
                return lhopital(&n, &d, var, point, dir, depth).map(Some);
            }
            if !ln.has_singularity() && !ld.has_singularity() && !ld.is_zero() {
                return Ok(Some(canonical(&make_mul(vec![ln, make_pow(ld, Expr::int(-1))]))));
            }
            if ld.is_infinite() && !ln.has_singularity() {
                return Ok(Some(Expr::int(0)));
            }
            if ld.is_zero() && !ln.is_zero() {
                return numeric(e, var, point, dir).map(Some);
            }
        }
    }

    match e {
        Expr::Mul(factors) => {
            let mut zeros = Vec::new();
            let mut infinite = Vec::new();
            let mut values = Vec::new();
            for f in factors {
                let Some(v) = sub(f) else {
                    return Ok(None);
                };
                if v.is_zero() {
                    zeros.push(f.clone());
                } else if v.is_infinite() {
                    infinite.push((f.clone(), v));
                } else if !v.has_singularity() {
                    values.push(v);
                } else {
                    return Ok(None);
                }
            }
            if zeros.is_empty() || infinite.is_empty() {
                let mut all = values;
                all.extend(zeros.iter().map(|_| Expr::int(0)));
                all.extend(infinite.into_iter().map(|(_, v)| v));
                let product = canonical(&make_mul(all));
                return Ok(determinate(&product).then_some(product));
            }
            // 0 * oo  ->  oo / (1/0)
            let num = make_mul(infinite.into_iter().map(|(f, _)| f).collect());
            let den = make_pow(make_mul(zeros), Expr::int(-1));
            let rest = canonical(&make_mul(values));
            let q = lhopital(&num, &den, var, point, dir, depth)?;
            Ok(Some(canonical(&make_mul(vec![rest, q]))))
        }
        Expr::Pow(b, k) if b.contains_symbol(var) && k.contains_symbol(var) => {
            // b^k = exp(k ln b)
            let exponent = make_mul(vec![k.as_ref().clone(), make_func(Function::Ln, b.as_ref().clone())]);
            let inner = lim(&canonical(&exponent), var, point, dir, depth + 1)?;
            Ok(Some(make_func(Function::Exp, inner)))
        }
        Expr::Add(terms) => {
            let mut parts = Vec::with_capacity(terms.len());
            for t in terms {
                match sub(t) {
                    Some(v) => parts.push(v),
                    None => return Ok(None),
                }
            }
            let total = make_add(parts);
            Ok(determinate(&total).then_some(total))
        }
        Expr::Func(f, u) => {
            let Some(v) = sub(u) else {
                return Ok(None);
            };
            if !determinate(&v) {
                return Ok(None);
            }
            let out = make_func(*f, v);
            Ok(determinate(&out).then_some(out))
        }
        _ => Ok(None),
    }
}

// ========== Numeric sampling ==========

fn numeric(e: &Expr, var: &str, point: &Expr, dir: Direction) -> Result<Expr, SigmaError> {
    let p = evaluate(point, &HashMap::new()).map_err(|_| cannot(e, var, point))?;
    let s = if dir == Direction::Minus { -1.0 } else { 1.0 };
    let at = |h: f64| evaluate_at(e, var, p + s * h);

    // divergence
    let far: Vec<f64> = [1e-2, 1e-3, 1e-4].iter().filter_map(|h| at(*h)).collect();
    if far.len() == 3 {
        let (a, b, c) = (far[0], far[1], far[2]);
        let growing = c.abs() > 1e3 && c.abs() > b.abs() && b.abs() > a.abs();
        if c.is_infinite() || (growing && a.signum() == c.signum() && b.signum() == c.signum()) {
            return Ok(signed_infinity(if c > 0.0 { 1 } else { -1 }));
        }
    }

    // first-order Richardson extrapolation at two scales
    let estimate = |h: f64| -> Option<f64> { Some(2.0 * at(h / 2.0)? - at(h)?) };
    match (estimate(1e-3), estimate(1e-4)) {
        (Some(r1), Some(r2)) if r2.is_finite() && (r1 - r2).abs() <= 1e-6 * r2.abs().max(1.0) => {
            tracing::debug!(value = r2, "limit settled numerically");
            Ok(snap(r2))
        }
        _ => Err(cannot(e, var, point)),
    }
}

/// Recognize small rationals and the constants e and pi in a float
fn snap(v: f64) -> Expr {
    const TOL: f64 = 1e-7;
    for q in 1..=12i64 {
        let scaled = v * q as f64;
        if (scaled - scaled.round()).abs() < TOL * q as f64 && scaled.abs() < 1e12 {
            return Expr::Number(Number::from_ratio(scaled.round() as i64, q));
        }
    }
    if (v - std::f64::consts::E).abs() < TOL {
        return Expr::Constant(Constant::E);
    }
    if (v - std::f64::consts::PI).abs() < TOL {
        return Expr::pi();
    }
    Expr::Number(Number::from_f64(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    fn lim_at(s: &str, point: Expr, dir: Direction) -> Result<String, SigmaError> {
        limit(&parse_infix(s).unwrap(), "x", &point, dir).map(|r| r.to_string())
    }

    #[test]
    fn test_direct_substitution() {
        assert_eq!(lim_at("x^2 + 1", Expr::int(2), Direction::Plus).unwrap(), "5");
    }

    #[test]
    fn test_removable_singularity() {
        assert_eq!(lim_at("(x^2 - 1)/(x - 1)", Expr::int(1), Direction::Plus).unwrap(), "2");
    }

    #[test]
    fn test_lhopital() {
        assert_eq!(lim_at("sin(x)/x", Expr::int(0), Direction::Plus).unwrap(), "1");
        assert_eq!(lim_at("(1 - cos(x))/x^2", Expr::int(0), Direction::Both).unwrap(), "1/2");
    }

    #[test]
    fn test_zero_times_infinity() {
        assert_eq!(lim_at("x*log(x)", Expr::int(0), Direction::Plus).unwrap(), "0");
    }

    #[test]
    fn test_at_infinity() {
        assert_eq!(lim_at("(2x^2 + 1)/(x^2 + 3)", Expr::infinity(), Direction::Plus).unwrap(), "2");
        assert_eq!(lim_at("1/x", Expr::infinity(), Direction::Plus).unwrap(), "0");
        assert_eq!(lim_at("x^3", Expr::neg_infinity(), Direction::Plus).unwrap(), "-oo");
        assert_eq!(lim_at("exp(-x)", Expr::infinity(), Direction::Plus).unwrap(), "0");
    }

    #[test]
    fn test_one_to_the_infinity() {
        assert_eq!(lim_at("(1 + 1/x)^x", Expr::infinity(), Direction::Plus).unwrap(), "E");
    }

    #[test]
    fn test_one_sided() {
        assert_eq!(lim_at("1/x", Expr::int(0), Direction::Plus).unwrap(), "oo");
        assert_eq!(lim_at("1/x", Expr::int(0), Direction::Minus).unwrap(), "-oo");
        assert!(lim_at("1/x", Expr::int(0), Direction::Both).is_err());
    }
}
