//! Factorization over the rationals
//!
//! Univariate polynomials are split into linear factors for every rational
//! root; what remains stays as one primitive factor. Multivariate sums only
//! get their common numeric and monomial factors pulled out.

use crate::ast::Expr;
use crate::poly::Poly;
use crate::simplify::{base_exp, canonical, make_add, make_mul, make_pow, split_coeff};
use sigma_core::Number;

pub fn factor(e: &Expr) -> Expr {
    let e = canonical(e);
    match &e {
        Expr::Equation(l, r) => Expr::equation(factor(l), factor(r)),
        Expr::Mul(fs) => {
            let mut coeff = Number::one();
            let mut factors = Vec::new();
            for f in fs {
                match f {
                    Expr::Number(n) => coeff = coeff.mul(n),
                    Expr::Add(_) => factors.push(factor(f)),
                    other => factors.push(other.clone()),
                }
            }
            product_of(coeff, factors)
        }
        Expr::Add(_) => {
            let vars = e.free_symbols();
            if vars.len() == 1 {
                if let Some(var) = vars.iter().next() {
                    if let Some(f) = factor_univariate(&e, var) {
                        return f;
                    }
                }
            }
            factor_common(&e).unwrap_or(e)
        }
        _ => e,
    }
}

/// Product that keeps sums intact (`make_mul` would distribute a number)
fn product_of(coeff: Number, factors: Vec<Expr>) -> Expr {
    let mut coeff = coeff;
    let mut flat = Vec::new();
    for f in factors {
        match f {
            Expr::Mul(inner) => {
                for g in inner {
                    match g {
                        Expr::Number(n) => coeff = coeff.mul(&n),
                        other => flat.push(other),
                    }
                }
            }
            Expr::Number(n) => coeff = coeff.mul(&n),
            other => flat.push(other),
        }
    }
    if coeff.is_zero() {
        return Expr::int(0);
    }
    if !coeff.is_one() {
        flat.insert(0, Expr::Number(coeff));
    }
    match flat.len() {
        0 => Expr::int(1),
        1 => flat.remove(0),
        _ => Expr::Mul(flat),
    }
}

fn factor_univariate(e: &Expr, var: &str) -> Option<Expr> {
    let p = Poly::from_expr(e, var)?;
    if p.coeffs().iter().any(|c| !c.is_exact()) {
        return None;
    }
    let (content, prim) = p.primitive();
    let (roots, rest) = prim.rational_roots();

    let mut factors = Vec::new();
    let mut scale = Number::one();
    for (r, m) in &roots {
        let q = Number::from_ibig(r.denom());
        let linear = Poly::new(vec![Number::from_ibig(r.numer()).neg(), q.clone()]).to_expr(var);
        let mult = i64::try_from(*m).ok()?;
        factors.push(make_pow(linear, Expr::int(mult)));
        scale = scale.mul(&q.pow(mult).ok()?);
    }
    let rest = rest.scale(&scale.recip().ok()?);
    let (c2, rest_prim) = rest.primitive();
    if rest_prim.degree() > 0 {
        factors.push(rest_prim.to_expr(var));
    }
    Some(product_of(content.mul(&c2), factors))
}

/// Pull out the integer gcd of the coefficients and common powers
fn factor_common(e: &Expr) -> Option<Expr> {
    let terms = match e {
        Expr::Add(ts) => ts,
        _ => return None,
    };

    let mut g: Option<Number> = None;
    for t in terms {
        let (c, _) = split_coeff(t);
        if !c.is_exact_integer() {
            g = Some(Number::one());
            break;
        }
        g = Some(match g {
            None => c.abs(),
            Some(prev) => prev.gcd(&c).unwrap_or_else(Number::one),
        });
    }
    let g = g.filter(|g| !g.is_zero()).unwrap_or_else(Number::one);

    let factor_list = |t: &Expr| -> Vec<(Expr, Number)> {
        let (_, rest) = split_coeff(t);
        let fs = match rest {
            Expr::Mul(fs) => fs,
            Expr::Number(_) => Vec::new(),
            other => vec![other],
        };
        fs.iter()
            .filter_map(|f| {
                let (b, k) = base_exp(f);
                k.as_number().filter(|k| k.is_positive()).map(|k| (b, k.clone()))
            })
            .collect()
    };

    let mut common = factor_list(&terms[0]);
    for t in &terms[1..] {
        let fl = factor_list(t);
        common = common
            .into_iter()
            .filter_map(|(b, k)| {
                fl.iter()
                    .find(|(b2, _)| *b2 == b)
                    .map(|(_, k2)| (b.clone(), if *k2 < k { k2.clone() } else { k }))
            })
            .collect();
    }

    if g.is_one() && common.is_empty() {
        return None;
    }

    let mut divisor = vec![Expr::Number(g.recip().ok()?)];
    for (b, k) in &common {
        divisor.push(make_pow(b.clone(), Expr::Number(k.neg())));
    }
    let inner = make_add(
        terms
            .iter()
            .map(|t| {
                let mut fs = vec![t.clone()];
                fs.extend(divisor.iter().cloned());
                make_mul(fs)
            })
            .collect(),
    );
    let mut factors: Vec<Expr> = common
        .into_iter()
        .map(|(b, k)| make_pow(b, Expr::Number(k)))
        .collect();
    factors.push(inner);
    Some(product_of(g, factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    fn f(s: &str) -> String {
        factor(&parse_infix(s).unwrap()).to_string()
    }

    #[test]
    fn test_factor_quadratic() {
        assert_eq!(f("x^2 + 3x - 4"), "(x + 4)*(x - 1)");
        assert_eq!(f("x^2 - 1"), "(x + 1)*(x - 1)");
    }

    #[test]
    fn test_factor_repeated_root() {
        assert_eq!(f("x^2 + 2x + 1"), "(x + 1)^2");
    }

    #[test]
    fn test_factor_content() {
        assert_eq!(f("2x^2 + 4"), "2*(x^2 + 2)");
        assert_eq!(f("2x^2 - 2"), "2*(x + 1)*(x - 1)");
    }

    #[test]
    fn test_factor_rational_root() {
        assert_eq!(f("2x^2 - x"), "x*(2*x - 1)");
    }

    #[test]
    fn test_factor_leaves_linear_alone() {
        let e = canonical(&parse_infix("5x").unwrap());
        assert_eq!(factor(&e), e);
        let e = canonical(&parse_infix("x + 1").unwrap());
        assert_eq!(factor(&e), e);
    }

    #[test]
    fn test_factor_multivariate_common() {
        assert_eq!(f("x*y + x"), "x*(y + 1)");
        assert_eq!(f("6a + 9b"), "3*(2*a + 3*b)");
    }
}
