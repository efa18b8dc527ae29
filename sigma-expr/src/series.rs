//! Truncated Taylor series

use crate::ast::{Direction, Expr};
use crate::diff::differentiate;
use crate::limit::limit;
use crate::simplify::{canonical, make_add, make_mul, make_pow, simplify};
use sigma_core::{Number, SigmaError};

pub const MAX_ORDER: u32 = 30;

/// Taylor expansion of `e` about `point` up to, not including, `(x - point)^order`.
///
/// The result is a sum in ascending powers followed by an `O(...)` remainder.
pub fn series(e: &Expr, var: &str, point: &Expr, order: u32) -> Result<Expr, SigmaError> {
    if order == 0 || order > MAX_ORDER {
        return Err(SigmaError::validation(format!(
            "series order must be between 1 and {}, got {}",
            MAX_ORDER, order
        )));
    }
    let point = canonical(point);
    if point.has_singularity() {
        return Err(SigmaError::unsupported("series expansion about infinity is not supported")
            .with_suggestion("Expand about a finite point"));
    }

    let x = Expr::sym(var);
    let shift = if point.is_zero() {
        x
    } else {
        make_add(vec![x, make_mul(vec![Expr::int(-1), point.clone()])])
    };

    let mut terms = Vec::new();
    let mut deriv = canonical(e);
    let mut factorial = Number::one();
    for k in 0..order {
        if k > 0 {
            deriv = differentiate(&deriv, var)?;
            factorial = factorial.mul(&Number::from_i64(i64::from(k)));
        }
        let value = value_at(&deriv, var, &point)?;
        if value.has_singularity() {
            return Err(SigmaError::computation(format!(
                "{} has no Taylor expansion about {} = {}",
                e, var, point
            )));
        }
        let c = simplify(&make_mul(vec![value, Expr::Number(factorial.recip()?)]));
        if c.is_zero() {
            continue;
        }
        terms.push(term(c, make_pow(shift.clone(), Expr::int(i64::from(k)))));
    }
    terms.push(Expr::Order(Box::new(make_pow(shift, Expr::int(i64::from(order))))));
    Ok(if terms.len() == 1 {
        terms.remove(0)
    } else {
        Expr::Add(terms)
    })
}

/// `c*(x - a)^k` without distributing `c` over the shifted base
fn term(c: Expr, power: Expr) -> Expr {
    if power.is_one() {
        return c;
    }
    if c.is_one() {
        return power;
    }
    match c {
        Expr::Mul(mut fs) => {
            fs.push(power);
            Expr::Mul(fs)
        }
        other => Expr::Mul(vec![other, power]),
    }
}

fn value_at(e: &Expr, var: &str, point: &Expr) -> Result<Expr, SigmaError> {
    let direct = canonical(&e.substitute(var, point));
    if !direct.has_singularity() {
        return Ok(direct);
    }
    limit(e, var, point, Direction::Both)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    fn ser(s: &str, point: i64, n: u32) -> String {
        series(&parse_infix(s).unwrap(), "x", &Expr::int(point), n).unwrap().to_string()
    }

    #[test]
    fn test_exp() {
        assert_eq!(ser("exp(x)", 0, 4), "1 + x + x^2/2 + x^3/6 + O(x^4)");
    }

    #[test]
    fn test_sin() {
        assert_eq!(ser("sin(x)", 0, 6), "x - x^3/6 + x^5/120 + O(x^6)");
    }

    #[test]
    fn test_shifted_center() {
        assert_eq!(ser("x^2", 1, 3), "1 + 2*(x - 1) + (x - 1)^2 + O((x - 1)^3)");
    }

    #[test]
    fn test_removable_point() {
        assert_eq!(ser("sin(x)/x", 0, 3), "1 - x^2/6 + O(x^3)");
    }

    #[test]
    fn test_rejects_pole_and_bad_order() {
        assert!(series(&parse_infix("1/x").unwrap(), "x", &Expr::int(0), 3).is_err());
        assert!(series(&parse_infix("x").unwrap(), "x", &Expr::int(0), 0).is_err());
        assert!(series(&parse_infix("x").unwrap(), "x", &Expr::infinity(), 3).is_err());
    }
}
