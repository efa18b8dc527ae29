//! Distribution of products and integer powers over sums

use crate::ast::Expr;
use crate::simplify::{canonical, make_add, make_func, make_mul, make_pow};

/// Products with more terms than this are left factored
const MAX_TERMS: usize = 10_000;

/// Largest integer power of a sum that gets multiplied out
const MAX_POWER: i64 = 50;

pub fn expand(e: &Expr) -> Expr {
    match e {
        Expr::Add(ts) => make_add(ts.iter().map(expand).collect()),
        Expr::Mul(fs) => distribute(fs.iter().map(expand).collect()),
        Expr::Pow(b, k) => {
            let base = expand(b);
            let exp = expand(k);
            if let (Expr::Add(_), Some(n)) = (&base, exp.as_number()) {
                if let Some(n) = n.to_i64().filter(|_| n.is_exact_integer()) {
                    if n.abs() >= 2 && n.abs() <= MAX_POWER {
                        let repeated = vec![base.clone(); n.unsigned_abs() as usize];
                        let multiplied = distribute(repeated);
                        return if n > 0 {
                            multiplied
                        } else {
                            make_pow(multiplied, Expr::int(-1))
                        };
                    }
                }
            }
            match make_pow(base, exp) {
                // (2x)^2 comes back as a product whose factors may need distributing
                Expr::Mul(fs) => distribute(fs),
                other => other,
            }
        }
        Expr::Func(f, a) => make_func(*f, expand(a)),
        _ => canonical(&e.map_children(expand)),
    }
}

fn distribute(factors: Vec<Expr>) -> Expr {
    let mut terms: Vec<Expr> = vec![Expr::int(1)];
    for f in &factors {
        let f_terms: Vec<Expr> = match f {
            Expr::Add(ts) => ts.clone(),
            other => vec![other.clone()],
        };
        if terms.len() * f_terms.len() > MAX_TERMS {
            tracing::debug!(terms = terms.len() * f_terms.len(), "expansion too large, leaving product");
            return make_mul(factors);
        }
        terms = terms
            .iter()
            .flat_map(|t| f_terms.iter().map(move |u| make_mul(vec![t.clone(), u.clone()])))
            .collect();
    }
    make_add(terms)
}
