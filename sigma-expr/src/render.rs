//! Expression rendering: plain text (`Display`) and LaTeX
//!
//! Plain text uses `^` for powers and `*` for products. LaTeX output follows
//! the usual textbook conventions (`\frac`, `\sqrt`, `\left( \right)`).

use crate::ast::{Constant, Direction, Expr, Function};
use sigma_core::{Number, SigmaError};
use std::fmt;

/// Deepest tree accepted by the LaTeX renderer
pub const MAX_RENDER_DEPTH: usize = 256;

// Binding strength of the outermost operator
const PREC_LOGIC: u8 = 5;
const PREC_ADD: u8 = 10;
const PREC_MUL: u8 = 20;
const PREC_NEG: u8 = 25;
const PREC_POW: u8 = 30;
const PREC_ATOM: u8 = 50;

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "rho", "sigma", "tau", "phi", "chi", "psi", "omega",
];

/// If `e` is a term printed with a leading minus, return its absolute form
fn negated_term(e: &Expr) -> Option<Expr> {
    match e {
        Expr::Number(n) if n.is_negative() => Some(Expr::Number(n.neg())),
        Expr::Mul(factors) => match factors.first() {
            Some(Expr::Number(n)) if n.is_negative() => {
                let abs = n.neg();
                let mut rest: Vec<Expr> = factors[1..].to_vec();
                if !abs.is_one() {
                    rest.insert(0, Expr::Number(abs));
                }
                Some(match rest.len() {
                    0 => Expr::int(1),
                    1 => rest.remove(0),
                    _ => Expr::Mul(rest),
                })
            }
            _ => None,
        },
        _ => None,
    }
}

/// Split a product into numerator and denominator factors
fn split_fraction(factors: &[Expr]) -> (Vec<Expr>, Vec<Expr>) {
    let mut num = Vec::new();
    let mut den = Vec::new();
    for f in factors {
        match f {
            Expr::Number(n) if n.is_exact() && !n.is_integer() => {
                let p = Number::from_ibig(n.numer());
                let q = Number::from_ibig(n.denom());
                if !p.is_one() {
                    num.push(Expr::Number(p));
                }
                den.push(Expr::Number(q));
            }
            Expr::Pow(base, exp) => match exp.as_number() {
                Some(k) if k.is_negative() => {
                    let pos = k.neg();
                    if pos.is_one() {
                        den.push(base.as_ref().clone());
                    } else {
                        den.push(Expr::pow(base.as_ref().clone(), Expr::Number(pos)));
                    }
                }
                _ => num.push(f.clone()),
            },
            _ => num.push(f.clone()),
        }
    }
    (num, den)
}

fn product_of(mut v: Vec<Expr>) -> Expr {
    match v.len() {
        0 => Expr::int(1),
        1 => v.remove(0),
        _ => Expr::Mul(v),
    }
}

// ========== Plain text ==========

fn plain(e: &Expr) -> (String, u8) {
    match e {
        Expr::Number(n) => {
            let s = n.to_string();
            let prec = if n.is_negative() {
                PREC_NEG
            } else if n.is_exact() && !n.is_integer() {
                PREC_MUL
            } else {
                PREC_ATOM
            };
            (s, prec)
        }
        Expr::Symbol(s) => (s.clone(), PREC_ATOM),
        Expr::Constant(c) => (
            match c {
                Constant::Pi => "pi",
                Constant::E => "E",
                Constant::I => "I",
                Constant::Infinity => "oo",
                Constant::Undefined => "nan",
            }
            .to_string(),
            PREC_ATOM,
        ),
        Expr::Bool(b) => (if *b { "True" } else { "False" }.to_string(), PREC_ATOM),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, t) in terms.iter().enumerate() {
                if i == 0 {
                    out.push_str(&plain_wrap(t, PREC_ADD));
                } else if let Some(pos) = negated_term(t) {
                    out.push_str(" - ");
                    out.push_str(&plain_wrap(&pos, PREC_ADD + 1));
                } else {
                    out.push_str(" + ");
                    out.push_str(&plain_wrap(t, PREC_ADD + 1));
                }
            }
            (out, PREC_ADD)
        }
        Expr::Mul(factors) => {
            if let Some(pos) = negated_term(e) {
                return (format!("-{}", plain_wrap(&pos, PREC_MUL)), PREC_NEG);
            }
            let (num, den) = split_fraction(factors);
            let num_s = if num.is_empty() {
                "1".to_string()
            } else {
                num.iter().map(|f| plain_wrap(f, PREC_MUL)).collect::<Vec<_>>().join("*")
            };
            if den.is_empty() {
                (num_s, PREC_MUL)
            } else {
                let den_e = product_of(den);
                (format!("{}/{}", num_s, plain_wrap(&den_e, PREC_POW)), PREC_MUL)
            }
        }
        Expr::Pow(base, exp) => {
            if let Some(k) = exp.as_number() {
                if *k == Number::from_ratio(1, 2) {
                    return (format!("sqrt({})", plain(base).0), PREC_ATOM);
                }
                if k.is_negative() {
                    let (_, den) = split_fraction(std::slice::from_ref(e));
                    return (format!("1/{}", plain_wrap(&product_of(den), PREC_POW)), PREC_MUL);
                }
            }
            (
                format!("{}^{}", plain_wrap(base, PREC_POW + 1), plain_wrap(exp, PREC_POW + 1)),
                PREC_POW,
            )
        }
        Expr::Func(f, arg) => (format!("{}({})", f.name(), plain(arg).0), PREC_ATOM),
        Expr::Apply(name, args) => (format!("{}({})", name, plain_list(args)), PREC_ATOM),
        Expr::Factorial(a) => (format!("{}!", plain_wrap(a, PREC_ATOM)), PREC_ATOM),
        Expr::Derivative(inner, var, n) => {
            let s = if *n == 1 {
                format!("Derivative({}, {})", plain(inner).0, var)
            } else {
                format!("Derivative({}, ({}, {}))", plain(inner).0, var, n)
            };
            (s, PREC_ATOM)
        }
        Expr::Integral { integrand, var, bounds } => {
            let s = match bounds {
                Some((lo, hi)) => format!(
                    "Integral({}, ({}, {}, {}))",
                    plain(integrand).0,
                    var,
                    plain(lo).0,
                    plain(hi).0
                ),
                None => format!("Integral({}, {})", plain(integrand).0, var),
            };
            (s, PREC_ATOM)
        }
        Expr::Limit { expr, var, point, dir } => (
            format!("Limit({}, {}, {}, dir='{}')", plain(expr).0, var, plain(point).0, dir.symbol()),
            PREC_ATOM,
        ),
        Expr::Sum { term, var, lower, upper } => (
            format!("Sum({}, ({}, {}, {}))", plain(term).0, var, plain(lower).0, plain(upper).0),
            PREC_ATOM,
        ),
        Expr::Equation(l, r) => (format!("{} = {}", plain(l).0, plain(r).0), 0),
        Expr::Not(a) => (format!("~{}", plain_wrap(a, PREC_ATOM)), PREC_NEG),
        Expr::And(v) => (join_plain(v, " & ", PREC_LOGIC + 2), PREC_LOGIC + 2),
        Expr::Or(v) => (join_plain(v, " | ", PREC_LOGIC + 1), PREC_LOGIC + 1),
        Expr::Xor(v) => (format!("Xor({})", plain_list(v)), PREC_ATOM),
        Expr::Implies(a, b) => (format!("Implies({}, {})", plain(a).0, plain(b).0), PREC_ATOM),
        Expr::Equivalent(a, b) => (format!("Equivalent({}, {})", plain(a).0, plain(b).0), PREC_ATOM),
        Expr::List(v) => (format!("[{}]", plain_list(v)), PREC_ATOM),
        Expr::Order(a) => (format!("O({})", plain(a).0), PREC_ATOM),
    }
}

fn plain_wrap(e: &Expr, min_prec: u8) -> String {
    let (s, p) = plain(e);
    if p < min_prec {
        format!("({})", s)
    } else {
        s
    }
}

fn plain_list(v: &[Expr]) -> String {
    v.iter().map(|a| plain(a).0).collect::<Vec<_>>().join(", ")
}

fn join_plain(v: &[Expr], sep: &str, prec: u8) -> String {
    v.iter().map(|a| plain_wrap(a, prec + 1)).collect::<Vec<_>>().join(sep)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", plain(self).0)
    }
}

// ========== LaTeX ==========

/// Render an expression as LaTeX.
///
/// Fails only for trees deeper than [`MAX_RENDER_DEPTH`].
pub fn to_latex(e: &Expr) -> Result<String, SigmaError> {
    let depth = e.depth();
    if depth > MAX_RENDER_DEPTH {
        return Err(SigmaError::render_error(format!(
            "expression nesting depth {} exceeds {}",
            depth, MAX_RENDER_DEPTH
        )));
    }
    Ok(latex(e).0)
}

/// LaTeX for a number, used for matrix entries as well
pub fn number_latex(n: &Number) -> String {
    latex(&Expr::Number(n.clone())).0
}

fn symbol_latex(name: &str) -> String {
    let (head, sub) = match name.split_once('_') {
        Some((h, s)) => (h, Some(s.to_string())),
        None => {
            let digits_at = name.find(|c: char| c.is_ascii_digit());
            match digits_at {
                Some(i) if i > 0 && name[i..].chars().all(|c| c.is_ascii_digit()) => {
                    (&name[..i], Some(name[i..].to_string()))
                }
                _ => (name, None),
            }
        }
    };
    let head = if GREEK.contains(&head) {
        format!("\\{}", head)
    } else if head.chars().count() > 1 {
        format!("\\operatorname{{{}}}", head)
    } else {
        head.to_string()
    };
    match sub {
        Some(s) => format!("{}_{{{}}}", head, s),
        None => head,
    }
}

fn latex(e: &Expr) -> (String, u8) {
    match e {
        Expr::Number(n) => {
            if n.is_exact() && !n.is_integer() {
                let p = n.numer();
                let q = n.denom();
                if n.is_negative() {
                    (format!("- \\frac{{{}}}{{{}}}", -p, q), PREC_NEG)
                } else {
                    (format!("\\frac{{{}}}{{{}}}", p, q), PREC_MUL)
                }
            } else if n.is_negative() {
                (n.to_string(), PREC_NEG)
            } else {
                (n.to_string(), PREC_ATOM)
            }
        }
        Expr::Symbol(s) => (symbol_latex(s), PREC_ATOM),
        Expr::Constant(c) => (
            match c {
                Constant::Pi => "\\pi",
                Constant::E => "e",
                Constant::I => "i",
                Constant::Infinity => "\\infty",
                Constant::Undefined => "\\text{NaN}",
            }
            .to_string(),
            PREC_ATOM,
        ),
        Expr::Bool(b) => (format!("\\text{{{}}}", if *b { "True" } else { "False" }), PREC_ATOM),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, t) in terms.iter().enumerate() {
                if i == 0 {
                    out.push_str(&latex_wrap(t, PREC_ADD));
                } else if let Some(pos) = negated_term(t) {
                    out.push_str(" - ");
                    out.push_str(&latex_wrap(&pos, PREC_ADD + 1));
                } else {
                    out.push_str(" + ");
                    out.push_str(&latex_wrap(t, PREC_ADD + 1));
                }
            }
            (out, PREC_ADD)
        }
        Expr::Mul(factors) => {
            if let Some(pos) = negated_term(e) {
                return (format!("- {}", latex_wrap(&pos, PREC_MUL)), PREC_NEG);
            }
            let (num, den) = split_fraction(factors);
            let num_s = latex_product(&num);
            if den.is_empty() {
                (num_s, PREC_MUL)
            } else {
                let num_s = if num.is_empty() { "1".to_string() } else { num_s };
                (format!("\\frac{{{}}}{{{}}}", num_s, latex_product(&den)), PREC_MUL)
            }
        }
        Expr::Pow(base, exp) => {
            if let Some(k) = exp.as_number() {
                let q = Number::from_ibig(k.denom());
                if k.is_exact() && Number::from_ibig(k.numer()).is_one() && !q.is_one() {
                    let inner = latex(base).0;
                    return if q == Number::from_i64(2) {
                        (format!("\\sqrt{{{}}}", inner), PREC_ATOM)
                    } else {
                        (format!("\\sqrt[{}]{{{}}}", q, inner), PREC_ATOM)
                    };
                }
                if k.is_negative() {
                    let (_, den) = split_fraction(std::slice::from_ref(e));
                    return (format!("\\frac{{1}}{{{}}}", latex_product(&den)), PREC_MUL);
                }
            }
            let base_s = match base.as_ref() {
                Expr::Func(..) => format!("\\left({}\\right)", latex(base).0),
                _ => latex_wrap(base, PREC_POW + 1),
            };
            (format!("{}^{{{}}}", base_s, latex(exp).0), PREC_POW)
        }
        Expr::Func(f, arg) => (func_latex(*f, arg), PREC_ATOM),
        Expr::Apply(name, args) => {
            let head = symbol_latex(name);
            let inner = args.iter().map(|a| latex(a).0).collect::<Vec<_>>().join(", ");
            (format!("{}{{\\left({} \\right)}}", head, inner), PREC_ATOM)
        }
        Expr::Factorial(a) => (format!("{}!", latex_wrap(a, PREC_ATOM)), PREC_ATOM),
        Expr::Derivative(inner, var, n) => {
            let v = symbol_latex(var);
            let op = if *n == 1 {
                format!("\\frac{{d}}{{d {}}}", v)
            } else {
                format!("\\frac{{d^{{{}}}}}{{d {}^{{{}}}}}", n, v, n)
            };
            (format!("{} {}", op, latex_wrap(inner, PREC_POW)), PREC_MUL)
        }
        Expr::Integral { integrand, var, bounds } => {
            let head = match bounds {
                Some((lo, hi)) => format!("\\int\\limits_{{{}}}^{{{}}}", latex(lo).0, latex(hi).0),
                None => "\\int".to_string(),
            };
            (
                format!("{} {}\\, d{}", head, latex_wrap(integrand, PREC_MUL), symbol_latex(var)),
                PREC_MUL,
            )
        }
        Expr::Limit { expr, var, point, dir } => {
            let side = match dir {
                Direction::Plus => "^+",
                Direction::Minus => "^-",
                Direction::Both => "",
            };
            (
                format!(
                    "\\lim_{{{} \\to {}{}}} {}",
                    symbol_latex(var),
                    latex(point).0,
                    side,
                    latex_wrap(expr, PREC_MUL)
                ),
                PREC_MUL,
            )
        }
        Expr::Sum { term, var, lower, upper } => (
            format!(
                "\\sum_{{{}={}}}^{{{}}} {}",
                symbol_latex(var),
                latex(lower).0,
                latex(upper).0,
                latex_wrap(term, PREC_MUL)
            ),
            PREC_MUL,
        ),
        Expr::Equation(l, r) => (format!("{} = {}", latex(l).0, latex(r).0), 0),
        Expr::Not(a) => (format!("\\neg {}", latex_wrap(a, PREC_ATOM)), PREC_NEG),
        Expr::And(v) => (join_latex(v, " \\wedge ", PREC_LOGIC + 2), PREC_LOGIC + 2),
        Expr::Or(v) => (join_latex(v, " \\vee ", PREC_LOGIC + 1), PREC_LOGIC + 1),
        Expr::Xor(v) => (join_latex(v, " \\veebar ", PREC_LOGIC + 1), PREC_LOGIC + 1),
        Expr::Implies(a, b) => (
            format!("{} \\Rightarrow {}", latex_wrap(a, PREC_LOGIC + 1), latex_wrap(b, PREC_LOGIC + 1)),
            PREC_LOGIC,
        ),
        Expr::Equivalent(a, b) => (
            format!(
                "{} \\Leftrightarrow {}",
                latex_wrap(a, PREC_LOGIC + 1),
                latex_wrap(b, PREC_LOGIC + 1)
            ),
            PREC_LOGIC,
        ),
        Expr::List(v) => {
            let items = v.iter().map(|a| latex(a).0).collect::<Vec<_>>().join(", \\  ");
            (format!("\\left[ {}\\right]", items), PREC_ATOM)
        }
        Expr::Order(a) => (format!("O\\left({}\\right)", latex(a).0), PREC_ATOM),
    }
}

fn func_latex(f: Function, arg: &Expr) -> String {
    let inner = latex(arg).0;
    match f {
        Function::Exp => format!("e^{{{}}}", inner),
        Function::Abs => format!("\\left|{}\\right|", inner),
        Function::Asin | Function::Acos | Function::Atan => {
            format!("\\operatorname{{{}}}{{\\left({} \\right)}}", f.name(), inner)
        }
        _ => format!("\\{}{{\\left({} \\right)}}", f.name(), inner),
    }
}

fn latex_product(factors: &[Expr]) -> String {
    let mut out = String::new();
    let mut prev_numeric = false;
    for (i, f) in factors.iter().enumerate() {
        let numeric = f.is_number();
        if i > 0 {
            out.push_str(if numeric && prev_numeric { " \\cdot " } else { " " });
        }
        out.push_str(&latex_wrap(f, PREC_MUL + 1));
        prev_numeric = numeric;
    }
    out
}

fn latex_wrap(e: &Expr, min_prec: u8) -> String {
    let (s, p) = latex(e);
    if p < min_prec {
        format!("\\left({}\\right)", s)
    } else {
        s
    }
}

fn join_latex(v: &[Expr], sep: &str, prec: u8) -> String {
    v.iter().map(|a| latex_wrap(a, prec + 1)).collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::sym("x")
    }

    #[test]
    fn test_plain_polynomial() {
        let e = Expr::add(vec![
            Expr::pow(x(), Expr::int(2)),
            Expr::mul(vec![Expr::int(3), x()]),
            Expr::int(-4),
        ]);
        assert_eq!(e.to_string(), "x^2 + 3*x - 4");
    }

    #[test]
    fn test_plain_fraction_and_sqrt() {
        let e = Expr::mul(vec![Expr::rational(1, 2), x()]);
        assert_eq!(e.to_string(), "x/2");
        assert_eq!(Expr::sqrt(x()).to_string(), "sqrt(x)");
        assert_eq!(Expr::pow(x(), Expr::int(-1)).to_string(), "1/x");
    }

    #[test]
    fn test_plain_apply_matches_template_syntax() {
        let e = Expr::Apply("C".into(), vec![Expr::int(5), Expr::int(2)]);
        assert_eq!(e.to_string(), "C(5, 2)");
    }

    #[test]
    fn test_latex_basic() {
        let e = Expr::mul(vec![Expr::int(5), x()]);
        assert_eq!(to_latex(&e).unwrap(), "5 x");
        let f = Expr::func(Function::Sin, Expr::pow(x(), Expr::int(2)));
        assert_eq!(to_latex(&f).unwrap(), "\\sin{\\left(x^{2} \\right)}");
    }

    #[test]
    fn test_latex_fraction() {
        let e = Expr::mul(vec![Expr::rational(-1, 6), Expr::pow(x(), Expr::int(3))]);
        assert_eq!(to_latex(&e).unwrap(), "- \\frac{x^{3}}{6}");
    }

    #[test]
    fn test_latex_list() {
        let e = Expr::List(vec![Expr::int(-4), Expr::int(1)]);
        assert_eq!(to_latex(&e).unwrap(), "\\left[ -4, \\  1\\right]");
    }

    #[test]
    fn test_latex_depth_limit() {
        let mut e = x();
        for _ in 0..(MAX_RENDER_DEPTH + 5) {
            e = Expr::func(Function::Sin, e);
        }
        assert!(to_latex(&e).is_err());
        // plain rendering never fails
        assert!(e.to_string().starts_with("sin(sin("));
    }

    #[test]
    fn test_latex_symbols() {
        assert_eq!(to_latex(&Expr::sym("theta")).unwrap(), "\\theta");
        assert_eq!(to_latex(&Expr::sym("x1")).unwrap(), "x_{1}");
        assert_eq!(to_latex(&Expr::sym("C1")).unwrap(), "C_{1}");
    }
}
