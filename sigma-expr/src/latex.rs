//! LaTeX input
//!
//! The grammar lives in `latex.pest`. Parsing yields either a single
//! expression (possibly an equation) or a matrix of expressions.

use crate::ast::{Constant, Direction, Expr, Function};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use sigma_core::{Number, SigmaError};

#[derive(Parser)]
#[grammar = "latex.pest"]
struct LatexGrammar;

/// Result of parsing LaTeX input
#[derive(Debug, Clone, PartialEq)]
pub enum LatexValue {
    Expr(Expr),
    Matrix(Vec<Vec<Expr>>),
}

pub fn parse_latex(text: &str) -> Result<LatexValue, SigmaError> {
    let mut pairs = LatexGrammar::parse(Rule::latex, text).map_err(|e| {
        let pos = match e.location {
            pest::error::InputLocation::Pos(p) => p,
            pest::error::InputLocation::Span((s, _)) => s,
        };
        SigmaError::parse_error(format!("invalid LaTeX: {}", e.variant.message())).at_position(pos)
    })?;

    let root = pairs
        .next()
        .ok_or_else(|| SigmaError::parse_error("empty LaTeX input"))?;
    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::matrix => return build_matrix(pair).map(LatexValue::Matrix),
            Rule::equation => return build_equation(pair).map(LatexValue::Expr),
            _ => {}
        }
    }
    Err(SigmaError::parse_error("empty LaTeX input"))
}

/// Parse LaTeX that must denote a single expression
pub fn parse_latex_expr(text: &str) -> Result<Expr, SigmaError> {
    match parse_latex(text)? {
        LatexValue::Expr(e) => Ok(e),
        LatexValue::Matrix(_) => Err(SigmaError::parse_error("expected an expression, found a matrix")),
    }
}

fn malformed(rule: Rule) -> SigmaError {
    SigmaError::internal(format!("unexpected LaTeX parse node {:?}", rule))
}

fn next_pair<'a>(pairs: &mut Pairs<'a, Rule>, parent: Rule) -> Result<Pair<'a, Rule>, SigmaError> {
    pairs.next().ok_or_else(|| malformed(parent))
}

// ========== Builders ==========

fn build_equation(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut sides = pair.into_inner();
    let lhs = build_expr(next_pair(&mut sides, Rule::equation)?)?;
    match sides.next() {
        Some(rhs) => Ok(Expr::equation(lhs, build_expr(rhs)?)),
        None => Ok(lhs),
    }
}

/// `expr` and `int_body`: optional sign, then terms joined by `+`/`-`
fn build_expr(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut terms = Vec::new();
    let mut negate_next = false;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::sign | Rule::add_op => negate_next = p.as_str().trim() == "-",
            Rule::term | Rule::int_term => {
                let t = build_term(p)?;
                terms.push(if negate_next { Expr::neg(t) } else { t });
                negate_next = false;
            }
            other => return Err(malformed(other)),
        }
    }
    Ok(collapse(terms, Expr::Add))
}

/// `term` and `int_term`: factors with explicit or implicit multiplication
fn build_term(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut factors = Vec::new();
    let mut divide_next = false;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::mul_op => divide_next = p.as_str().trim() == "/",
            Rule::factor => {
                let f = build_factor(p)?;
                factors.push(if divide_next { Expr::pow(f, Expr::int(-1)) } else { f });
                divide_next = false;
            }
            other => return Err(malformed(other)),
        }
    }
    Ok(collapse(factors, Expr::Mul))
}

fn build_factor(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut inner = pair.into_inner();
    let mut e = build_primary(next_pair(&mut inner, Rule::factor)?)?;
    for p in inner {
        match p.as_rule() {
            Rule::power => {
                let exp = build_exponent(p)?;
                e = Expr::pow(e, exp);
            }
            Rule::bang => e = Expr::Factorial(Box::new(e)),
            other => return Err(malformed(other)),
        }
    }
    Ok(e)
}

/// `power`, `func_power`, `exponent` and `bound` all wrap a single atom
fn build_exponent(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();
    let p = next_pair(&mut inner, rule)?;
    match p.as_rule() {
        Rule::exponent => build_exponent(p),
        _ => build_primary(p),
    }
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let rule = pair.as_rule();
    match rule {
        Rule::number | Rule::digit | Rule::int => Number::from_str(pair.as_str())
            .map(Expr::Number)
            .map_err(SigmaError::from),
        Rule::letter => Ok(build_letter(pair)),
        Rule::greek => {
            let name = pair.as_str().trim_start_matches('\\');
            Ok(Expr::sym(name))
        }
        Rule::constant => Ok(match pair.as_str().trim() {
            "\\pi" => Expr::pi(),
            _ => Expr::infinity(),
        }),
        Rule::braced | Rule::delimited | Rule::sqrt_index => {
            let mut inner = pair.into_inner();
            build_expr(next_pair(&mut inner, rule)?)
        }
        Rule::abs_bars => {
            let mut inner = pair.into_inner();
            let arg = build_expr(next_pair(&mut inner, rule)?)?;
            Ok(Expr::func(Function::Abs, arg))
        }
        Rule::frac => {
            let mut inner = pair.into_inner();
            let num = build_primary(next_pair(&mut inner, rule)?)?;
            let den = build_primary(next_pair(&mut inner, rule)?)?;
            Ok(Expr::div(num, den))
        }
        Rule::sqrt => {
            let mut index = None;
            let mut radicand = None;
            for p in pair.into_inner() {
                if p.as_rule() == Rule::sqrt_index {
                    index = Some(build_primary(p)?);
                } else {
                    radicand = Some(build_primary(p)?);
                }
            }
            let radicand = radicand.ok_or_else(|| malformed(rule))?;
            Ok(match index {
                Some(n) => Expr::pow(radicand, Expr::pow(n, Expr::int(-1))),
                None => Expr::sqrt(radicand),
            })
        }
        Rule::derivative => build_derivative(pair),
        Rule::integral => build_integral(pair),
        Rule::limit => build_limit(pair),
        Rule::sum => build_sum(pair),
        Rule::func => build_func(pair),
        Rule::bound | Rule::exponent => build_exponent(pair),
        other => Err(malformed(other)),
    }
}

fn build_letter(pair: Pair<Rule>) -> Expr {
    let mut name = String::new();
    let mut sub = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::letter_name => name.push_str(p.as_str()),
            Rule::subscript => sub = Some(p.as_str().trim_start_matches('_').trim_matches(['{', '}']).to_string()),
            _ => {}
        }
    }
    match sub {
        Some(s) => Expr::Symbol(format!("{}_{}", name, s)),
        None if name == "e" => Expr::Constant(Constant::E),
        None => Expr::Symbol(name),
    }
}

fn letter_name(pair: Pair<Rule>) -> String {
    match build_letter(pair) {
        Expr::Symbol(s) => s,
        _ => "e".to_string(),
    }
}

fn build_derivative(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut order = 1u32;
    let mut var = None;
    let mut body = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::diff_order if var.is_none() => {
                let digits = p.as_str().trim_start_matches('^').trim_matches(['{', '}', ' ']);
                order = digits
                    .parse()
                    .map_err(|_| SigmaError::parse_error("invalid derivative order"))?;
            }
            Rule::diff_order => {}
            Rule::letter => var = Some(letter_name(p)),
            Rule::factor => body = Some(build_factor(p)?),
            other => return Err(malformed(other)),
        }
    }
    let var = var.ok_or_else(|| malformed(Rule::derivative))?;
    let body = body.ok_or_else(|| malformed(Rule::derivative))?;
    Ok(Expr::Derivative(Box::new(body), var, order.max(1)))
}

fn build_integral(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut bounds = None;
    let mut integrand = None;
    let mut var = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::int_bounds => {
                let mut inner = p.into_inner();
                let lo = build_exponent(next_pair(&mut inner, Rule::int_bounds)?)?;
                let hi = build_exponent(next_pair(&mut inner, Rule::int_bounds)?)?;
                bounds = Some((Box::new(lo), Box::new(hi)));
            }
            Rule::int_body => integrand = Some(build_expr(p)?),
            Rule::differential => {
                let mut inner = p.into_inner();
                var = Some(letter_name(next_pair(&mut inner, Rule::differential)?));
            }
            other => return Err(malformed(other)),
        }
    }
    Ok(Expr::Integral {
        integrand: Box::new(integrand.ok_or_else(|| malformed(Rule::integral))?),
        var: var.ok_or_else(|| malformed(Rule::integral))?,
        bounds,
    })
}

fn build_limit(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut var = None;
    let mut point = None;
    let mut dir = Direction::Both;
    let mut body = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::letter => var = Some(letter_name(p)),
            Rule::limit_point => {
                let mut negative = false;
                let mut value = None;
                for q in p.into_inner() {
                    if q.as_rule() == Rule::sign {
                        negative = q.as_str().trim() == "-";
                    } else {
                        value = Some(build_primary(q)?);
                    }
                }
                let value = value.ok_or_else(|| malformed(Rule::limit_point))?;
                point = Some(if negative { Expr::neg(value) } else { value });
            }
            Rule::limit_dir => {
                dir = if p.as_str().contains('-') { Direction::Minus } else { Direction::Plus };
            }
            Rule::term => body = Some(build_term(p)?),
            other => return Err(malformed(other)),
        }
    }
    Ok(Expr::Limit {
        expr: Box::new(body.ok_or_else(|| malformed(Rule::limit))?),
        var: var.ok_or_else(|| malformed(Rule::limit))?,
        point: Box::new(point.ok_or_else(|| malformed(Rule::limit))?),
        dir,
    })
}

fn build_sum(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut inner = pair.into_inner();
    let var = letter_name(next_pair(&mut inner, Rule::sum)?);
    let lower = build_expr(next_pair(&mut inner, Rule::sum)?)?;
    let upper = build_exponent(next_pair(&mut inner, Rule::sum)?)?;
    let term = build_term(next_pair(&mut inner, Rule::sum)?)?;
    Ok(Expr::Sum {
        term: Box::new(term),
        var,
        lower: Box::new(lower),
        upper: Box::new(upper),
    })
}

fn build_func(pair: Pair<Rule>) -> Result<Expr, SigmaError> {
    let mut name = "";
    let mut base = None;
    let mut power = None;
    let mut arg = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::func_name => name = p.as_str().trim().trim_start_matches('\\'),
            Rule::log_base => base = Some(build_exponent(p)?),
            Rule::func_power => power = Some(build_exponent(p)?),
            Rule::delimited => arg = Some(build_primary(p)?),
            Rule::factor => arg = Some(build_factor(p)?),
            other => return Err(malformed(other)),
        }
    }
    let f = Function::from_name(name)
        .ok_or_else(|| SigmaError::parse_error(format!("unknown function \\{}", name)))?;
    let arg = arg.ok_or_else(|| malformed(Rule::func))?;
    let mut e = Expr::func(f, arg);
    if let Some(b) = base {
        e = Expr::div(e, Expr::ln(b));
    }
    if let Some(k) = power {
        e = Expr::pow(e, k);
    }
    Ok(e)
}

fn build_matrix(pair: Pair<Rule>) -> Result<Vec<Vec<Expr>>, SigmaError> {
    let mut rows = Vec::new();
    for row in pair.into_inner() {
        if row.as_rule() != Rule::row {
            continue;
        }
        let cells = row.into_inner().map(build_expr).collect::<Result<Vec<_>, _>>()?;
        rows.push(cells);
    }
    if let Some(first) = rows.first() {
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(SigmaError::parse_error("matrix rows have different lengths"));
        }
    }
    Ok(rows)
}

fn collapse(mut items: Vec<Expr>, build: fn(Vec<Expr>) -> Expr) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        build(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(s: &str) -> Expr {
        parse_latex_expr(s).unwrap()
    }

    #[test]
    fn test_fraction_and_power() {
        let e = expr("\\frac{x^{2}}{2}");
        assert_eq!(e, Expr::div(Expr::pow(Expr::sym("x"), Expr::int(2)), Expr::int(2)));
    }

    #[test]
    fn test_implicit_product() {
        assert_eq!(expr("2x"), Expr::Mul(vec![Expr::int(2), Expr::sym("x")]));
        assert_eq!(expr("2 \\cdot 3"), Expr::Mul(vec![Expr::int(2), Expr::int(3)]));
    }

    #[test]
    fn test_functions() {
        let e = expr("\\sin\\left(x^{2}\\right)");
        assert_eq!(e, Expr::func(Function::Sin, Expr::pow(Expr::sym("x"), Expr::int(2))));
        let e = expr("\\sin^2 x");
        assert_eq!(e, Expr::pow(Expr::func(Function::Sin, Expr::sym("x")), Expr::int(2)));
        assert_eq!(expr("e^{x}"), Expr::pow(Expr::Constant(Constant::E), Expr::sym("x")));
    }

    #[test]
    fn test_integral() {
        let e = expr("\\int x^2 \\, dx");
        assert!(matches!(e, Expr::Integral { ref var, bounds: None, .. } if var == "x"));
        let e = expr("\\int_0^1 x dx");
        assert!(matches!(e, Expr::Integral { bounds: Some(_), .. }));
    }

    #[test]
    fn test_limit() {
        let e = expr("\\lim_{x \\to 0^+} \\frac{\\sin x}{x}");
        match e {
            Expr::Limit { var, dir, .. } => {
                assert_eq!(var, "x");
                assert_eq!(dir, Direction::Plus);
            }
            other => panic!("expected limit, got {:?}", other),
        }
    }

    #[test]
    fn test_derivative() {
        let e = expr("\\frac{d}{dx} x^3");
        assert!(matches!(e, Expr::Derivative(_, ref v, 1) if v == "x"));
    }

    #[test]
    fn test_matrix() {
        let m = parse_latex("\\begin{bmatrix} 1 & 2 \\\\ 3 & 4 \\end{bmatrix}").unwrap();
        assert_eq!(
            m,
            LatexValue::Matrix(vec![
                vec![Expr::int(1), Expr::int(2)],
                vec![Expr::int(3), Expr::int(4)],
            ])
        );
    }

    #[test]
    fn test_equation() {
        let e = expr("x^2 - 1 = 0");
        assert!(matches!(e, Expr::Equation(_, _)));
    }

    #[test]
    fn test_invalid() {
        assert!(parse_latex("\\frac{1}").is_err());
        assert!(parse_latex("").is_err());
    }
}
