//! Infix parser
//!
//! Hand-written recursive descent over the token stream. The resulting tree
//! is exactly what was written: nothing is evaluated or collected here.
//!
//! Precedence, loosest first:
//! `<->`, `->` (right), `|`/`or`/`xor`, `&`/`and`, `~`/`not`, `+ -`,
//! `* /` and implicit multiplication, unary `-`, `^` (right), postfix `!` and `'`.

use crate::ast::{Expr, Function};
use crate::lexer::{tokenize, Spanned, Token};
use sigma_core::{Number, SigmaError};

/// Deepest parenthesis nesting accepted
const MAX_NESTING: usize = 200;

const KEYWORDS: &[&str] = &["and", "or", "not", "xor"];

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "rho", "sigma", "tau", "phi", "chi", "psi", "omega",
];

/// Names that are never split into single-letter products
const RESERVED: &[&str] = &[
    "sqrt", "root", "factorial", "binomial", "Derivative", "diff", "Integral", "integrate",
    "Limit", "limit", "Eq", "pi", "oo", "inf", "infinity", "Infinity", "nan", "True", "False",
    "true", "false",
];

/// How identifiers followed by `(` are read
#[derive(Debug, Clone, PartialEq)]
pub struct ParseContext {
    /// Names applied as undefined functions: `f(x)` is an application, not `f*x`
    pub functions: Vec<String>,
    /// Independent variable for bare function names and primes (`y''`)
    pub var: String,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            functions: vec!["f".into(), "g".into(), "h".into()],
            var: "x".into(),
        }
    }
}

impl ParseContext {
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.functions.contains(&name) {
            self.functions.push(name);
        }
        self
    }

    pub fn with_var(mut self, var: impl Into<String>) -> Self {
        self.var = var.into();
        self
    }

    fn is_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f == name)
    }
}

/// Parse infix text with the default context. `=` is rejected.
pub fn parse_infix(text: &str) -> Result<Expr, SigmaError> {
    parse_infix_with(text, &ParseContext::default())
}

pub fn parse_infix_with(text: &str, ctx: &ParseContext) -> Result<Expr, SigmaError> {
    let mut parser = Parser::new(text, ctx)?;
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse `lhs = rhs`. Text without `=` parses as a plain expression.
pub fn parse_equation(text: &str, ctx: &ParseContext) -> Result<Expr, SigmaError> {
    let mut parser = Parser::new(text, ctx)?;
    let lhs = parser.expr()?;
    if parser.eat(&Token::Eq) {
        let rhs = parser.expr()?;
        parser.finish()?;
        return Ok(Expr::equation(lhs, rhs));
    }
    parser.finish()?;
    Ok(lhs)
}

/// Strip surrounding space and a trailing full stop or question mark.
///
/// Typographic symbols (`×`, `²`, `√`, `π`, ...) are read by the lexer itself.
pub fn tidy_query(text: &str) -> String {
    text.trim().trim_end_matches(['.', '?']).trim_end().to_string()
}

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    nesting: usize,
    ctx: &'a ParseContext,
}

impl<'a> Parser<'a> {
    fn new(text: &str, ctx: &'a ParseContext) -> Result<Self, SigmaError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(SigmaError::parse_error("empty expression"));
        }
        Ok(Self { tokens, pos: 0, end: text.len(), nesting: 0, ctx })
    }

    // ========== Token helpers ==========

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.pos).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|t| t.token.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(s)) if s == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), SigmaError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", token.describe())))
        }
    }

    fn unexpected(&self, what: &str) -> SigmaError {
        let found = match self.peek() {
            Some(t) => t.describe(),
            None => "end of input".to_string(),
        };
        SigmaError::parse_error(format!("{}, found {}", what, found)).at_position(self.position())
    }

    fn finish(&self) -> Result<(), SigmaError> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Eq) => Err(SigmaError::parse_error("unexpected '=' in expression")
                .with_suggestion("Write equations as 'lhs = rhs' in a solving mode")
                .at_position(self.position())),
            Some(_) => Err(self.unexpected("unexpected token")),
        }
    }

    // ========== Grammar ==========

    fn expr(&mut self) -> Result<Expr, SigmaError> {
        let mut lhs = self.implication()?;
        while self.eat(&Token::DoubleArrow) {
            let rhs = self.implication()?;
            lhs = Expr::Equivalent(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn implication(&mut self) -> Result<Expr, SigmaError> {
        let lhs = self.disjunction()?;
        if self.eat(&Token::Arrow) {
            let rhs = self.implication()?;
            return Ok(Expr::Implies(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn disjunction(&mut self) -> Result<Expr, SigmaError> {
        let first = self.conjunction()?;
        let mut ors = vec![first];
        loop {
            if self.eat(&Token::Pipe) || self.eat_keyword("or") {
                ors.push(self.conjunction()?);
            } else if self.eat_keyword("xor") {
                let lhs = collapse(ors, Expr::Or);
                let rhs = self.conjunction()?;
                ors = vec![Expr::Xor(vec![lhs, rhs])];
            } else {
                break;
            }
        }
        Ok(collapse(ors, Expr::Or))
    }

    fn conjunction(&mut self) -> Result<Expr, SigmaError> {
        let mut ands = vec![self.negation()?];
        while self.eat(&Token::Amp) || self.eat_keyword("and") {
            ands.push(self.negation()?);
        }
        Ok(collapse(ands, Expr::And))
    }

    fn negation(&mut self) -> Result<Expr, SigmaError> {
        if self.eat(&Token::Tilde) || self.eat_keyword("not") {
            let inner = self.negation()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.additive()
    }

    fn additive(&mut self) -> Result<Expr, SigmaError> {
        let mut terms = vec![self.term()?];
        loop {
            if self.eat(&Token::Plus) {
                terms.push(self.term()?);
            } else if self.eat(&Token::Minus) {
                let t = self.term()?;
                terms.push(Expr::neg(t));
            } else {
                break;
            }
        }
        Ok(collapse(terms, Expr::Add))
    }

    fn term(&mut self) -> Result<Expr, SigmaError> {
        let mut factors = vec![self.unary()?];
        loop {
            if self.eat(&Token::Star) {
                factors.push(self.unary()?);
            } else if self.eat(&Token::Slash) {
                let d = self.unary()?;
                factors.push(Expr::pow(d, Expr::int(-1)));
            } else if self.starts_implicit_factor() {
                factors.push(self.power()?);
            } else {
                break;
            }
        }
        Ok(collapse(factors, Expr::Mul))
    }

    fn starts_implicit_factor(&self) -> bool {
        match self.peek() {
            Some(Token::Number(_)) | Some(Token::LParen) => true,
            Some(Token::Ident(s)) => !KEYWORDS.contains(&s.as_str()),
            _ => false,
        }
    }

    fn unary(&mut self) -> Result<Expr, SigmaError> {
        if self.eat(&Token::Minus) {
            let inner = self.unary()?;
            return Ok(Expr::neg(inner));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, SigmaError> {
        let base = self.postfix()?;
        if self.eat(&Token::Caret) {
            let exp = self.unary()?;
            return Ok(Expr::pow(base, exp));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, SigmaError> {
        let mut e = self.primary()?;
        loop {
            if self.eat(&Token::Bang) {
                e = Expr::Factorial(Box::new(e));
            } else if self.peek() == Some(&Token::Prime) {
                let mut order = 0;
                while self.eat(&Token::Prime) {
                    order += 1;
                }
                e = self.applied_after_primes(e)?;
                e = self.prime_derivative(e, order)?;
            } else {
                break;
            }
        }
        Ok(e)
    }

    /// `y'(t)`: the parenthesised argument after the primes is the application's
    fn applied_after_primes(&mut self, e: Expr) -> Result<Expr, SigmaError> {
        match e {
            Expr::Apply(name, _) if self.ctx.is_function(&name) && self.peek() == Some(&Token::LParen) => {
                let args = self.call_args(1, 8)?;
                Ok(Expr::Apply(name, args))
            }
            other => Ok(other),
        }
    }

    fn prime_derivative(&self, e: Expr, order: u32) -> Result<Expr, SigmaError> {
        match &e {
            Expr::Apply(name, args) if self.ctx.is_function(name) && args.len() == 1 => {
                let var = match &args[0] {
                    Expr::Symbol(v) => v.clone(),
                    _ => self.ctx.var.clone(),
                };
                Ok(Expr::Derivative(Box::new(e), var, order))
            }
            _ => Err(SigmaError::parse_error(format!("prime notation needs a function, found '{}'", e))
                .at_position(self.position())),
        }
    }

    fn primary(&mut self) -> Result<Expr, SigmaError> {
        let start = self.position();
        match self.advance() {
            Some(Token::Number(text)) => Number::from_str(&text)
                .map(Expr::Number)
                .map_err(|e| SigmaError::from(e).at_position(start)),
            Some(Token::LParen) => {
                self.nesting += 1;
                if self.nesting > MAX_NESTING {
                    return Err(SigmaError::parse_error("expression nested too deeply").at_position(start));
                }
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                self.nesting -= 1;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(Token::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::List(items))
            }
            Some(Token::Ident(name)) => self.identifier(name, start),
            Some(other) => {
                self.pos -= 1;
                Err(self.unexpected(&format!("unexpected {}", other.describe())))
            }
            None => Err(self.unexpected("unexpected end of expression")),
        }
    }

    // ========== Identifiers ==========

    fn identifier(&mut self, name: String, start: usize) -> Result<Expr, SigmaError> {
        if let Some(atom) = atom(&name) {
            return Ok(atom);
        }
        if let Some(f) = Function::from_name(&name) {
            return self.function_call(f);
        }
        let paren = self.peek() == Some(&Token::LParen);
        match name.as_str() {
            "sqrt" => {
                let arg = self.single_argument()?;
                return Ok(Expr::sqrt(arg));
            }
            "root" => {
                let args = self.call_args(2, 2)?;
                let mut it = args.into_iter();
                let (a, n) = (it.next(), it.next());
                if let (Some(a), Some(n)) = (a, n) {
                    return Ok(Expr::pow(a, Expr::pow(n, Expr::int(-1))));
                }
            }
            "factorial" => {
                let arg = self.single_argument()?;
                return Ok(Expr::Factorial(Box::new(arg)));
            }
            "binomial" => {
                let args = self.call_args(2, 2)?;
                return Ok(Expr::Apply(name, args));
            }
            "Eq" => {
                let mut args = self.call_args(1, 2)?;
                let rhs = if args.len() == 2 { args.remove(1) } else { Expr::int(0) };
                return Ok(Expr::equation(args.remove(0), rhs));
            }
            "Derivative" | "diff" => return self.derivative_call(),
            "Integral" | "integrate" => return self.integral_call(),
            "Limit" | "limit" => return self.limit_call(),
            _ => {}
        }

        if self.ctx.is_function(&name) {
            if paren {
                let args = self.call_args(1, 8)?;
                return Ok(Expr::Apply(name, args));
            }
            return Ok(Expr::Apply(name, vec![Expr::Symbol(self.ctx.var.clone())]));
        }

        let single_upper = name.chars().count() == 1 && name.chars().all(|c| c.is_uppercase());
        if single_upper && paren {
            let args = self.call_args(1, 8)?;
            return Ok(Expr::Apply(name, args));
        }

        if should_split(&name) {
            let letters: Vec<Expr> = name
                .chars()
                .map(|c| {
                    let s = c.to_string();
                    atom(&s).unwrap_or(Expr::Symbol(s))
                })
                .collect();
            tracing::trace!(ident = %name, at = start, "splitting identifier into a product");
            return Ok(Expr::Mul(letters));
        }

        Ok(Expr::Symbol(name))
    }

    fn function_call(&mut self, f: Function) -> Result<Expr, SigmaError> {
        // sin^2(x)
        if self.eat(&Token::Caret) {
            let exp = self.postfix()?;
            let arg = self.single_argument()?;
            return Ok(Expr::pow(Expr::func(f, arg), exp));
        }
        if f == Function::Ln && self.peek() == Some(&Token::LParen) {
            let mut args = self.call_args(1, 2)?;
            if args.len() == 2 {
                let base = args.remove(1);
                let x = args.remove(0);
                return Ok(Expr::mul(vec![
                    Expr::ln(x),
                    Expr::pow(Expr::ln(base), Expr::int(-1)),
                ]));
            }
            return Ok(Expr::ln(args.remove(0)));
        }
        let arg = self.single_argument()?;
        Ok(Expr::func(f, arg))
    }

    /// `(expr)` or a bare operand as in `sin x`
    fn single_argument(&mut self) -> Result<Expr, SigmaError> {
        if self.peek() == Some(&Token::LParen) {
            let mut args = self.call_args(1, 1)?;
            return Ok(args.remove(0));
        }
        self.power()
    }

    fn call_args(&mut self, min: usize, max: usize) -> Result<Vec<Expr>, SigmaError> {
        let start = self.position();
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expr()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(Token::RParen)?;
                break;
            }
        }
        if args.len() < min || args.len() > max {
            return Err(SigmaError::parse_error(format!(
                "expected {} argument(s), found {}",
                if min == max { min.to_string() } else { format!("{} to {}", min, max) },
                args.len()
            ))
            .at_position(start));
        }
        Ok(args)
    }

    fn symbol_arg(&self, e: &Expr) -> Result<String, SigmaError> {
        match e {
            Expr::Symbol(s) => Ok(s.clone()),
            other => Err(SigmaError::parse_error(format!("expected a variable, found '{}'", other))
                .at_position(self.position())),
        }
    }

    fn derivative_call(&mut self) -> Result<Expr, SigmaError> {
        let args = self.call_args(1, 3)?;
        let var = match args.get(1) {
            Some(v) => self.symbol_arg(v)?,
            None => self.ctx.var.clone(),
        };
        let order = match args.get(2) {
            Some(Expr::Number(n)) => n
                .to_i64()
                .and_then(|k| u32::try_from(k).ok())
                .filter(|k| *k >= 1)
                .ok_or_else(|| SigmaError::parse_error("derivative order must be a positive integer"))?,
            Some(_) => return Err(SigmaError::parse_error("derivative order must be a positive integer")),
            None => 1,
        };
        let mut it = args.into_iter();
        let inner = it.next().unwrap_or_else(|| Expr::int(0));
        Ok(Expr::Derivative(Box::new(inner), var, order))
    }

    fn integral_call(&mut self) -> Result<Expr, SigmaError> {
        let args = self.call_args(1, 4)?;
        if args.len() == 3 {
            return Err(SigmaError::parse_error("definite integrals need both bounds"));
        }
        let var = match args.get(1) {
            Some(v) => self.symbol_arg(v)?,
            None => self.ctx.var.clone(),
        };
        let mut it = args.into_iter();
        let integrand = it.next().unwrap_or_else(|| Expr::int(0));
        let _ = it.next();
        let bounds = match (it.next(), it.next()) {
            (Some(lo), Some(hi)) => Some((Box::new(lo), Box::new(hi))),
            _ => None,
        };
        Ok(Expr::Integral { integrand: Box::new(integrand), var, bounds })
    }

    fn limit_call(&mut self) -> Result<Expr, SigmaError> {
        let args = self.call_args(3, 3)?;
        let var = self.symbol_arg(&args[1])?;
        let mut it = args.into_iter();
        let expr = it.next().unwrap_or_else(|| Expr::int(0));
        let _ = it.next();
        let point = it.next().unwrap_or_else(|| Expr::int(0));
        Ok(Expr::Limit {
            expr: Box::new(expr),
            var,
            point: Box::new(point),
            dir: Default::default(),
        })
    }
}

/// Names that denote a fixed value
fn atom(name: &str) -> Option<Expr> {
    Some(match name {
        "pi" => Expr::pi(),
        "e" | "E" => Expr::Constant(crate::ast::Constant::E),
        "oo" | "inf" | "infinity" | "Infinity" => Expr::infinity(),
        "I" => Expr::imaginary(),
        "nan" => Expr::undefined(),
        "True" | "true" => Expr::Bool(true),
        "False" | "false" => Expr::Bool(false),
        _ => return None,
    })
}

/// `xy` is `x*y`; known names and identifiers with digits stay whole
fn should_split(name: &str) -> bool {
    name.chars().count() > 1
        && name.chars().all(|c| c.is_ascii_alphabetic())
        && !GREEK.contains(&name)
        && !RESERVED.contains(&name)
        && !KEYWORDS.contains(&name)
        && Function::from_name(name).is_none()
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
    use crate::ast::Constant;

    fn p(s: &str) -> Expr {
        parse_infix(s).unwrap()
    }

    #[test]
    fn test_no_evaluation() {
        let e = p("2x + 3x");
        assert_eq!(
            e,
            Expr::Add(vec![
                Expr::Mul(vec![Expr::int(2), Expr::sym("x")]),
                Expr::Mul(vec![Expr::int(3), Expr::sym("x")]),
            ])
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(p("-x^2"), Expr::Mul(vec![Expr::int(-1), Expr::pow(Expr::sym("x"), Expr::int(2))]));
        assert_eq!(
            p("2^3^2"),
            Expr::pow(Expr::int(2), Expr::pow(Expr::int(3), Expr::int(2)))
        );
        assert_eq!(p("x - 4"), Expr::Add(vec![Expr::sym("x"), Expr::int(-4)]));
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(p("2(x+1)").to_string(), "2*(x + 1)");
        assert_eq!(p("xy"), Expr::Mul(vec![Expr::sym("x"), Expr::sym("y")]));
        assert_eq!(p("x(x+1)").to_string(), "x*(x + 1)");
    }

    #[test]
    fn test_functions() {
        assert_eq!(p("sin(x^2)"), Expr::func(Function::Sin, Expr::pow(Expr::sym("x"), Expr::int(2))));
        assert_eq!(p("sqrt(x)"), Expr::sqrt(Expr::sym("x")));
        assert_eq!(p("e^x"), Expr::pow(Expr::Constant(Constant::E), Expr::sym("x")));
        assert_eq!(p("sin^2(x)").to_string(), "sin(x)^2");
    }

    #[test]
    fn test_applications() {
        assert_eq!(p("C(5,2)"), Expr::Apply("C".into(), vec![Expr::int(5), Expr::int(2)]));
        assert_eq!(p("f(x)"), Expr::Apply("f".into(), vec![Expr::sym("x")]));
    }

    #[test]
    fn test_logic() {
        let e = p("p & q | ~r");
        assert!(matches!(e, Expr::Or(ref v) if v.len() == 2));
        assert!(matches!(p("p -> q"), Expr::Implies(_, _)));
        assert!(matches!(p("a and b"), Expr::And(_)));
    }

    #[test]
    fn test_equation_rejected_in_infix() {
        assert!(parse_infix("x = 1").is_err());
        let eq = parse_equation("x^2 + 3x - 4 = 0", &ParseContext::default()).unwrap();
        assert!(matches!(eq, Expr::Equation(_, _)));
    }

    #[test]
    fn test_primes_with_context() {
        let ctx = ParseContext::default().with_function("y");
        let e = parse_equation("y'' + y = 0", &ctx).unwrap();
        let y = Expr::Apply("y".into(), vec![Expr::sym("x")]);
        assert_eq!(
            e,
            Expr::equation(
                Expr::Add(vec![Expr::Derivative(Box::new(y.clone()), "x".into(), 2), y]),
                Expr::int(0)
            )
        );
    }

    #[test]
    fn test_prime_on_applied_function() {
        let ctx = ParseContext::default().with_function("y");
        let y = Expr::Apply("y".into(), vec![Expr::sym("x")]);
        let e = parse_equation("y'(x) = y(x)", &ctx).unwrap();
        assert_eq!(e, Expr::equation(Expr::Derivative(Box::new(y.clone()), "x".into(), 1), y));

        let ctx = ParseContext::default().with_function("f").with_var("t");
        let e = parse_equation("f''(t) + f(t) = 0", &ctx).unwrap();
        let Expr::Equation(lhs, _) = e else { panic!("not an equation") };
        let f = Expr::Apply("f".into(), vec![Expr::sym("t")]);
        assert_eq!(
            *lhs,
            Expr::Add(vec![Expr::Derivative(Box::new(f.clone()), "t".into(), 2), f])
        );
    }

    #[test]
    fn test_derivative_call() {
        let ctx = ParseContext::default().with_function("y");
        let e = parse_infix_with("Derivative(y(x), x, 2)", &ctx).unwrap();
        assert!(matches!(e, Expr::Derivative(_, ref v, 2) if v == "x"));
    }

    #[test]
    fn test_errors_have_positions() {
        let err = parse_infix("x + * 2").unwrap_err();
        assert_eq!(err.context.unwrap().position, Some(4));
        assert!(parse_infix("").is_err());
        assert!(parse_infix("(x + 1").is_err());
    }

    #[test]
    fn test_tidy_query() {
        assert_eq!(tidy_query("  x^2 - 1. "), "x^2 - 1");
        assert_eq!(tidy_query("what is 2+2?"), "what is 2+2");
    }

    #[test]
    fn test_unicode_powers_and_roots() {
        assert_eq!(p("x²"), Expr::pow(Expr::sym("x"), Expr::int(2)));
        assert_eq!(p("√x"), Expr::sqrt(Expr::sym("x")));
        assert_eq!(p("√(x+1)"), Expr::sqrt(Expr::Add(vec![Expr::sym("x"), Expr::int(1)])));
        assert_eq!(
            p("2√x"),
            Expr::Mul(vec![Expr::int(2), Expr::sqrt(Expr::sym("x"))])
        );
        assert_eq!(p("2×π"), Expr::Mul(vec![Expr::int(2), Expr::pi()]));
    }
}
