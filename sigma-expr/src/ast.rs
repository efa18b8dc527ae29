//! Expression tree
//!
//! `Expr` is deliberately non-evaluating: the parsers build it exactly as
//! written (`2x + 3x` stays a sum of two products) and the engine operations
//! in this crate (`canonical`, `expand`, `simplify`, ...) produce new trees.

use serde::{Deserialize, Serialize};
use sigma_core::Number;
use std::collections::BTreeSet;

/// Named mathematical constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Pi,
    E,
    /// Imaginary unit
    I,
    Infinity,
    /// Result of an undefined operation such as `0/0` or `∞ - ∞`
    Undefined,
}

/// Elementary functions of one argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Cot,
    Sec,
    Csc,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Abs,
}

impl Function {
    /// Conventional name. The natural logarithm is `log`.
    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Cot => "cot",
            Function::Sec => "sec",
            Function::Csc => "csc",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Exp => "exp",
            Function::Ln => "log",
            Function::Abs => "Abs",
        }
    }

    /// Look up a function by any of its accepted spellings
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "cot" => Function::Cot,
            "sec" => Function::Sec,
            "csc" => Function::Csc,
            "asin" | "arcsin" => Function::Asin,
            "acos" | "arccos" => Function::Acos,
            "atan" | "arctan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "exp" => Function::Exp,
            "ln" | "log" => Function::Ln,
            "abs" | "Abs" => Function::Abs,
            _ => return None,
        })
    }

    pub fn is_odd(&self) -> bool {
        matches!(
            self,
            Function::Sin
                | Function::Tan
                | Function::Cot
                | Function::Csc
                | Function::Asin
                | Function::Atan
                | Function::Sinh
                | Function::Tanh
        )
    }
}

/// Side from which a limit is approached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Plus,
    Minus,
    Both,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+" => Some(Direction::Plus),
            "-" => Some(Direction::Minus),
            "+-" | "-+" | "both" => Some(Direction::Both),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Direction::Plus => "+",
            Direction::Minus => "-",
            Direction::Both => "+-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Symbol(String),
    Constant(Constant),
    Bool(bool),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Function, Box<Expr>),
    /// Application of an undefined function, e.g. `y(x)` or `C(5, 2)`
    Apply(String, Vec<Expr>),
    Factorial(Box<Expr>),
    /// n-th derivative of an expression with respect to a variable
    Derivative(Box<Expr>, String, u32),
    Integral {
        integrand: Box<Expr>,
        var: String,
        bounds: Option<(Box<Expr>, Box<Expr>)>,
    },
    Limit {
        expr: Box<Expr>,
        var: String,
        point: Box<Expr>,
        dir: Direction,
    },
    Sum {
        term: Box<Expr>,
        var: String,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },
    Equation(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Xor(Vec<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Equivalent(Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    /// Big-O remainder of a truncated series
    Order(Box<Expr>),
}

/// Top-level structural shape, used for rule narration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    Sum(&'a [Expr]),
    Product(&'a [Expr]),
    Power(&'a Expr, &'a Expr),
    Function(Function, &'a Expr),
    Other,
}

impl Expr {
    // ========== Constructors (structure only, no evaluation) ==========

    pub fn int(n: i64) -> Self {
        Expr::Number(Number::from_i64(n))
    }

    pub fn rational(num: i64, den: i64) -> Self {
        Expr::Number(Number::from_ratio(num, den))
    }

    pub fn num(n: Number) -> Self {
        Expr::Number(n)
    }

    pub fn sym(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }

    pub fn pi() -> Self {
        Expr::Constant(Constant::Pi)
    }

    pub fn infinity() -> Self {
        Expr::Constant(Constant::Infinity)
    }

    pub fn neg_infinity() -> Self {
        Expr::Mul(vec![Expr::int(-1), Expr::infinity()])
    }

    pub fn undefined() -> Self {
        Expr::Constant(Constant::Undefined)
    }

    pub fn imaginary() -> Self {
        Expr::Constant(Constant::I)
    }

    pub fn add(terms: Vec<Expr>) -> Self {
        Expr::Add(terms)
    }

    pub fn mul(factors: Vec<Expr>) -> Self {
        Expr::Mul(factors)
    }

    pub fn pow(base: Expr, exp: Expr) -> Self {
        Expr::Pow(Box::new(base), Box::new(exp))
    }

    pub fn func(f: Function, arg: Expr) -> Self {
        Expr::Func(f, Box::new(arg))
    }

    pub fn sqrt(arg: Expr) -> Self {
        Expr::pow(arg, Expr::rational(1, 2))
    }

    pub fn exp(arg: Expr) -> Self {
        Expr::func(Function::Exp, arg)
    }

    pub fn ln(arg: Expr) -> Self {
        Expr::func(Function::Ln, arg)
    }

    pub fn equation(lhs: Expr, rhs: Expr) -> Self {
        Expr::Equation(Box::new(lhs), Box::new(rhs))
    }

    /// `-e`, folding the sign into numeric literals and leading coefficients
    pub fn neg(e: Expr) -> Self {
        match e {
            Expr::Number(n) => Expr::Number(n.neg()),
            Expr::Mul(mut factors) => {
                if let Some(Expr::Number(n)) = factors.first() {
                    let negated = n.neg();
                    if negated.is_one() && factors.len() > 1 {
                        factors.remove(0);
                        if factors.len() == 1 {
                            return factors.remove(0);
                        }
                    } else {
                        factors[0] = Expr::Number(negated);
                    }
                    Expr::Mul(factors)
                } else {
                    let mut all = vec![Expr::int(-1)];
                    all.extend(factors);
                    Expr::Mul(all)
                }
            }
            other => Expr::Mul(vec![Expr::int(-1), other]),
        }
    }

    /// `a - b`
    pub fn sub(a: Expr, b: Expr) -> Self {
        Expr::Add(vec![a, Expr::neg(b)])
    }

    /// `a / b` as `a * b^-1`
    pub fn div(a: Expr, b: Expr) -> Self {
        Expr::Mul(vec![a, Expr::pow(b, Expr::int(-1))])
    }

    // ========== Predicates ==========

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Expr::Number(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_one())
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Expr::Symbol(s) if s == name)
    }

    /// `+∞` or `-∞`
    pub fn is_infinite(&self) -> bool {
        match self {
            Expr::Constant(Constant::Infinity) => true,
            Expr::Mul(fs) => {
                fs.len() == 2
                    && fs[0].is_number()
                    && matches!(fs[1], Expr::Constant(Constant::Infinity))
            }
            _ => false,
        }
    }

    /// True when any undefined or infinite quantity occurs in the tree
    pub fn has_singularity(&self) -> bool {
        match self {
            Expr::Constant(Constant::Infinity) | Expr::Constant(Constant::Undefined) => true,
            _ => self.children().iter().any(|c| c.has_singularity()),
        }
    }

    /// Logical connective or boolean literal at the top level
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            Expr::Bool(_)
                | Expr::Not(_)
                | Expr::And(_)
                | Expr::Or(_)
                | Expr::Xor(_)
                | Expr::Implies(_, _)
                | Expr::Equivalent(_, _)
        )
    }

    pub fn shape(&self) -> Shape<'_> {
        match self {
            Expr::Add(terms) if terms.len() >= 2 => Shape::Sum(terms),
            Expr::Mul(factors) if factors.len() >= 2 => Shape::Product(factors),
            Expr::Pow(base, exp) => Shape::Power(base, exp),
            Expr::Func(f, arg) => Shape::Function(*f, arg),
            _ => Shape::Other,
        }
    }

    // ========== Traversal ==========

    /// Direct children, in order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) | Expr::Bool(_) => Vec::new(),
            Expr::Add(v) | Expr::Mul(v) | Expr::Apply(_, v) | Expr::And(v) | Expr::Or(v)
            | Expr::Xor(v) | Expr::List(v) => v.iter().collect(),
            Expr::Pow(a, b) | Expr::Equation(a, b) | Expr::Implies(a, b) | Expr::Equivalent(a, b) => {
                vec![a.as_ref(), b.as_ref()]
            }
            Expr::Func(_, a) | Expr::Factorial(a) | Expr::Derivative(a, _, _) | Expr::Not(a)
            | Expr::Order(a) => vec![a.as_ref()],
            Expr::Integral { integrand, bounds, .. } => {
                let mut v = vec![integrand.as_ref()];
                if let Some((lo, hi)) = bounds {
                    v.push(lo.as_ref());
                    v.push(hi.as_ref());
                }
                v
            }
            Expr::Limit { expr, point, .. } => vec![expr.as_ref(), point.as_ref()],
            Expr::Sum { term, lower, upper, .. } => vec![term.as_ref(), lower.as_ref(), upper.as_ref()],
        }
    }

    /// Rebuild this node with `f` applied to every direct child
    pub fn map_children<F: FnMut(&Expr) -> Expr>(&self, mut f: F) -> Expr {
        let mut bx = |e: &Expr| Box::new(f(e));
        match self {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) | Expr::Bool(_) => self.clone(),
            Expr::Add(v) => Expr::Add(v.iter().map(|c| *bx(c)).collect()),
            Expr::Mul(v) => Expr::Mul(v.iter().map(|c| *bx(c)).collect()),
            Expr::Apply(name, v) => Expr::Apply(name.clone(), v.iter().map(|c| *bx(c)).collect()),
            Expr::And(v) => Expr::And(v.iter().map(|c| *bx(c)).collect()),
            Expr::Or(v) => Expr::Or(v.iter().map(|c| *bx(c)).collect()),
            Expr::Xor(v) => Expr::Xor(v.iter().map(|c| *bx(c)).collect()),
            Expr::List(v) => Expr::List(v.iter().map(|c| *bx(c)).collect()),
            Expr::Pow(a, b) => {
                let a = bx(a);
                Expr::Pow(a, bx(b))
            }
            Expr::Equation(a, b) => {
                let a = bx(a);
                Expr::Equation(a, bx(b))
            }
            Expr::Implies(a, b) => {
                let a = bx(a);
                Expr::Implies(a, bx(b))
            }
            Expr::Equivalent(a, b) => {
                let a = bx(a);
                Expr::Equivalent(a, bx(b))
            }
            Expr::Func(func, a) => Expr::Func(*func, bx(a)),
            Expr::Factorial(a) => Expr::Factorial(bx(a)),
            Expr::Derivative(a, v, n) => Expr::Derivative(bx(a), v.clone(), *n),
            Expr::Not(a) => Expr::Not(bx(a)),
            Expr::Order(a) => Expr::Order(bx(a)),
            Expr::Integral { integrand, var, bounds } => {
                let integrand = bx(integrand);
                let bounds = match bounds {
                    Some((lo, hi)) => {
                        let lo = bx(lo);
                        Some((lo, bx(hi)))
                    }
                    None => None,
                };
                Expr::Integral { integrand, var: var.clone(), bounds }
            }
            Expr::Limit { expr, var, point, dir } => {
                let expr = bx(expr);
                Expr::Limit { expr, var: var.clone(), point: bx(point), dir: *dir }
            }
            Expr::Sum { term, var, lower, upper } => {
                let term = bx(term);
                let lower = bx(lower);
                Expr::Sum { term, var: var.clone(), lower, upper: bx(upper) }
            }
        }
    }

    /// Does the symbol occur free anywhere in the tree
    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Symbol(s) => s == name,
            Expr::Integral { var, bounds: Some((lo, hi)), .. } if var == name => {
                lo.contains_symbol(name) || hi.contains_symbol(name)
            }
            Expr::Sum { var, lower, upper, .. } if var == name => {
                lower.contains_symbol(name) || upper.contains_symbol(name)
            }
            _ => self.children().iter().any(|c| c.contains_symbol(name)),
        }
    }

    /// Does `sub` occur as a subtree
    pub fn contains(&self, sub: &Expr) -> bool {
        self == sub || self.children().iter().any(|c| c.contains(sub))
    }

    /// Free symbol names, sorted
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Symbol(s) => {
                out.insert(s.clone());
            }
            _ => {
                for c in self.children() {
                    c.collect_symbols(out);
                }
            }
        }
    }

    /// Names of undefined functions applied in the tree, e.g. `y` in `y(x)`
    pub fn applied_functions(&self) -> Vec<Expr> {
        let mut out: Vec<Expr> = Vec::new();
        self.collect_applied(&mut out);
        out
    }

    fn collect_applied(&self, out: &mut Vec<Expr>) {
        if let Expr::Apply(_, args) = self {
            if !args.is_empty() && args.iter().all(|a| matches!(a, Expr::Symbol(_))) && !out.contains(self) {
                out.push(self.clone());
            }
        }
        for c in self.children() {
            c.collect_applied(out);
        }
    }

    /// Replace every free occurrence of a symbol (no evaluation)
    pub fn substitute(&self, name: &str, with: &Expr) -> Expr {
        match self {
            Expr::Symbol(s) if s == name => with.clone(),
            _ => self.map_children(|c| c.substitute(name, with)),
        }
    }

    /// Replace every occurrence of a subtree (no evaluation)
    pub fn replace(&self, target: &Expr, with: &Expr) -> Expr {
        if self == target {
            return with.clone();
        }
        self.map_children(|c| c.replace(target, with))
    }

    /// Depth of the tree, a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

impl From<Number> for Expr {
    fn from(n: Number) -> Self {
        Expr::Number(n)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::int(n)
    }
}
