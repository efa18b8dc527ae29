//! Dense univariate polynomials with exact rational coefficients

use crate::ast::Expr;
use crate::simplify::{make_add, make_mul, make_pow};
use sigma_core::Number;

/// Largest exponent expanded when converting an expression to a polynomial
const MAX_DEGREE: i64 = 1_000;

/// Largest constant term whose divisors are enumerated for rational roots
const MAX_ROOT_SEARCH: i64 = 10_000_000;

/// Coefficients stored low degree first, without trailing zeros
#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    coeffs: Vec<Number>,
}

impl Poly {
    pub fn new(mut coeffs: Vec<Number>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    pub fn constant(c: Number) -> Self {
        Self::new(vec![c])
    }

    /// The polynomial `x`
    pub fn x() -> Self {
        Self::new(vec![Number::zero(), Number::one()])
    }

    /// `x - r`
    pub fn linear_factor(r: &Number) -> Self {
        Self::new(vec![r.neg(), Number::one()])
    }

    /// Read `e` as a polynomial in `var`; `None` if any other symbol or a
    /// non-polynomial construct occurs
    pub fn from_expr(e: &Expr, var: &str) -> Option<Self> {
        match e {
            Expr::Number(n) => Some(Self::constant(n.clone())),
            Expr::Symbol(s) if s == var => Some(Self::x()),
            Expr::Add(terms) => {
                let mut acc = Self::zero();
                for t in terms {
                    acc = acc.add(&Self::from_expr(t, var)?);
                }
                Some(acc)
            }
            Expr::Mul(factors) => {
                let mut acc = Self::constant(Number::one());
                for f in factors {
                    acc = acc.mul(&Self::from_expr(f, var)?);
                }
                Some(acc)
            }
            Expr::Pow(b, k) => {
                let k = k.as_number()?;
                if !k.is_exact_integer() || k.is_negative() {
                    return None;
                }
                let k = k.to_i64().filter(|k| *k <= MAX_DEGREE)?;
                let base = Self::from_expr(b, var)?;
                let mut acc = Self::constant(Number::one());
                for _ in 0..k {
                    acc = acc.mul(&base);
                }
                Some(acc)
            }
            _ => None,
        }
    }

    // ========== Queries ==========

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn coeffs(&self) -> &[Number] {
        &self.coeffs
    }

    pub fn coeff(&self, k: usize) -> Number {
        self.coeffs.get(k).cloned().unwrap_or_else(Number::zero)
    }

    /// Leading coefficient (zero for the zero polynomial)
    pub fn lc(&self) -> Number {
        self.coeffs.last().cloned().unwrap_or_else(Number::zero)
    }

    pub fn eval(&self, x: &Number) -> Number {
        self.coeffs
            .iter()
            .rev()
            .fold(Number::zero(), |acc, c| acc.mul(x).add(c))
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..n).map(|i| self.coeff(i).add(&other.coeff(i))).collect())
    }

    pub fn sub(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..n).map(|i| self.coeff(i).sub(&other.coeff(i))).collect())
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut out = vec![Number::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j].add(&a.mul(b));
            }
        }
        Self::new(out)
    }

    pub fn scale(&self, c: &Number) -> Self {
        Self::new(self.coeffs.iter().map(|a| a.mul(c)).collect())
    }

    /// Quotient and remainder; `None` when dividing by zero
    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        if divisor.is_zero() {
            return None;
        }
        let lc = divisor.lc();
        let dd = divisor.degree();
        let mut rem = self.clone();
        let mut quot = vec![Number::zero(); self.coeffs.len().saturating_sub(dd).max(1)];
        while !rem.is_zero() && rem.degree() >= dd {
            let shift = rem.degree() - dd;
            let factor = rem.lc().checked_div(&lc).ok()?;
            quot[shift] = factor.clone();
            let mut sub = vec![Number::zero(); shift];
            sub.extend(divisor.coeffs.iter().map(|c| c.mul(&factor)));
            let before = rem.degree();
            rem = rem.sub(&Self::new(sub));
            // guard against approximate coefficients that never cancel
            if !rem.is_zero() && rem.degree() >= before {
                let mut c = rem.coeffs;
                c.pop();
                rem = Self::new(c);
            }
        }
        Some((Self::new(quot), rem))
    }

    /// Monic greatest common divisor
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = match a.div_rem(&b) {
                Some((_, r)) => r,
                None => break,
            };
            a = b;
            b = r;
        }
        a.monic()
    }

    pub fn monic(&self) -> Self {
        match self.lc().recip() {
            Ok(inv) => self.scale(&inv),
            Err(_) => self.clone(),
        }
    }

    pub fn derivative(&self) -> Self {
        Self::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c.mul(&Number::from_i64(i as i64)))
                .collect(),
        )
    }

    /// Split into `content * primitive` where the primitive part has coprime
    /// integer coefficients and a positive leading coefficient
    pub fn primitive(&self) -> (Number, Self) {
        if self.is_zero() {
            return (Number::one(), self.clone());
        }
        let mut den = Number::one();
        for c in &self.coeffs {
            if let Some(l) = den.lcm(&Number::from_ibig(c.denom())) {
                den = l;
            }
        }
        let mut num = Number::zero();
        for c in &self.coeffs {
            let scaled = c.mul(&den);
            if let Some(g) = num.gcd(&scaled) {
                num = g;
            }
        }
        if num.is_zero() {
            return (Number::one(), self.clone());
        }
        let mut content = num.checked_div(&den).unwrap_or_else(|_| Number::one());
        if self.lc().is_negative() {
            content = content.neg();
        }
        match content.recip() {
            Ok(inv) => (content, self.scale(&inv)),
            Err(_) => (Number::one(), self.clone()),
        }
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        let x = Expr::sym(var);
        let terms = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(k, c)| make_mul(vec![Expr::Number(c.clone()), make_pow(x.clone(), Expr::int(k as i64))]))
            .collect();
        make_add(terms)
    }

    // ========== Roots ==========

    /// Exact rational roots with multiplicity, ascending, plus the deflated
    /// polynomial that holds the remaining roots
    pub fn rational_roots(&self) -> (Vec<(Number, usize)>, Poly) {
        let mut rest = self.clone();
        let mut roots: Vec<(Number, usize)> = Vec::new();
        if rest.degree() == 0 || rest.coeffs.iter().any(|c| !c.is_exact()) {
            return (roots, rest);
        }

        let mut zero_mult = 0;
        while rest.degree() > 0 && rest.coeff(0).is_zero() {
            rest = Self::new(rest.coeffs[1..].to_vec());
            zero_mult += 1;
        }
        if zero_mult > 0 {
            roots.push((Number::zero(), zero_mult));
        }

        let (_, prim) = rest.primitive();
        let a0 = prim.coeff(0).abs().to_i64();
        let an = prim.lc().abs().to_i64();
        if let (Some(a0), Some(an)) = (a0, an) {
            if a0 <= MAX_ROOT_SEARCH && an <= MAX_ROOT_SEARCH {
                let mut candidates = Vec::new();
                for p in divisors(a0) {
                    for q in divisors(an) {
                        let c = Number::from_ratio(p, q);
                        if !candidates.contains(&c) {
                            candidates.push(c.clone());
                            candidates.push(c.neg());
                        }
                    }
                }
                candidates.sort();
                for c in candidates {
                    let mut mult = 0;
                    while rest.degree() > 0 && rest.eval(&c).is_zero() {
                        match rest.div_rem(&Self::linear_factor(&c)) {
                            Some((q, _)) => rest = q,
                            None => break,
                        }
                        mult += 1;
                    }
                    if mult > 0 {
                        roots.push((c, mult));
                    }
                }
            }
        }
        roots.sort_by(|a, b| a.0.cmp(&b.0));
        (roots, rest)
    }
}

fn divisors(n: i64) -> Vec<i64> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d * d != n {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

/// Coefficients of `e` as a polynomial in `var` whose coefficients may be
/// arbitrary expressions free of `var`. `e` should already be expanded.
pub fn collect_in(e: &Expr, var: &str) -> Option<Vec<Expr>> {
    let terms: Vec<Expr> = match e {
        Expr::Add(ts) => ts.clone(),
        other => vec![other.clone()],
    };
    let mut buckets: Vec<Vec<Expr>> = Vec::new();
    for t in terms {
        let factors = match t {
            Expr::Mul(fs) => fs,
            other => vec![other],
        };
        let mut degree = 0usize;
        let mut coeff = Vec::new();
        for f in factors {
            match &f {
                Expr::Symbol(s) if s == var => degree += 1,
                Expr::Pow(b, k) if b.is_symbol(var) => {
                    let k = k.as_number()?;
                    if !k.is_exact_integer() || k.is_negative() {
                        return None;
                    }
                    degree += usize::try_from(k.to_i64()?).ok()?;
                }
                other if other.contains_symbol(var) => return None,
                _ => coeff.push(f),
            }
        }
        if buckets.len() <= degree {
            buckets.resize(degree + 1, Vec::new());
        }
        buckets[degree].push(make_mul(coeff));
    }
    Some(buckets.into_iter().map(make_add).collect())
}

/// Split into numerator and denominator over a common denominator
pub fn as_numer_denom(e: &Expr) -> (Expr, Expr) {
    match e {
        Expr::Number(n) if !n.is_integer() && n.is_exact() => (
            Expr::Number(Number::from_ibig(n.numer())),
            Expr::Number(Number::from_ibig(n.denom())),
        ),
        Expr::Pow(b, k) if k.as_number().is_some_and(|k| k.is_negative()) => {
            let pos = k.as_number().map(|k| k.neg()).unwrap_or_else(Number::one);
            (Expr::int(1), make_pow(b.as_ref().clone(), Expr::Number(pos)))
        }
        Expr::Mul(fs) => {
            let mut nums = Vec::new();
            let mut dens = Vec::new();
            for f in fs {
                let (n, d) = as_numer_denom(f);
                nums.push(n);
                dens.push(d);
            }
            (make_mul(nums), make_mul(dens))
        }
        Expr::Add(terms) => {
            let parts: Vec<(Expr, Expr)> = terms.iter().map(as_numer_denom).collect();
            if parts.iter().all(|(_, d)| d.is_one()) {
                return (e.clone(), Expr::int(1));
            }
            let mut dens: Vec<Expr> = Vec::new();
            for (_, d) in &parts {
                if !d.is_one() && !dens.contains(d) {
                    dens.push(d.clone());
                }
            }
            let nums = parts
                .into_iter()
                .map(|(n, d)| {
                    let mut factors = vec![n];
                    factors.extend(dens.iter().filter(|x| **x != d).cloned());
                    make_mul(factors)
                })
                .collect();
            (make_add(nums), make_mul(dens))
        }
        _ => (e.clone(), Expr::int(1)),
    }
}
