//! Exact numbers using dashu
//!
//! Numbers are exact rationals (dashu-ratio `RBig`) whenever the value came
//! from literal input or exact arithmetic. Values produced by a numeric
//! fallback (for example an irrational eigenvalue found iteratively) are kept
//! as approximate `f64` and stay approximate through further arithmetic.

use dashu_int::IBig;
use dashu_ratio::RBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Overflow: result too large")]
    Overflow,
}

/// Largest exponent accepted by exact integer powers and scientific notation
const MAX_EXACT_EXPONENT: i64 = 10_000;

/// Largest argument accepted by exact factorials
const MAX_FACTORIAL: u64 = 5_000;

#[derive(Debug, Clone)]
enum Repr {
    Exact(RBig),
    Approx(f64),
}

/// Exact rational number with an approximate escape hatch.
///
/// All operations return Results or new Numbers - never panic.
#[derive(Debug, Clone)]
pub struct Number {
    inner: Repr,
}

impl Number {
    // ========== Construction ==========

    /// Create from string representation
    /// Supports: "123", "3.14", "1/3", "1.5e10", "-42"
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NumberError::ParseError(s.to_string()));
        }

        // Rational format "a/b"
        if let Some((num_str, den_str)) = s.split_once('/') {
            let num = parse_int(num_str.trim()).ok_or_else(|| NumberError::ParseError(s.to_string()))?;
            let den = parse_int(den_str.trim()).ok_or_else(|| NumberError::ParseError(s.to_string()))?;
            return Self::from_parts(num, den);
        }

        let lower = s.to_ascii_lowercase();
        let (mantissa, exponent) = match lower.split_once('e') {
            Some((m, e)) => {
                let e: i64 = e.parse().map_err(|_| NumberError::ParseError(s.to_string()))?;
                (m, e)
            }
            None => (lower.as_str(), 0),
        };
        if exponent.abs() > MAX_EXACT_EXPONENT {
            return Err(NumberError::Overflow);
        }

        let (negative, digits) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(NumberError::ParseError(s.to_string()));
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(NumberError::ParseError(s.to_string()));
        }

        let all_digits = format!("{}{}", int_part, frac_part);
        let mut num = parse_int(&all_digits).ok_or_else(|| NumberError::ParseError(s.to_string()))?;
        if negative {
            num = -num;
        }
        let scale = exponent - frac_part.len() as i64;
        let ten = IBig::from(10);
        if scale >= 0 {
            num *= ten.pow(scale as usize);
            Ok(Self::exact(RBig::from(num)))
        } else {
            Self::from_parts(num, ten.pow((-scale) as usize))
        }
    }

    /// Create from i64
    pub fn from_i64(n: i64) -> Self {
        Self::exact(RBig::from(IBig::from(n)))
    }

    /// Create from ratio (exact division). A zero denominator yields zero.
    pub fn from_ratio(num: i64, den: i64) -> Self {
        Self::from_parts(IBig::from(num), IBig::from(den)).unwrap_or_else(|_| Self::zero())
    }

    /// Create from big integer numerator and denominator
    pub fn from_parts(num: IBig, den: IBig) -> Result<Self, NumberError> {
        if den == IBig::ZERO {
            return Err(NumberError::DivisionByZero);
        }
        Ok(Self::exact(RBig::from(num) / RBig::from(den)))
    }

    /// Create from a big integer
    pub fn from_ibig(n: IBig) -> Self {
        Self::exact(RBig::from(n))
    }

    /// Create an approximate number
    pub fn from_f64(f: f64) -> Self {
        Self { inner: Repr::Approx(f) }
    }

    pub fn zero() -> Self {
        Self::from_i64(0)
    }

    pub fn one() -> Self {
        Self::from_i64(1)
    }

    fn exact(r: RBig) -> Self {
        Self { inner: Repr::Exact(r) }
    }

    // ========== Predicates ==========

    pub fn is_exact(&self) -> bool {
        matches!(self.inner, Repr::Exact(_))
    }

    pub fn is_zero(&self) -> bool {
        match &self.inner {
            Repr::Exact(r) => *r == RBig::ZERO,
            Repr::Approx(f) => *f == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match &self.inner {
            Repr::Exact(r) => *r == RBig::ONE,
            Repr::Approx(f) => *f == 1.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match &self.inner {
            Repr::Exact(r) => *r < RBig::ZERO,
            Repr::Approx(f) => *f < 0.0,
        }
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && !self.is_negative()
    }

    /// Check if value is an integer
    pub fn is_integer(&self) -> bool {
        match &self.inner {
            Repr::Exact(r) => *r.denominator() == dashu_int::UBig::ONE,
            Repr::Approx(f) => f.is_finite() && f.fract() == 0.0,
        }
    }

    /// Exact integer check (approximate values never qualify)
    pub fn is_exact_integer(&self) -> bool {
        self.is_exact() && self.is_integer()
    }

    pub fn signum(&self) -> i32 {
        if self.is_zero() {
            0
        } else if self.is_negative() {
            -1
        } else {
            1
        }
    }

    // ========== Basic Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        match (&self.inner, &other.inner) {
            (Repr::Exact(a), Repr::Exact(b)) => Self::exact(a + b),
            _ => Self::from_f64(self.as_f64() + other.as_f64()),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        match (&self.inner, &other.inner) {
            (Repr::Exact(a), Repr::Exact(b)) => Self::exact(a - b),
            _ => Self::from_f64(self.as_f64() - other.as_f64()),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        match (&self.inner, &other.inner) {
            (Repr::Exact(a), Repr::Exact(b)) => Self::exact(a * b),
            _ => Self::from_f64(self.as_f64() * other.as_f64()),
        }
    }

    pub fn neg(&self) -> Self {
        match &self.inner {
            Repr::Exact(r) => Self::exact(-r.clone()),
            Repr::Approx(f) => Self::from_f64(-f),
        }
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        Ok(match (&self.inner, &other.inner) {
            (Repr::Exact(a), Repr::Exact(b)) => Self::exact(a / b),
            _ => Self::from_f64(self.as_f64() / other.as_f64()),
        })
    }

    /// Multiplicative inverse
    pub fn recip(&self) -> Result<Self, NumberError> {
        Self::one().checked_div(self)
    }

    /// Integer power (exact for exact bases)
    pub fn pow(&self, exp: i64) -> Result<Self, NumberError> {
        if exp == 0 {
            return Ok(Self::one());
        }
        if exp.abs() > MAX_EXACT_EXPONENT {
            return Err(NumberError::Overflow);
        }
        match &self.inner {
            Repr::Exact(_) => {
                let e = exp.unsigned_abs() as usize;
                let num = self.numer().pow(e);
                let den = self.denom().pow(e);
                if exp > 0 {
                    Self::from_parts(num, den)
                } else {
                    Self::from_parts(den, num)
                }
            }
            Repr::Approx(f) => {
                if *f == 0.0 && exp < 0 {
                    return Err(NumberError::DivisionByZero);
                }
                Ok(Self::from_f64(f.powi(exp as i32)))
            }
        }
    }

    /// Exact power with a rational exponent, when the result is rational.
    ///
    /// Returns `None` for irrational results such as `2^(1/2)`.
    pub fn pow_exact(&self, exp: &Self) -> Option<Self> {
        if !self.is_exact() || !exp.is_exact() {
            return None;
        }
        let p = exp.numer();
        let q = exp.denom();
        let p = i64::try_from(p).ok()?;
        let q = u32::try_from(i64::try_from(q).ok()?).ok()?;
        let root = self.exact_root(q)?;
        root.pow(p).ok()
    }

    /// Exact k-th root of an exact rational, if one exists
    pub fn exact_root(&self, k: u32) -> Option<Self> {
        if k == 0 || !self.is_exact() {
            return None;
        }
        if k == 1 {
            return Some(self.clone());
        }
        if self.is_negative() {
            if k % 2 == 0 {
                return None;
            }
            return self.neg().exact_root(k).map(|r| r.neg());
        }
        let num = integer_root(&self.numer(), k)?;
        let den = integer_root(&self.denom(), k)?;
        Self::from_parts(num, den).ok()
    }

    /// Split a positive integer `n` into `(a, b)` with `n = a^k * b`,
    /// pulling out small perfect k-th power factors.
    pub fn extract_power_factor(&self, k: u32) -> Option<(Self, Self)> {
        if !self.is_exact_integer() || !self.is_positive() || k < 2 {
            return None;
        }
        let mut rest = self.to_i64()?;
        let mut outside: i64 = 1;
        let mut d: i64 = 2;
        while d <= 10_000 {
            let dk = d.checked_pow(k)?;
            if dk > rest {
                break;
            }
            while rest % dk == 0 {
                rest /= dk;
                outside *= d;
            }
            d += 1;
        }
        Some((Self::from_i64(outside), Self::from_i64(rest)))
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }

    /// Greatest common divisor of two exact integers
    pub fn gcd(&self, other: &Self) -> Option<Self> {
        if !self.is_exact_integer() || !other.is_exact_integer() {
            return None;
        }
        let mut a = self.abs().numer();
        let mut b = other.abs().numer();
        while b != IBig::ZERO {
            let r = &a % &b;
            a = b;
            b = r;
        }
        Some(Self::from_ibig(a))
    }

    /// Least common multiple of two exact integers
    pub fn lcm(&self, other: &Self) -> Option<Self> {
        let g = self.gcd(other)?;
        if g.is_zero() {
            return Some(Self::zero());
        }
        self.mul(other).abs().checked_div(&g).ok()
    }

    /// Exact factorial n!
    pub fn factorial(n: u64) -> Result<Self, NumberError> {
        if n > MAX_FACTORIAL {
            return Err(NumberError::Overflow);
        }
        let mut acc = IBig::ONE;
        for i in 2..=n {
            acc *= IBig::from(i);
        }
        Ok(Self::from_ibig(acc))
    }

    /// Exact binomial coefficient C(n, k); zero when k > n
    pub fn binomial(n: u64, k: u64) -> Result<Self, NumberError> {
        if k > n {
            return Ok(Self::zero());
        }
        if n > MAX_FACTORIAL {
            return Err(NumberError::Overflow);
        }
        let k = k.min(n - k);
        let mut acc = IBig::ONE;
        for i in 0..k {
            acc *= IBig::from(n - i);
            acc /= IBig::from(i + 1);
        }
        Ok(Self::from_ibig(acc))
    }

    /// Exact falling factorial n!/(n-k)!
    pub fn permutations(n: u64, k: u64) -> Result<Self, NumberError> {
        if k > n {
            return Ok(Self::zero());
        }
        if n > MAX_FACTORIAL {
            return Err(NumberError::Overflow);
        }
        let mut acc = IBig::ONE;
        for i in (n - k + 1)..=n {
            acc *= IBig::from(i);
        }
        Ok(Self::from_ibig(acc))
    }

    // ========== Conversion ==========

    /// Numerator (approximate values are truncated to an integer)
    pub fn numer(&self) -> IBig {
        match &self.inner {
            Repr::Exact(r) => r.numerator().clone(),
            Repr::Approx(f) => IBig::from(f.trunc() as i64),
        }
    }

    /// Denominator (always positive)
    pub fn denom(&self) -> IBig {
        match &self.inner {
            Repr::Exact(r) => IBig::from(r.denominator().clone()),
            Repr::Approx(_) => IBig::ONE,
        }
    }

    /// Try to convert to i64
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        match &self.inner {
            Repr::Exact(r) => i64::try_from(r.numerator().clone()).ok(),
            Repr::Approx(f) => {
                if f.abs() < 9.0e18 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Convert to f64 (may lose precision)
    pub fn to_f64(&self) -> Option<f64> {
        let f = self.as_f64();
        if f.is_finite() {
            Some(f)
        } else {
            None
        }
    }

    fn as_f64(&self) -> f64 {
        match &self.inner {
            Repr::Exact(r) => {
                let num: f64 = r.numerator().to_string().parse().unwrap_or(f64::NAN);
                let den: f64 = r.denominator().to_string().parse().unwrap_or(f64::NAN);
                num / den
            }
            Repr::Approx(f) => *f,
        }
    }

    /// Render as decimal string with specified decimal places
    pub fn as_decimal(&self, places: u32) -> String {
        match self.to_f64() {
            Some(f) => format!("{:.prec$}", f, prec = places as usize),
            None => self.to_string(),
        }
    }
}

fn parse_int(s: &str) -> Option<IBig> {
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Exact k-th root of a non-negative big integer
fn integer_root(n: &IBig, k: u32) -> Option<IBig> {
    if *n < IBig::ZERO {
        return None;
    }
    if *n == IBig::ZERO || *n == IBig::ONE {
        return Some(n.clone());
    }
    let approx: f64 = n.to_string().parse().ok()?;
    if !approx.is_finite() {
        return None;
    }
    let guess = approx.powf(1.0 / k as f64).round();
    if guess > 1.0e15 {
        return None;
    }
    let guess = guess as i64;
    for candidate in [guess - 1, guess, guess + 1] {
        if candidate < 0 {
            continue;
        }
        let c = IBig::from(candidate);
        if c.pow(k as usize) == *n {
            return Some(c);
        }
    }
    None
}

fn format_approx(f: f64) -> String {
    if !f.is_finite() {
        return format!("{}", f);
    }
    let s = format!("{:.10}", f);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

// ========== Trait Implementations ==========

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Repr::Exact(r) => {
                if self.is_integer() {
                    write!(f, "{}", r.numerator())
                } else {
                    write!(f, "{}/{}", r.numerator(), r.denominator())
                }
            }
            Repr::Approx(x) => write!(f, "{}", format_approx(*x)),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Repr::Exact(a), Repr::Exact(b)) => a == b,
            (Repr::Approx(a), Repr::Approx(b)) => a == b,
            // exact and approximate values never compare equal structurally
            _ => false,
        }
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.inner, &other.inner) {
            (Repr::Exact(a), Repr::Exact(b)) => a.cmp(b),
            _ => self
                .as_f64()
                .partial_cmp(&other.as_f64())
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}
