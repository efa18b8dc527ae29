//! Canonical form and simplification
//!
//! `canonical` performs the automatic evaluation every symbolic engine does on
//! construction: flatten sums and products, fold numbers, collect like terms,
//! merge powers of a common base and evaluate special function values.
//! `simplify` goes further and picks the smallest of several rewrites.

use crate::ast::{Constant, Expr, Function};
use crate::eval::apply_function;
use crate::expand::expand;
use crate::poly::{as_numer_denom, Poly};
use sigma_core::Number;
use std::cmp::Ordering;

/// Largest integer built while pulling perfect powers out of a radical
const MAX_RADICAND: i64 = 1_000_000_000_000;

pub fn canonical(e: &Expr) -> Expr {
    match e {
        Expr::Add(v) => make_add(v.iter().map(canonical).collect()),
        Expr::Mul(v) => make_mul(v.iter().map(canonical).collect()),
        Expr::Pow(a, b) => make_pow(canonical(a), canonical(b)),
        Expr::Func(f, a) => make_func(*f, canonical(a)),
        Expr::Factorial(a) => make_factorial(canonical(a)),
        Expr::Apply(name, args) => make_apply(name, args.iter().map(canonical).collect()),
        Expr::Not(_) | Expr::And(_) | Expr::Or(_) | Expr::Xor(_) | Expr::Implies(_, _)
        | Expr::Equivalent(_, _) => make_logic(e.map_children(canonical)),
        _ => e.map_children(canonical),
    }
}

// ========== Sums ==========

/// Split a term into numeric coefficient and the rest
pub fn split_coeff(e: &Expr) -> (Number, Expr) {
    match e {
        Expr::Number(n) => (n.clone(), Expr::int(1)),
        Expr::Mul(fs) => match fs.first() {
            Some(Expr::Number(n)) => {
                let rest: Vec<Expr> = fs[1..].to_vec();
                let rest = if rest.len() == 1 {
                    rest.into_iter().next().unwrap_or_else(|| Expr::int(1))
                } else {
                    Expr::Mul(rest)
                };
                (n.clone(), rest)
            }
            _ => (Number::one(), e.clone()),
        },
        _ => (Number::one(), e.clone()),
    }
}

fn with_coeff(c: Number, rest: Expr) -> Expr {
    if c.is_one() {
        return rest;
    }
    match rest {
        Expr::Mul(fs) => {
            let mut all = vec![Expr::Number(c)];
            all.extend(fs);
            Expr::Mul(all)
        }
        Expr::Number(n) => Expr::Number(c.mul(&n)),
        other => Expr::Mul(vec![Expr::Number(c), other]),
    }
}

/// `Some(1)` for `+∞`, `Some(-1)` for `-∞`
fn infinity_sign(e: &Expr) -> Option<i32> {
    match e {
        Expr::Constant(Constant::Infinity) => Some(1),
        Expr::Mul(fs) if fs.len() == 2 && matches!(fs[1], Expr::Constant(Constant::Infinity)) => {
            fs[0].as_number().map(|n| n.signum())
        }
        _ => None,
    }
}

pub fn make_add(terms: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(terms.len());
    for t in terms {
        match t {
            Expr::Add(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut constant = Number::zero();
    let mut collected: Vec<(Expr, Number)> = Vec::new();
    let (mut pos_inf, mut neg_inf) = (false, false);

    for t in flat {
        match &t {
            Expr::Number(n) => {
                constant = constant.add(n);
                continue;
            }
            Expr::Constant(Constant::Undefined) => return Expr::undefined(),
            _ => {}
        }
        match infinity_sign(&t) {
            Some(s) if s > 0 => {
                pos_inf = true;
                continue;
            }
            Some(s) if s < 0 => {
                neg_inf = true;
                continue;
            }
            _ => {}
        }
        let (c, rest) = split_coeff(&t);
        match collected.iter_mut().find(|(r, _)| *r == rest) {
            Some((_, acc)) => *acc = acc.add(&c),
            None => collected.push((rest, c)),
        }
    }

    if pos_inf && neg_inf {
        return Expr::undefined();
    }

    let mut out: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(rest, c)| with_coeff(c, rest))
        .collect();

    if pos_inf || neg_inf {
        let inf = if pos_inf { Expr::infinity() } else { Expr::neg_infinity() };
        if out.is_empty() {
            return inf;
        }
        out.push(inf);
    } else if !constant.is_zero() {
        out.push(Expr::Number(constant));
    }

    out.sort_by(add_order);
    match out.len() {
        0 => Expr::int(0),
        1 => out.remove(0),
        _ => Expr::Add(out),
    }
}

/// Polynomial degree of a term in all of its symbols
pub fn term_degree(e: &Expr) -> Number {
    match e {
        Expr::Symbol(_) | Expr::Apply(..) => Number::one(),
        Expr::Pow(b, k) => match (b.as_ref(), k.as_number()) {
            (Expr::Symbol(_), Some(k)) => k.clone(),
            (Expr::Add(_), Some(k)) => k.clone(),
            _ => Number::zero(),
        },
        Expr::Mul(fs) => fs.iter().fold(Number::zero(), |acc, f| acc.add(&term_degree(f))),
        Expr::Add(ts) => ts.iter().map(term_degree).max().unwrap_or_else(Number::zero),
        _ => Number::zero(),
    }
}

fn add_order(a: &Expr, b: &Expr) -> Ordering {
    let last = |e: &Expr| e.is_number() || infinity_sign(e).is_some();
    last(a)
        .cmp(&last(b))
        .then_with(|| term_degree(b).cmp(&term_degree(a)))
        .then_with(|| split_coeff(a).1.to_string().cmp(&split_coeff(b).1.to_string()))
}

// ========== Products ==========

/// Base and exponent of a factor; `exp(u)` is `E^u`
pub fn base_exp(e: &Expr) -> (Expr, Expr) {
    match e {
        Expr::Pow(b, k) => (b.as_ref().clone(), k.as_ref().clone()),
        Expr::Func(Function::Exp, a) => (Expr::Constant(Constant::E), a.as_ref().clone()),
        other => (other.clone(), Expr::int(1)),
    }
}

fn mul_rank(e: &Expr) -> u8 {
    match e {
        Expr::Number(_) => 0,
        Expr::Constant(Constant::Infinity) => 7,
        Expr::Constant(_) => 1,
        Expr::Symbol(_) => 2,
        Expr::Apply(..) => 3,
        Expr::Pow(b, _) => mul_rank(b).max(2),
        Expr::Func(..) => 4,
        Expr::Add(_) => 5,
        _ => 6,
    }
}

fn mul_order(a: &Expr, b: &Expr) -> Ordering {
    let key = |e: &Expr| match e {
        Expr::Pow(base, _) => base.to_string(),
        other => other.to_string(),
    };
    mul_rank(a).cmp(&mul_rank(b)).then_with(|| key(a).cmp(&key(b)))
}

pub fn make_mul(factors: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(factors.len());
    for f in factors {
        match f {
            Expr::Mul(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut coeff = Number::one();
    let mut infinite = false;
    let mut groups: Vec<(Expr, Vec<Expr>)> = Vec::new();
    for f in flat {
        match f {
            Expr::Number(n) => coeff = coeff.mul(&n),
            Expr::Constant(Constant::Undefined) => return Expr::undefined(),
            Expr::Constant(Constant::Infinity) => infinite = true,
            other => {
                let (b, k) = base_exp(&other);
                match groups.iter_mut().find(|(gb, _)| *gb == b) {
                    Some((_, ks)) => ks.push(k),
                    None => groups.push((b, vec![k])),
                }
            }
        }
    }

    if coeff.is_zero() {
        return if infinite { Expr::undefined() } else { Expr::int(0) };
    }

    let mut rest = Vec::new();
    for (b, mut ks) in groups {
        let k = if ks.len() == 1 { ks.remove(0) } else { make_add(ks) };
        match make_pow(b, k) {
            Expr::Number(n) => coeff = coeff.mul(&n),
            Expr::Constant(Constant::Undefined) => return Expr::undefined(),
            Expr::Mul(fs) => {
                for f in fs {
                    match f {
                        Expr::Number(n) => coeff = coeff.mul(&n),
                        other => rest.push(other),
                    }
                }
            }
            other => rest.push(other),
        }
    }
    if coeff.is_zero() {
        return Expr::int(0);
    }

    if infinite {
        let sign = Expr::int(i64::from(coeff.signum()));
        rest.sort_by(mul_order);
        let mut all = vec![sign];
        all.extend(rest);
        all.push(Expr::infinity());
        if all.len() == 2 && all[0].is_one() {
            return Expr::infinity();
        }
        return Expr::Mul(all);
    }

    // numeric coefficient distributes over a lone sum
    if !coeff.is_one() && rest.len() == 1 {
        if let Expr::Add(terms) = &rest[0] {
            let c = coeff.clone();
            return make_add(
                terms
                    .iter()
                    .map(|t| make_mul(vec![Expr::Number(c.clone()), t.clone()]))
                    .collect(),
            );
        }
    }

    rest.sort_by(mul_order);
    if rest.is_empty() {
        return Expr::Number(coeff);
    }
    if coeff.is_one() {
        if rest.len() == 1 {
            return rest.remove(0);
        }
        return Expr::Mul(rest);
    }
    let mut all = vec![Expr::Number(coeff)];
    all.extend(rest);
    Expr::Mul(all)
}

// ========== Powers ==========

pub fn make_pow(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() {
        return Expr::int(1);
    }
    if exp.is_one() {
        return base;
    }
    if base.is_one() {
        // 1^oo is indeterminate
        return if exp.has_singularity() { Expr::undefined() } else { Expr::int(1) };
    }
    if matches!(base, Expr::Constant(Constant::Undefined)) || matches!(exp, Expr::Constant(Constant::Undefined)) {
        return Expr::undefined();
    }

    match (&base, &exp) {
        (Expr::Number(b), Expr::Number(k)) => number_pow(b, k),
        (Expr::Constant(Constant::E), _) => make_func(Function::Exp, exp),
        (Expr::Constant(Constant::I), Expr::Number(k)) if k.is_exact_integer() => {
            let r = k.to_i64().map(|v| v.rem_euclid(4)).unwrap_or(0);
            match r {
                0 => Expr::int(1),
                1 => Expr::imaginary(),
                2 => Expr::int(-1),
                _ => Expr::Mul(vec![Expr::int(-1), Expr::imaginary()]),
            }
        }
        (Expr::Constant(Constant::Infinity), Expr::Number(k)) => {
            if k.is_negative() {
                Expr::int(0)
            } else {
                Expr::infinity()
            }
        }
        (Expr::Pow(b, k1), Expr::Number(k2)) if k2.is_exact_integer() => {
            make_pow(b.as_ref().clone(), make_mul(vec![k1.as_ref().clone(), exp.clone()]))
        }
        (Expr::Func(Function::Exp, a), _) => {
            make_func(Function::Exp, make_mul(vec![a.as_ref().clone(), exp.clone()]))
        }
        (Expr::Mul(fs), Expr::Number(k)) if k.is_exact_integer() => {
            make_mul(fs.iter().map(|f| make_pow(f.clone(), exp.clone())).collect())
        }
        (Expr::Mul(fs), Expr::Number(_)) if fs.first().and_then(|f| f.as_number()).is_some_and(|n| n.is_positive()) => {
            let c = fs[0].clone();
            let rest = if fs.len() == 2 { fs[1].clone() } else { Expr::Mul(fs[1..].to_vec()) };
            make_mul(vec![make_pow(c, exp.clone()), Expr::pow(rest, exp.clone())])
        }
        _ => Expr::pow(base, exp),
    }
}

fn number_pow(b: &Number, k: &Number) -> Expr {
    if k.is_exact_integer() {
        return match k.to_i64() {
            Some(e) => match b.pow(e) {
                Ok(n) => Expr::Number(n),
                Err(sigma_core::NumberError::DivisionByZero) => Expr::undefined(),
                Err(_) => Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone())),
            },
            None => Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone())),
        };
    }
    if !b.is_exact() || !k.is_exact() {
        return match (b.to_f64(), k.to_f64()) {
            (Some(x), Some(y)) if x >= 0.0 => Expr::Number(Number::from_f64(x.powf(y))),
            _ => Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone())),
        };
    }
    if b.is_zero() {
        return if k.is_positive() { Expr::int(0) } else { Expr::undefined() };
    }
    let unevaluated = || Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone()));
    let (p, q) = match (i64::try_from(k.numer()).ok(), i64::try_from(k.denom()).ok()) {
        (Some(p), Some(q)) => (p, q),
        _ => return unevaluated(),
    };

    if b.is_negative() {
        if q == 2 {
            return make_mul(vec![
                make_pow(Expr::Number(b.neg()), Expr::Number(k.clone())),
                make_pow(Expr::imaginary(), Expr::int(p)),
            ]);
        }
        return unevaluated();
    }
    if let Some(exact) = b.pow_exact(k) {
        return Expr::Number(exact);
    }

    // b^(p/q) = b^whole * b^(s/q) with 0 < s < q
    let whole = p.div_euclid(q);
    let s = p.rem_euclid(q);
    let num = Number::from_ibig(b.numer());
    let den = Number::from_ibig(b.denom());
    let radicand = match (num.pow(s), den.pow(s * (q - 1))) {
        (Ok(a), Ok(d)) => a.mul(&d),
        _ => return unevaluated(),
    };
    if radicand.to_i64().map_or(true, |r| r > MAX_RADICAND) {
        return unevaluated();
    }
    let q_u32 = match u32::try_from(q) {
        Ok(v) => v,
        Err(_) => return unevaluated(),
    };
    let (outside, inside) = match radicand.extract_power_factor(q_u32) {
        Some(parts) => parts,
        None => return unevaluated(),
    };
    let scale = match (b.pow(whole), den.pow(s)) {
        (Ok(bw), Ok(ds)) => match outside.mul(&bw).checked_div(&ds) {
            Ok(v) => v,
            Err(_) => return unevaluated(),
        },
        _ => return unevaluated(),
    };
    if inside.is_one() {
        return Expr::Number(scale);
    }
    let radical = Expr::pow(Expr::Number(inside), Expr::rational(1, q));
    if scale.is_one() {
        radical
    } else {
        Expr::Mul(vec![Expr::Number(scale), radical])
    }
}

// ========== Functions ==========

/// `k` such that `e = k*pi`
fn pi_multiple(e: &Expr) -> Option<Number> {
    match e {
        Expr::Number(n) if n.is_zero() => Some(Number::zero()),
        Expr::Constant(Constant::Pi) => Some(Number::one()),
        Expr::Mul(fs) if fs.len() == 2 && matches!(fs[1], Expr::Constant(Constant::Pi)) => {
            fs[0].as_number().filter(|n| n.is_exact()).cloned()
        }
        _ => None,
    }
}

/// `sin(k*pi)` for multiples of pi/6 and pi/4
fn sin_pi_multiple(k: &Number) -> Option<Expr> {
    let n = i64::try_from(k.numer()).ok()?;
    let d = i64::try_from(k.denom()).ok()?;
    if ![1, 2, 3, 4, 6].contains(&d) {
        return None;
    }
    // reduce to [0, 2)
    let mut r = Number::from_ratio(n.rem_euclid(2 * d), d);
    let mut negative = false;
    if r >= Number::one() {
        r = r.sub(&Number::one());
        negative = true;
    }
    if r > Number::from_ratio(1, 2) {
        r = Number::one().sub(&r);
    }
    let value = if r.is_zero() {
        Expr::int(0)
    } else if r == Number::from_ratio(1, 6) {
        Expr::rational(1, 2)
    } else if r == Number::from_ratio(1, 4) {
        make_mul(vec![Expr::rational(1, 2), make_pow(Expr::int(2), Expr::rational(1, 2))])
    } else if r == Number::from_ratio(1, 3) {
        make_mul(vec![Expr::rational(1, 2), make_pow(Expr::int(3), Expr::rational(1, 2))])
    } else {
        Expr::int(1)
    };
    Some(if negative { make_mul(vec![Expr::int(-1), value]) } else { value })
}

/// `u` when `e = -u` syntactically
fn negated(e: &Expr) -> Option<Expr> {
    match e {
        Expr::Number(n) if n.is_negative() => Some(Expr::Number(n.neg())),
        Expr::Mul(fs) if fs.first().and_then(|f| f.as_number()).is_some_and(|n| n.is_negative()) => {
            Some(make_mul(vec![Expr::int(-1), e.clone()]))
        }
        _ => None,
    }
}

pub fn make_func(f: Function, arg: Expr) -> Expr {
    if matches!(arg, Expr::Constant(Constant::Undefined)) {
        return Expr::undefined();
    }
    if let Expr::Number(n) = &arg {
        if !n.is_exact() {
            if let Some(x) = n.to_f64() {
                let v = apply_function(f, x);
                if v.is_finite() {
                    return Expr::Number(Number::from_f64(v));
                }
            }
        }
    }

    match f {
        Function::Exp => {
            if arg.is_zero() {
                return Expr::int(1);
            }
            if arg.is_one() {
                return Expr::Constant(Constant::E);
            }
            match infinity_sign(&arg) {
                Some(1) => return Expr::infinity(),
                Some(-1) => return Expr::int(0),
                _ => {}
            }
            if let Expr::Func(Function::Ln, u) = &arg {
                return u.as_ref().clone();
            }
            if let Expr::Mul(fs) = &arg {
                if fs.len() == 2 {
                    if let (Some(k), Expr::Func(Function::Ln, u)) = (fs[0].as_number(), &fs[1]) {
                        if k.is_exact_integer() {
                            return make_pow(u.as_ref().clone(), fs[0].clone());
                        }
                    }
                }
            }
        }
        Function::Ln => {
            if arg.is_one() {
                return Expr::int(0);
            }
            if arg.is_zero() {
                return Expr::neg_infinity();
            }
            match &arg {
                Expr::Constant(Constant::E) => return Expr::int(1),
                Expr::Constant(Constant::Infinity) => return Expr::infinity(),
                Expr::Func(Function::Exp, u) => return u.as_ref().clone(),
                _ => {}
            }
        }
        Function::Sin | Function::Cos | Function::Tan => {
            if let Some(k) = pi_multiple(&arg) {
                let shifted = k.add(&Number::from_ratio(1, 2));
                let value = match f {
                    Function::Sin => sin_pi_multiple(&k),
                    Function::Cos => sin_pi_multiple(&shifted),
                    _ => match (sin_pi_multiple(&k), sin_pi_multiple(&shifted)) {
                        (Some(_), Some(c)) if c.is_zero() => Some(Expr::undefined()),
                        (Some(s), Some(c)) => Some(make_mul(vec![s, make_pow(c, Expr::int(-1))])),
                        _ => None,
                    },
                };
                if let Some(v) = value {
                    return v;
                }
            }
        }
        Function::Asin | Function::Atan | Function::Sinh | Function::Tanh if arg.is_zero() => {
            return Expr::int(0);
        }
        Function::Cosh if arg.is_zero() => return Expr::int(1),
        Function::Acos if arg.is_one() => return Expr::int(0),
        Function::Acos if arg.is_zero() => return make_mul(vec![Expr::rational(1, 2), Expr::pi()]),
        Function::Asin if arg.is_one() => return make_mul(vec![Expr::rational(1, 2), Expr::pi()]),
        Function::Atan if arg.is_one() => return make_mul(vec![Expr::rational(1, 4), Expr::pi()]),
        Function::Atan if infinity_sign(&arg) == Some(1) => {
            return make_mul(vec![Expr::rational(1, 2), Expr::pi()]);
        }
        Function::Abs => {
            if let Expr::Number(n) = &arg {
                return Expr::Number(n.abs());
            }
        }
        _ => {}
    }

    // parity: sin(-x) = -sin(x), cos(-x) = cos(x)
    if let Some(pos) = negated(&arg) {
        if f.is_odd() {
            return make_mul(vec![Expr::int(-1), make_func(f, pos)]);
        }
        if matches!(f, Function::Cos | Function::Sec | Function::Cosh | Function::Abs) {
            return make_func(f, pos);
        }
    }
    Expr::func(f, arg)
}

pub fn make_factorial(arg: Expr) -> Expr {
    if let Some(n) = arg.as_number() {
        if n.is_exact_integer() && !n.is_negative() {
            if let Some(Ok(v)) = n.to_i64().map(|k| Number::factorial(k as u64)) {
                return Expr::Number(v);
            }
        }
    }
    Expr::Factorial(Box::new(arg))
}

pub fn make_apply(name: &str, args: Vec<Expr>) -> Expr {
    if name == "binomial" && args.len() == 2 {
        let ints: Vec<Option<i64>> = args
            .iter()
            .map(|a| a.as_number().filter(|n| n.is_exact_integer()).and_then(|n| n.to_i64()))
            .collect();
        if let [Some(n), Some(k)] = ints[..] {
            if n >= 0 && k >= 0 {
                if let Ok(v) = Number::binomial(n as u64, k as u64) {
                    return Expr::Number(v);
                }
            }
        }
    }
    Expr::Apply(name.to_string(), args)
}

// ========== Logic ==========

fn make_logic(e: Expr) -> Expr {
    match e {
        Expr::Not(a) => match *a {
            Expr::Bool(b) => Expr::Bool(!b),
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        },
        Expr::And(items) => fold_connective(items, true),
        Expr::Or(items) => fold_connective(items, false),
        Expr::Xor(items) => {
            if items.iter().all(|i| matches!(i, Expr::Bool(_))) {
                let odd = items.iter().filter(|i| matches!(i, Expr::Bool(true))).count() % 2 == 1;
                Expr::Bool(odd)
            } else {
                Expr::Xor(items)
            }
        }
        Expr::Implies(a, b) => match (*a, *b) {
            (Expr::Bool(false), _) | (_, Expr::Bool(true)) => Expr::Bool(true),
            (Expr::Bool(true), other) => other,
            (lhs, rhs) => Expr::Implies(Box::new(lhs), Box::new(rhs)),
        },
        Expr::Equivalent(a, b) => match (*a, *b) {
            (Expr::Bool(x), Expr::Bool(y)) => Expr::Bool(x == y),
            (lhs, rhs) if lhs == rhs => Expr::Bool(true),
            (lhs, rhs) => Expr::Equivalent(Box::new(lhs), Box::new(rhs)),
        },
        other => other,
    }
}

/// `And` when `is_and`, else `Or`
fn fold_connective(items: Vec<Expr>, is_and: bool) -> Expr {
    let identity = is_and;
    let mut out: Vec<Expr> = Vec::new();
    for item in items {
        let nested = match item {
            Expr::And(inner) if is_and => inner,
            Expr::Or(inner) if !is_and => inner,
            other => vec![other],
        };
        for x in nested {
            match x {
                Expr::Bool(b) if b == identity => {}
                Expr::Bool(_) => return Expr::Bool(!identity),
                other => {
                    if !out.contains(&other) {
                        out.push(other);
                    }
                }
            }
        }
    }
    match out.len() {
        0 => Expr::Bool(identity),
        1 => out.remove(0),
        _ if is_and => Expr::And(out),
        _ => Expr::Or(out),
    }
}

// ========== Simplification ==========

/// Number of nodes, the measure `simplify` minimizes
pub fn complexity(e: &Expr) -> usize {
    1 + e.children().iter().map(|c| complexity(c)).sum::<usize>()
}

pub fn simplify(e: &Expr) -> Expr {
    let base = trig_identities(&canonical(e));
    let mut best = base.clone();
    let candidates = [
        trig_identities(&expand(&base)),
        cancel_rational(&base),
    ];
    for candidate in candidates {
        if complexity(&candidate) < complexity(&best) {
            best = candidate;
        }
    }
    canonical(&best)
}

/// `(c, u)` when `e = c*f(u)^2`
fn squared_function(e: &Expr, f: Function) -> Option<(Number, Expr)> {
    let (c, rest) = split_coeff(e);
    match rest {
        Expr::Pow(b, k) if k.as_number().is_some_and(|n| *n == Number::from_i64(2)) => match *b {
            Expr::Func(g, u) if g == f => Some((c, *u)),
            _ => None,
        },
        _ => None,
    }
}

/// `c*sin(u)^2 + c*cos(u)^2 = c`, bottom-up
fn trig_identities(e: &Expr) -> Expr {
    let mut terms = match e.map_children(trig_identities) {
        Expr::Add(terms) => terms,
        other => return other,
    };
    let mut changed = true;
    while changed {
        changed = false;
        'outer: for i in 0..terms.len() {
            if let Some((c, u)) = squared_function(&terms[i], Function::Sin) {
                for j in 0..terms.len() {
                    if i != j && squared_function(&terms[j], Function::Cos) == Some((c.clone(), u.clone())) {
                        let (hi, lo) = if i > j { (i, j) } else { (j, i) };
                        terms.remove(hi);
                        terms.remove(lo);
                        terms.push(Expr::Number(c));
                        changed = true;
                        break 'outer;
                    }
                }
            }
        }
    }
    make_add(terms)
}

/// Cancel common polynomial factors of a univariate rational function
pub fn cancel_rational(e: &Expr) -> Expr {
    let vars = e.free_symbols();
    if vars.len() != 1 {
        return e.clone();
    }
    let Some(var) = vars.iter().next() else {
        return e.clone();
    };
    let (num, den) = as_numer_denom(e);
    if den.is_one() {
        return e.clone();
    }
    let (Some(pn), Some(pd)) = (Poly::from_expr(&num, var), Poly::from_expr(&den, var)) else {
        return e.clone();
    };
    let g = pn.gcd(&pd);
    let (Some((pn, _)), Some((pd, _))) = (pn.div_rem(&g), pd.div_rem(&g)) else {
        return e.clone();
    };
    let num = pn.to_expr(var);
    let den = pd.to_expr(var);
    make_mul(vec![num, make_pow(den, Expr::int(-1))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    fn c(s: &str) -> String {
        canonical(&parse_infix(s).unwrap()).to_string()
    }

    fn s(text: &str) -> String {
        simplify(&parse_infix(text).unwrap()).to_string()
    }

    #[test]
    fn test_collect_like_terms() {
        assert_eq!(c("2x + 3x"), "5*x");
        assert_eq!(c("x + 1 - x"), "1");
        assert_eq!(c("x*x"), "x^2");
        assert_eq!(c("3 - 4 + x"), "x - 1");
    }

    #[test]
    fn test_ordering() {
        assert_eq!(c("-4 + 3x + x^2"), "x^2 + 3*x - 4");
        assert_eq!(c("y*2*x"), "2*x*y");
    }

    #[test]
    fn test_distribute_numeric_coefficient() {
        assert_eq!(c("2(x+1)"), "2*x + 2");
    }

    #[test]
    fn test_radicals() {
        assert_eq!(c("sqrt(8)"), "2*sqrt(2)");
        assert_eq!(c("sqrt(4)"), "2");
        assert_eq!(c("sqrt(2)*sqrt(2)"), "2");
        assert_eq!(c("sqrt(-4)"), "2*I");
        assert_eq!(c("1/sqrt(2)"), "sqrt(2)/2");
    }

    #[test]
    fn test_imaginary_powers() {
        assert_eq!(c("I^2"), "-1");
        assert_eq!(c("I*I*I"), "-I");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(c("sin(pi)"), "0");
        assert_eq!(c("cos(pi/3)"), "1/2");
        assert_eq!(c("sin(pi/4)"), "sqrt(2)/2");
        assert_eq!(c("exp(0)"), "1");
        assert_eq!(c("log(E)"), "1");
        assert_eq!(c("exp(log(x))"), "x");
        assert_eq!(c("sin(-x)"), "-sin(x)");
        assert_eq!(c("cos(-x)"), "cos(x)");
    }

    #[test]
    fn test_exp_merging() {
        assert_eq!(c("exp(x)*exp(2x)"), "exp(3*x)");
        assert_eq!(c("e^x"), "exp(x)");
    }

    #[test]
    fn test_infinity_arithmetic() {
        assert_eq!(c("oo + 1"), "oo");
        assert_eq!(c("oo - oo"), "nan");
        assert_eq!(c("-oo*2"), "-oo");
        assert_eq!(c("0*oo"), "nan");
    }

    #[test]
    fn test_factorial_and_binomial() {
        assert_eq!(c("5!"), "120");
        assert_eq!(c("binomial(5, 2)"), "10");
        // C(n, r) is an undefined function until the combinatorics solver reads it
        assert_eq!(c("C(5, 2)"), "C(5, 2)");
    }

    #[test]
    fn test_logic_folding() {
        assert_eq!(c("p & True"), "p");
        assert_eq!(c("p | True"), "True");
        assert_eq!(c("~~p"), "p");
    }

    #[test]
    fn test_simplify_pythagorean() {
        assert_eq!(s("sin(x)^2 + cos(x)^2"), "1");
        assert_eq!(s("2sin(x)^2 + 2cos(x)^2 + x"), "x + 2");
    }

    #[test]
    fn test_simplify_rational() {
        assert_eq!(s("(x^2 - 1)/(x - 1)"), "x + 1");
        assert_eq!(s("(x+1)^2 - x^2"), "2*x + 1");
    }

    #[test]
    fn test_canonical_idempotent() {
        for text in ["x^2 + 3x - 4", "sin(x)^2*2", "exp(x)*x", "sqrt(12)/3"] {
            let once = canonical(&parse_infix(text).unwrap());
            assert_eq!(canonical(&once), once, "{}", text);
        }
    }
}
