//! Boolean simplification via truth tables and Quine-McCluskey

use crate::ast::Expr;
use crate::simplify::complexity;
use sigma_core::SigmaError;
use std::collections::{BTreeMap, BTreeSet};

/// Propositional variables beyond this make the truth table too large
pub const MAX_VARIABLES: usize = 8;

/// Evaluate a propositional formula under an assignment
pub fn truth(e: &Expr, env: &BTreeMap<String, bool>) -> Result<bool, SigmaError> {
    Ok(match e {
        Expr::Bool(b) => *b,
        Expr::Symbol(s) => *env
            .get(s)
            .ok_or_else(|| SigmaError::internal(format!("unassigned variable {}", s)))?,
        Expr::Not(a) => !truth(a, env)?,
        Expr::And(v) => {
            let mut acc = true;
            for a in v {
                acc &= truth(a, env)?;
            }
            acc
        }
        Expr::Or(v) => {
            let mut acc = false;
            for a in v {
                acc |= truth(a, env)?;
            }
            acc
        }
        Expr::Xor(v) => {
            let mut acc = false;
            for a in v {
                acc ^= truth(a, env)?;
            }
            acc
        }
        Expr::Implies(a, b) => !truth(a, env)? || truth(b, env)?,
        Expr::Equivalent(a, b) => truth(a, env)? == truth(b, env)?,
        other => {
            return Err(SigmaError::validation(format!("'{}' is not a logical expression", other))
                .with_suggestion("Use &, |, ~, ^, -> and <-> between propositional variables"))
        }
    })
}

/// A product term: bits set in `mask` are don't-care positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Implicant {
    value: u32,
    mask: u32,
}

impl Implicant {
    fn covers(&self, minterm: u32) -> bool {
        (minterm & !self.mask) == self.value
    }
}

fn prime_implicants(minterms: &[u32]) -> Vec<Implicant> {
    let mut current: BTreeSet<Implicant> = minterms.iter().map(|&m| Implicant { value: m, mask: 0 }).collect();
    let mut primes = BTreeSet::new();
    while !current.is_empty() {
        let items: Vec<Implicant> = current.iter().copied().collect();
        let mut merged = BTreeSet::new();
        let mut used = BTreeSet::new();
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                if a.mask != b.mask {
                    continue;
                }
                let diff = a.value ^ b.value;
                if diff.count_ones() == 1 {
                    merged.insert(Implicant { value: a.value & !diff, mask: a.mask | diff });
                    used.insert(*a);
                    used.insert(*b);
                }
            }
        }
        primes.extend(items.into_iter().filter(|i| !used.contains(i)));
        current = merged;
    }
    primes.into_iter().collect()
}

/// Essential primes first, then greedy cover of what remains
fn minimal_cover(primes: &[Implicant], minterms: &[u32]) -> Vec<Implicant> {
    let mut chosen: BTreeSet<Implicant> = BTreeSet::new();
    for &m in minterms {
        let covering: Vec<&Implicant> = primes.iter().filter(|p| p.covers(m)).collect();
        if let [only] = covering[..] {
            chosen.insert(*only);
        }
    }
    let mut remaining: Vec<u32> = minterms
        .iter()
        .copied()
        .filter(|&m| !chosen.iter().any(|p| p.covers(m)))
        .collect();
    while !remaining.is_empty() {
        let best = primes
            .iter()
            .filter(|p| !chosen.contains(p))
            .max_by_key(|p| (remaining.iter().filter(|&&m| p.covers(m)).count(), p.mask.count_ones()));
        let Some(best) = best.copied() else { break };
        chosen.insert(best);
        remaining.retain(|&m| !best.covers(m));
    }
    chosen.into_iter().collect()
}

fn literal(name: &str, positive: bool) -> Expr {
    let s = Expr::sym(name);
    if positive {
        s
    } else {
        Expr::Not(Box::new(s))
    }
}

fn connective(mut items: Vec<Expr>, and: bool) -> Expr {
    if items.len() == 1 {
        return items.remove(0);
    }
    if and {
        Expr::And(items)
    } else {
        Expr::Or(items)
    }
}

/// Bit of variable `i` (variable 0 is the most significant)
fn bit(i: usize, n: usize) -> u32 {
    1 << (n - 1 - i)
}

/// Literals of an implicant as `(variable index, positive)`, in variable order
fn literals(imp: &Implicant, n: usize, invert: bool) -> Vec<(usize, bool)> {
    (0..n)
        .filter(|&i| imp.mask & bit(i, n) == 0)
        .map(|i| (i, (imp.value & bit(i, n) != 0) != invert))
        .collect()
}

/// Sum of products, or with `invert` a product of sums over the complement's implicants
fn normal_form(implicants: &[Implicant], vars: &[String], invert: bool) -> Expr {
    let mut terms: Vec<Vec<(usize, bool)>> = implicants
        .iter()
        .map(|imp| literals(imp, vars.len(), invert))
        .collect();
    // ~p before p, p before q
    terms.sort();
    let inner_and = !invert;
    let items = terms
        .into_iter()
        .map(|lits| {
            let lits = lits.into_iter().map(|(i, pos)| literal(&vars[i], pos)).collect();
            connective(lits, inner_and)
        })
        .collect();
    connective(items, !inner_and)
}

/// Minimal equivalent formula: `True`/`False` for tautologies and
/// contradictions, otherwise the shorter of a minimal DNF and CNF
pub fn simplify_logic(e: &Expr) -> Result<Expr, SigmaError> {
    let vars: Vec<String> = e.free_symbols().into_iter().collect();
    if vars.len() > MAX_VARIABLES {
        return Err(SigmaError::validation(format!(
            "too many propositional variables ({}, at most {})",
            vars.len(),
            MAX_VARIABLES
        )));
    }
    let n = vars.len();
    let mut ones = Vec::new();
    let mut zeros = Vec::new();
    for row in 0..(1u32 << n) {
        let env = vars
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), row & bit(i, n) != 0))
            .collect();
        if truth(e, &env)? {
            ones.push(row);
        } else {
            zeros.push(row);
        }
    }
    tracing::trace!(variables = n, minterms = ones.len(), "truth table built");
    if zeros.is_empty() {
        return Ok(Expr::Bool(true));
    }
    if ones.is_empty() {
        return Ok(Expr::Bool(false));
    }

    let dnf = normal_form(&minimal_cover(&prime_implicants(&ones), &ones), &vars, false);
    let cnf = normal_form(&minimal_cover(&prime_implicants(&zeros), &zeros), &vars, true);
    Ok(if complexity(&cnf) < complexity(&dnf) { cnf } else { dnf })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_infix;

    fn simp(s: &str) -> String {
        simplify_logic(&parse_infix(s).unwrap()).unwrap().to_string()
    }

    #[test]
    fn test_absorption() {
        assert_eq!(simp("p & (p | q)"), "p");
    }

    #[test]
    fn test_implication() {
        assert_eq!(simp("p -> q"), "~p | q");
    }

    #[test]
    fn test_de_morgan() {
        assert_eq!(simp("~(p & q)"), "~p | ~q");
    }

    #[test]
    fn test_constants() {
        assert_eq!(simp("p | ~p"), "True");
        assert_eq!(simp("p & ~p"), "False");
    }

    #[test]
    fn test_shorter_form_wins() {
        // p | (q & r) has fewer nodes than the factored CNF
        assert_eq!(simp("(p | q) & (p | r)"), "p | q & r");
    }

    #[test]
    fn test_non_logical_rejected() {
        let err = simplify_logic(&parse_infix("x + 1").unwrap()).unwrap_err();
        assert!(err.to_string().contains("not a logical expression"));
    }
}
