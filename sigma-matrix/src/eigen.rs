//! Eigenvalues and eigenvectors
//!
//! Small exact matrices go through the characteristic polynomial so the
//! eigenvalues come out as exact radicals. Anything else falls back to
//! nalgebra's Schur-based solver.

use crate::types::{Matrix, DEFAULT_EXACT_LIMIT};
use sigma_core::{Number, SigmaError};
use sigma_expr::{evaluate, polynomial_roots, simplify, Expr, Poly};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tolerance for merging numeric eigenvalues and for null singular values
const NUMERIC_TOLERANCE: f64 = 1e-8;

/// An eigenvalue with its algebraic multiplicity and eigenspace basis
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenpair {
    pub value: Expr,
    pub multiplicity: usize,
    pub vectors: Vec<Matrix>,
}

fn require_square(m: &Matrix) -> Result<(), SigmaError> {
    if m.is_square() {
        Ok(())
    } else {
        Err(SigmaError::validation("Matrix must be square for eigenvalues"))
    }
}

fn matmul(a: &[Vec<Number>], b: &[Vec<Number>]) -> Vec<Vec<Number>> {
    let n = a.len();
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| (0..n).fold(Number::zero(), |acc, k| acc.add(&a[i][k].mul(&b[k][j]))))
                .collect()
        })
        .collect()
}

fn is_exact_expr(e: &Expr) -> bool {
    match e {
        Expr::Number(n) => n.is_exact(),
        other => other.children().into_iter().all(is_exact_expr),
    }
}

fn complex_expr(re: f64, im: f64) -> Expr {
    let real = Expr::Number(Number::from_f64(re));
    if im == 0.0 {
        return real;
    }
    simplify(&Expr::add(vec![
        real,
        Expr::mul(vec![Expr::Number(Number::from_f64(im)), Expr::imaginary()]),
    ]))
}

impl Matrix {
    /// Characteristic polynomial `det(λI - A)` by Faddeev–LeVerrier
    pub fn charpoly(&self) -> Result<Poly, SigmaError> {
        require_square(self)?;
        let a = self
            .numbers()
            .ok_or_else(|| SigmaError::unsupported("characteristic polynomial needs numeric entries"))?;
        let n = self.rows;
        let mut coeffs = vec![Number::zero(); n + 1];
        coeffs[n] = Number::one();
        let mut m = vec![vec![Number::zero(); n]; n];
        for k in 1..=n {
            let mut next = matmul(&a, &m);
            for (i, row) in next.iter_mut().enumerate() {
                row[i] = row[i].add(&coeffs[n - k + 1]);
            }
            let am = matmul(&a, &next);
            let trace = (0..n).fold(Number::zero(), |acc, i| acc.add(&am[i][i]));
            coeffs[n - k] = trace.neg().checked_div(&Number::from_i64(k as i64))?;
            m = next;
        }
        Ok(Poly::new(coeffs))
    }

    /// Distinct eigenvalues with algebraic multiplicities, real ones first in
    /// ascending order
    pub fn eigenvalues(&self) -> Result<Vec<(Expr, usize)>, SigmaError> {
        require_square(self)?;
        if self.is_exact() && self.rows <= DEFAULT_EXACT_LIMIT {
            let roots = polynomial_roots(&self.charpoly()?);
            let total: usize = roots.iter().map(|(_, m)| m).sum();
            if total == self.rows && roots.iter().all(|(r, _)| is_exact_expr(r)) {
                return Ok(roots);
            }
            tracing::debug!(size = self.rows, "characteristic polynomial does not split exactly");
        }
        self.numeric_eigenvalues()
    }

    fn numeric_eigenvalues(&self) -> Result<Vec<(Expr, usize)>, SigmaError> {
        let d = self
            .to_dmatrix()
            .ok_or_else(|| SigmaError::unsupported("eigenvalues of symbolic matrices are not supported"))?;
        let clean = |v: f64| if v.abs() < 1e-12 { 0.0 } else { v };
        let mut found: Vec<(f64, f64, usize)> = Vec::new();
        for z in d.complex_eigenvalues().iter() {
            let (re, im) = (clean(z.re), clean(z.im));
            match found
                .iter_mut()
                .find(|(r, i, _)| (r - re).abs() < NUMERIC_TOLERANCE && (i - im).abs() < NUMERIC_TOLERANCE)
            {
                Some(slot) => slot.2 += 1,
                None => found.push((re, im, 1)),
            }
        }
        found.sort_by(|a, b| {
            let real_first = (a.1 != 0.0).cmp(&(b.1 != 0.0));
            real_first
                .then(a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
                .then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        });
        Ok(found.into_iter().map(|(re, im, m)| (complex_expr(re, im), m)).collect())
    }

    /// Eigenvalues together with a basis of each eigenspace
    pub fn eigenvectors(&self) -> Result<Vec<Eigenpair>, SigmaError> {
        Ok(self
            .eigenvalues()?
            .into_iter()
            .map(|(value, multiplicity)| {
                let vectors = self.eigenspace(&value);
                Eigenpair { value, multiplicity, vectors }
            })
            .collect())
    }

    fn eigenspace(&self, lambda: &Expr) -> Vec<Matrix> {
        if matches!(lambda, Expr::Number(n) if n.is_exact()) {
            return self.shifted(lambda).nullspace();
        }
        if self.rows == 2 {
            return self.eigenspace_2x2(lambda);
        }
        if lambda.contains(&Expr::imaginary()) {
            tracing::debug!(eigenvalue = %lambda, "no eigenvector computed for complex eigenvalue");
            return Vec::new();
        }
        match evaluate(lambda, &HashMap::new()) {
            Ok(v) => self.numeric_eigenspace(v),
            Err(_) => Vec::new(),
        }
    }

    /// Closed form `[b, λ - a]` (or `[λ - d, c]`) for a 2×2 matrix
    fn eigenspace_2x2(&self, lambda: &Expr) -> Vec<Matrix> {
        let d = &self.data;
        let (a, b, c, dd) = (&d[0][0], &d[0][1], &d[1][0], &d[1][1]);
        let minus = |x: &Expr| simplify(&Expr::sub(lambda.clone(), x.clone()));
        if !b.is_zero() {
            vec![Matrix::column(vec![b.clone(), minus(a)])]
        } else if !c.is_zero() {
            vec![Matrix::column(vec![minus(dd), c.clone()])]
        } else {
            // diagonal
            (0..2)
                .filter(|&i| minus(&d[i][i]).is_zero())
                .map(|i| Matrix::column((0..2).map(|j| Expr::int(i64::from(i == j))).collect()))
                .collect()
        }
    }

    /// Right singular vectors of `A - λI` with vanishing singular values
    fn numeric_eigenspace(&self, lambda: f64) -> Vec<Matrix> {
        let Some(mut d) = self.to_dmatrix() else {
            return Vec::new();
        };
        for i in 0..self.rows {
            d[(i, i)] -= lambda;
        }
        let svd = d.svd(false, true);
        let Some(v_t) = svd.v_t.as_ref() else {
            return Vec::new();
        };
        let as_column = |k: usize| {
            Matrix::column(v_t.row(k).iter().map(|&x| Expr::Number(Number::from_f64(x))).collect())
        };
        let scale = svd.singular_values.max().max(1.0);
        let mut out: Vec<Matrix> = svd
            .singular_values
            .iter()
            .enumerate()
            .filter(|(_, s)| **s <= NUMERIC_TOLERANCE * scale)
            .map(|(k, _)| as_column(k))
            .collect();
        if out.is_empty() {
            // eigenvalue only known approximately: take the closest direction
            out.push(as_column(svd.singular_values.argmin().0));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Matrix {
        Matrix::parse_literal(s).unwrap()
    }

    #[test]
    fn test_charpoly() {
        let p = m("[[1,2],[3,4]]").charpoly().unwrap();
        let expected: Vec<Number> = [-2, -5, 1].iter().map(|&c| Number::from_i64(c)).collect();
        assert_eq!(p.coeffs(), &expected[..]);
    }

    #[test]
    fn test_diagonal_eigenvalues() {
        let ev = m("[[2,0],[0,3]]").eigenvalues().unwrap();
        assert_eq!(ev, vec![(Expr::int(2), 1), (Expr::int(3), 1)]);
    }

    #[test]
    fn test_symmetric_eigenvectors() {
        let pairs = m("[[2,1],[1,2]]").eigenvectors().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].value, Expr::int(1));
        assert_eq!(pairs[0].vectors, vec![Matrix::column(vec![Expr::int(-1), Expr::int(1)])]);
        assert_eq!(pairs[1].value, Expr::int(3));
        assert_eq!(pairs[1].vectors, vec![Matrix::column(vec![Expr::int(1), Expr::int(1)])]);
    }

    #[test]
    fn test_defective_matrix() {
        let pairs = m("[[1,1],[0,1]]").eigenvectors().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].multiplicity, 2);
        assert_eq!(pairs[0].vectors.len(), 1);
    }

    #[test]
    fn test_irrational_and_complex() {
        let pairs = m("[[1,2],[3,4]]").eigenvectors().unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.vectors.len() == 1 && is_exact_expr(&p.value)));

        let rot = m("[[0,-1],[1,0]]").eigenvalues().unwrap();
        assert_eq!(rot.len(), 2);
        assert!(rot.iter().all(|(v, _)| v.contains(&Expr::imaginary())));
    }

    #[test]
    fn test_numeric_fallback() {
        // companion matrix of t^3 - t - 1, which has no rational roots
        let pairs = m("[[0,0,1],[1,0,1],[0,1,0]]").eigenvectors().unwrap();
        assert_eq!(pairs.len(), 3);
        let real = &pairs[0];
        let v = evaluate(&real.value, &HashMap::new()).unwrap();
        assert!((v - 1.324_717_957_2).abs() < 1e-8);
        assert_eq!(real.vectors.len(), 1);
    }

    #[test]
    fn test_non_square_rejected() {
        let err = m("[[1,2,3]]").eigenvalues().unwrap_err();
        assert_eq!(err.message, "Matrix must be square for eigenvalues");
    }
}
