//! Row reduction: RREF, rank, determinant and nullspace

use crate::types::Matrix;
use sigma_core::{Number, SigmaError};
use sigma_expr::{simplify, Expr};

/// Entries below this magnitude are treated as zero when approximate
const FLOAT_EPSILON: f64 = 1e-10;

fn tidy(e: Expr) -> Expr {
    match &e {
        Expr::Number(n) if !n.is_exact() => {
            if n.to_f64().is_some_and(|v| v.abs() < FLOAT_EPSILON) {
                Expr::Number(Number::zero())
            } else {
                e
            }
        }
        Expr::Number(_) => e,
        _ => simplify(&e),
    }
}

fn mul(a: &Expr, b: &Expr) -> Expr {
    tidy(Expr::mul(vec![a.clone(), b.clone()]))
}

fn sub(a: &Expr, b: &Expr) -> Expr {
    tidy(Expr::sub(a.clone(), b.clone()))
}

fn div(a: &Expr, b: &Expr) -> Expr {
    tidy(Expr::div(a.clone(), b.clone()))
}

impl Matrix {
    /// Reduced row echelon form and the pivot column indices (0-based)
    pub fn rref(&self) -> (Matrix, Vec<usize>) {
        let mut m: Vec<Vec<Expr>> = self.data.iter().map(|r| r.iter().cloned().map(tidy).collect()).collect();
        let mut pivots = Vec::new();
        let mut r = 0;
        for c in 0..self.cols {
            if r == self.rows {
                break;
            }
            let Some(p) = (r..self.rows).find(|&i| !m[i][c].is_zero()) else {
                continue;
            };
            m.swap(r, p);
            let pivot = m[r][c].clone();
            for j in c..self.cols {
                m[r][j] = div(&m[r][j], &pivot);
            }
            for i in 0..self.rows {
                if i == r || m[i][c].is_zero() {
                    continue;
                }
                let factor = m[i][c].clone();
                for j in c..self.cols {
                    let scaled = mul(&factor, &m[r][j]);
                    m[i][j] = sub(&m[i][j], &scaled);
                }
            }
            pivots.push(c);
            r += 1;
        }
        tracing::trace!(pivots = ?pivots, "row reduction finished");
        (Matrix { data: m, rows: self.rows, cols: self.cols }, pivots)
    }

    pub fn rank(&self) -> usize {
        self.rref().1.len()
    }

    /// Determinant by elimination with row swaps
    pub fn det(&self) -> Result<Expr, SigmaError> {
        if !self.is_square() {
            return Err(SigmaError::validation("Matrix must be square for determinant"));
        }
        let n = self.rows;
        if n == 2 {
            let d = &self.data;
            return Ok(sub(&mul(&d[0][0], &d[1][1]), &mul(&d[0][1], &d[1][0])));
        }
        let mut m = self.data.clone();
        let mut factors = Vec::with_capacity(n + 1);
        for c in 0..n {
            let Some(p) = (c..n).find(|&i| !m[i][c].is_zero()) else {
                return Ok(Expr::int(0));
            };
            if p != c {
                m.swap(p, c);
                factors.push(Expr::int(-1));
            }
            let pivot = m[c][c].clone();
            for i in (c + 1)..n {
                if m[i][c].is_zero() {
                    continue;
                }
                let ratio = div(&m[i][c], &pivot);
                for j in c..n {
                    let scaled = mul(&ratio, &m[c][j]);
                    m[i][j] = sub(&m[i][j], &scaled);
                }
            }
            factors.push(pivot);
        }
        Ok(tidy(Expr::mul(factors)))
    }

    /// Basis of the nullspace as column vectors, one per free column
    pub fn nullspace(&self) -> Vec<Matrix> {
        let (reduced, pivots) = self.rref();
        (0..self.cols)
            .filter(|c| !pivots.contains(c))
            .map(|free| {
                let mut v = vec![Expr::int(0); self.cols];
                v[free] = Expr::int(1);
                for (row, &pc) in pivots.iter().enumerate() {
                    v[pc] = tidy(Expr::neg(reduced.data[row][free].clone()));
                }
                Matrix::column(v)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Matrix {
        Matrix::parse_literal(s).unwrap()
    }

    #[test]
    fn test_rref_invertible() {
        let (r, pivots) = m("[[1,2],[3,4]]").rref();
        assert_eq!(r, Matrix::identity(2));
        assert_eq!(pivots, vec![0, 1]);
    }

    #[test]
    fn test_rref_singular() {
        let (r, pivots) = m("[[1,2,3],[2,4,6]]").rref();
        assert_eq!(pivots, vec![0]);
        assert_eq!(r.to_string(), "Matrix([[1, 2, 3], [0, 0, 0]])");
    }

    #[test]
    fn test_rref_fractions_stay_exact() {
        let (r, _) = m("[[2,1],[4,3]]").rref();
        assert_eq!(r, Matrix::identity(2));
        let (r, _) = m("[[2,1,1]]").rref();
        assert_eq!(r.to_string(), "Matrix([[1, 1/2, 1/2]])");
    }

    #[test]
    fn test_rank() {
        assert_eq!(m("[[1,2],[2,4]]").rank(), 1);
        assert_eq!(Matrix::identity(3).rank(), 3);
    }

    #[test]
    fn test_det() {
        assert_eq!(m("[[1,2],[3,4]]").det().unwrap(), Expr::int(-2));
        assert_eq!(m("[[2,0,1],[1,3,2],[1,1,1]]").det().unwrap(), Expr::int(0));
        assert_eq!(m("[[0,1,0],[1,0,0],[0,0,1]]").det().unwrap(), Expr::int(-1));
        assert_eq!(m("[[a,b],[c,d]]").det().unwrap().to_string(), "a*d - b*c");
    }

    #[test]
    fn test_det_requires_square() {
        let err = m("[[1,2,3]]").det().unwrap_err();
        assert!(err.message.contains("square"));
    }

    #[test]
    fn test_nullspace() {
        let basis = m("[[1,2],[2,4]]").nullspace();
        assert_eq!(basis.len(), 1);
        assert_eq!(basis[0], Matrix::column(vec![Expr::int(-2), Expr::int(1)]));
        assert!(Matrix::identity(2).nullspace().is_empty());
    }
}
