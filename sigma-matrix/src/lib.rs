//! Sigma Matrix - Linear algebra over symbolic entries
//!
//! Provides the matrix operations the linear algebra solver needs:
//! - Strict literal parsing and LaTeX rendering
//! - Reduced row echelon form with pivots, rank, determinant, nullspace
//! - Characteristic polynomial, eigenvalues and eigenvectors
//!
//! Exact matrices stay exact: entries are canonical expressions, so
//! rationals and radicals survive elimination. Numeric work that has no
//! closed form goes through nalgebra.

mod eigen;
mod reduce;
mod types;

pub use eigen::Eigenpair;
pub use types::{Matrix, DEFAULT_EXACT_LIMIT};

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_expr::Expr;

    #[test]
    fn test_literal_to_rref_pipeline() {
        let m = Matrix::parse_literal("[[1, 2, 1], [2, 4, 0]]").unwrap();
        let (r, pivots) = m.rref();
        assert_eq!(pivots, vec![0, 2]);
        assert_eq!(r.to_string(), "Matrix([[1, 2, 0], [0, 0, 1]])");
        assert_eq!(m.nullspace().len(), 1);
    }

    #[test]
    fn test_eigen_multiplicities_sum_to_size() {
        let m = Matrix::parse_literal("[[2, 0, 0], [0, 2, 0], [0, 0, 5]]").unwrap();
        let pairs = m.eigenvectors().unwrap();
        assert_eq!(pairs[0].value, Expr::int(2));
        assert_eq!(pairs[0].multiplicity, 2);
        assert_eq!(pairs[0].vectors.len(), 2);
        assert_eq!(pairs.iter().map(|p| p.multiplicity).sum::<usize>(), 3);
    }
}
