//! Core matrix type

use nalgebra::DMatrix;
use sigma_core::{Number, SigmaError};
use sigma_expr::{canonical, evaluate, parse_infix, simplify, to_latex, Expr};
use std::collections::HashMap;
use std::fmt;

/// Largest dimension for which eigenvalues go through the exact
/// characteristic polynomial
pub const DEFAULT_EXACT_LIMIT: usize = 6;

/// Dense matrix of symbolic entries.
///
/// Entries are kept in canonical form, so numeric matrices carry exact
/// rationals and arithmetic on them folds exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub data: Vec<Vec<Expr>>,
    pub rows: usize,
    pub cols: usize,
}

fn literal_error(details: impl Into<String>) -> SigmaError {
    SigmaError::parse_error(format!("invalid matrix literal: {}", details.into()))
        .with_suggestion("Write rows in brackets, e.g. [[1, 2], [3, 4]]")
}

impl Matrix {
    /// Create a matrix from rows, validating that it is rectangular
    pub fn new(data: Vec<Vec<Expr>>) -> Result<Self, SigmaError> {
        if data.is_empty() {
            return Err(SigmaError::validation("matrix: empty data"));
        }
        let rows = data.len();
        let cols = data[0].len();
        if cols == 0 {
            return Err(SigmaError::validation("matrix: empty row"));
        }
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(SigmaError::validation(format!(
                    "matrix: row {} has {} columns, expected {}",
                    i + 1,
                    row.len(),
                    cols
                )));
            }
        }
        let data = data
            .into_iter()
            .map(|row| row.iter().map(canonical).collect())
            .collect();
        Ok(Self { data, rows, cols })
    }

    pub fn from_numbers(data: Vec<Vec<Number>>) -> Result<Self, SigmaError> {
        Self::new(
            data.into_iter()
                .map(|row| row.into_iter().map(Expr::Number).collect())
                .collect(),
        )
    }

    pub fn from_dmatrix(m: &DMatrix<f64>) -> Self {
        let data = (0..m.nrows())
            .map(|i| (0..m.ncols()).map(|j| Expr::Number(Number::from_f64(m[(i, j)]))).collect())
            .collect();
        Self { data, rows: m.nrows(), cols: m.ncols() }
    }

    pub fn identity(n: usize) -> Self {
        let data = (0..n)
            .map(|i| (0..n).map(|j| Expr::int(i64::from(i == j))).collect())
            .collect();
        Self { data, rows: n, cols: n }
    }

    /// Column vector
    pub fn column(entries: Vec<Expr>) -> Self {
        let rows = entries.len();
        Self { data: entries.into_iter().map(|e| vec![e]).collect(), rows, cols: 1 }
    }

    /// Strict parse of a bracketed literal: `[[1, 2], [3, 4]]` or `[1, 2], [3, 4]`.
    ///
    /// Entries are plain infix expressions; anything outside the row
    /// brackets other than separating commas is rejected.
    pub fn parse_literal(text: &str) -> Result<Self, SigmaError> {
        let t = text.trim();
        let inner = if t.starts_with("[[") {
            t.strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .ok_or_else(|| literal_error("unbalanced outer brackets"))?
        } else {
            t
        };

        let mut data = Vec::new();
        let mut rest = inner.trim();
        while !rest.is_empty() {
            let body = rest
                .strip_prefix('[')
                .ok_or_else(|| literal_error(format!("expected '[' at '{}'", rest)))?;
            let end = body.find(']').ok_or_else(|| literal_error("missing ']'"))?;
            let row = &body[..end];
            if row.contains('[') {
                return Err(literal_error("rows cannot be nested"));
            }
            let entries = row
                .split(',')
                .map(|s| {
                    let s = s.trim();
                    if s.is_empty() {
                        Err(literal_error("empty entry"))
                    } else {
                        parse_infix(s)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            data.push(entries);

            rest = body[end + 1..].trim_start();
            if let Some(after) = rest.strip_prefix(',') {
                rest = after.trim_start();
                if rest.is_empty() {
                    return Err(literal_error("trailing comma"));
                }
            } else if !rest.is_empty() {
                return Err(literal_error(format!("unexpected '{}' after row {}", rest, data.len())));
            }
        }
        Self::new(data)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Expr> {
        self.data.get(row).and_then(|r| r.get(col))
    }

    /// Entries as numbers when every entry is a plain number
    pub fn numbers(&self) -> Option<Vec<Vec<Number>>> {
        self.data
            .iter()
            .map(|row| row.iter().map(|e| e.as_number().cloned()).collect())
            .collect()
    }

    /// Every entry is an exact rational
    pub fn is_exact(&self) -> bool {
        self.numbers()
            .is_some_and(|rows| rows.iter().flatten().all(|n| n.is_exact()))
    }

    /// f64 copy for nalgebra, available when every entry evaluates numerically
    pub fn to_dmatrix(&self) -> Option<DMatrix<f64>> {
        let env = HashMap::new();
        let mut out = DMatrix::zeros(self.rows, self.cols);
        for (i, row) in self.data.iter().enumerate() {
            for (j, e) in row.iter().enumerate() {
                out[(i, j)] = evaluate(e, &env).ok().filter(|v| v.is_finite())?;
            }
        }
        Some(out)
    }

    /// `self - lambda * I`
    pub fn shifted(&self, lambda: &Expr) -> Self {
        let mut out = self.clone();
        for i in 0..self.rows.min(self.cols) {
            out.data[i][i] = simplify(&Expr::sub(out.data[i][i].clone(), lambda.clone()));
        }
        out
    }

    pub fn to_latex(&self) -> Result<String, SigmaError> {
        let mut rows = Vec::with_capacity(self.rows);
        for row in &self.data {
            let cells = row.iter().map(to_latex).collect::<Result<Vec<_>, _>>()?;
            rows.push(cells.join(" & "));
        }
        Ok(format!(
            "\\left[\\begin{{matrix}}{}\\end{{matrix}}\\right]",
            rows.join("\\\\")
        ))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix([")?;
        for (i, row) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (j, e) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", e)?;
            }
            write!(f, "]")?;
        }
        write!(f, "])")
    }
}
