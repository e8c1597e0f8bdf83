//! Numeric kernels for the LaTeX math evaluator.
//!
//! Dense row-major [`Matrix`] operations, [`Complex`] arithmetic with the
//! transcendentals the function registry needs, and the tagged [`Value`]
//! every evaluation produces.

mod complex;
mod matrix;

pub use complex::Complex;
pub use matrix::Matrix;

use thiserror::Error;

/// Errors raised by the numeric kernels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Matrix shape mismatch for {op}: {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
    ShapeMismatch {
        op: &'static str,
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("{op} requires a square matrix, found {rows}x{cols}")]
    NotSquare { op: &'static str, rows: usize, cols: usize },

    #[error("Matrix is singular")]
    Singular,

    #[error("Matrix rows have unequal lengths")]
    RaggedRows,

    #[error("Matrix must not be empty")]
    Empty,
}

/// Tagged result of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Numeric(f64),
    Complex(Complex),
    Matrix(Matrix),
}

impl Value {
    /// The scalar value, if this is a real scalar.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// The matrix, if this is one.
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// True for the quiet-NaN scalar a failed conditional produces.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Numeric(n) if n.is_nan())
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Numeric(_) => "scalar",
            Value::Complex(_) => "complex",
            Value::Matrix(_) => "matrix",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Numeric(n)
    }
}

impl From<Complex> for Value {
    fn from(c: Complex) -> Self {
        // Collapse real-axis results so downstream arithmetic stays real
        if c.im == 0.0 {
            Value::Numeric(c.re)
        } else {
            Value::Complex(c)
        }
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}
