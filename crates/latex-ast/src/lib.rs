//! Abstract syntax tree for LaTeX math expressions.
//!
//! The tree is a tagged sum ([`Expr`]) produced by the parser and shared
//! immutably by the evaluator, the symbolic transformer, and the caches.
//! Transformations never mutate in place; they build new trees.
//!
//! `Expr` implements `Hash` and `Eq` (floats hashed by bit pattern) so
//! caches can key on shared `Arc<Expr>` trees directly.

mod expr;
mod latex;
mod visitor;

pub use expr::{BinaryOp, CompareOp, DerivativeKind, Expr, MatrixKind};
pub use latex::to_latex;
pub use visitor::{walk, ExprVisitor};

pub use latex_token::FontStyle;
