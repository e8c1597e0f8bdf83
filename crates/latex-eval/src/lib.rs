//! Tree-walking evaluator for LaTeX math expressions.
//!
//! Walks the immutable tree against a variable [`Environment`] and
//! produces a tagged [`latex_numeric::Value`]. Function and constant
//! lookups go through process-wide registries that accept runtime
//! extensions; extension handlers resolve before built-ins.
//!
//! The calculus constructs are evaluated here: bounded reductions,
//! numerical integration by composite Simpson quadrature, two-sided
//! numeric limits, and derivative nodes resolved through the symbolic
//! transformer and then re-evaluated at the bound point.

mod calculus;
mod env;
mod evaluator;
mod functions;
mod memo;
mod registry;

pub use env::Environment;
pub use evaluator::Evaluator;
pub use registry::{
    constant, constant_names, function_names, lookup_function, register_constant,
    register_function, EvalFn, FunctionCall, Handler,
};

/// Iteration cap for `\sum` and `\prod` reductions.
pub const MAX_REDUCTION_ITERATIONS: u64 = 100_000;

/// Epsilon used for `=` comparisons.
pub const EQUALITY_EPSILON: f64 = 1e-9;

/// Subintervals for the composite Simpson rule.
pub const SIMPSON_SUBINTERVALS: usize = 1_000;
