//! Parse, evaluate, and symbolically transform LaTeX math expressions.
//!
//! The pipeline is tokenize → parse → evaluate, with a symbolic
//! transformer (simplify, expand, factor, differentiate, integrate)
//! operating on the same tree, and a four-layer cache in front of the
//! expensive stages.
//!
//! # Quick start
//!
//! ```
//! use latex_math::{evaluate_numeric, Environment};
//!
//! let env = Environment::new().with("x", 3.0);
//! let value = evaluate_numeric("x^{2} + 2x + 1", &env).unwrap_or(f64::NAN);
//! assert_eq!(value, 16.0);
//! ```
//!
//! For repeated work, build a [`MathEngine`]: it owns the caches, so
//! repeated parses and evaluations of the same sources are served from
//! L1/L2, and derivatives from L3.
//!
//! ```
//! use latex_math::{Environment, MathConfig, MathEngine};
//!
//! let engine = MathEngine::new(MathConfig::default());
//! let env = Environment::new();
//! let first = engine.evaluate("\\frac{1}{2}", &env);
//! let second = engine.evaluate("\\frac{1}{2}", &env); // L1 + L2 hit
//! assert_eq!(first.ok(), second.ok());
//! ```

mod engine;
mod extension;
mod validate;

pub use engine::{MathConfig, MathEngine};
pub use extension::MathExtension;
pub use validate::ValidationResult;

pub use latex_ast::{
    to_latex, BinaryOp, CompareOp, DerivativeKind, Expr, ExprVisitor, FontStyle, MatrixKind,
};
pub use latex_cache::{CacheManagerStats, CacheSettings, CacheStats, EvictionPolicy};
pub use latex_error::{
    Diagnostic, ErrorCategory, EvalError, MathError, MathResult, ParseError, SymbolicError,
    TokenizeError,
};
pub use latex_eval::{
    register_constant, register_function, Environment, EvalFn, Evaluator, FunctionCall, Handler,
};
pub use latex_numeric::{Complex, Matrix, Value};
pub use latex_parser::ParserConfig;
pub use latex_symbolic::{expand, factor, simplify};
pub use latex_token::Command;

use std::sync::Arc;

/// Parse a source string into a tree with default configuration.
pub fn parse(source: &str) -> Result<Expr, MathError> {
    latex_parser::parse(source)
}

/// One-shot evaluation without an engine (and without caching).
pub fn evaluate(source: &str, env: &Environment) -> Result<Value, MathError> {
    let tree = parse(source)?;
    evaluate_parsed(&tree, env)
}

/// Evaluate an already-parsed tree.
pub fn evaluate_parsed(tree: &Expr, env: &Environment) -> Result<Value, MathError> {
    Ok(Evaluator::new().evaluate(tree, env)?)
}

/// Evaluate and require a real scalar result.
pub fn evaluate_numeric(source: &str, env: &Environment) -> Result<f64, MathError> {
    let value = evaluate(source, env)?;
    value.as_numeric().ok_or_else(|| {
        MathError::from(EvalError::NonScalarResult { found: value.kind_name().to_string() })
    })
}

/// Evaluate and require a matrix result.
pub fn evaluate_matrix(source: &str, env: &Environment) -> Result<Matrix, MathError> {
    let value = evaluate(source, env)?;
    match value {
        Value::Matrix(m) => Ok(m),
        other => Err(MathError::from(EvalError::NonMatrixResult {
            found: other.kind_name().to_string(),
        })),
    }
}

/// Whether the source parses.
pub fn is_valid(source: &str) -> bool {
    parse(source).is_ok()
}

/// Multi-error validation pass over a source string.
pub fn validate(source: &str) -> ValidationResult {
    validate::validate_source(source, &ParserConfig::default())
}

/// Symbolic derivative of a source expression.
pub fn differentiate(source: &str, var: &str, order: u32) -> Result<Expr, MathError> {
    let tree = parse(source)?;
    differentiate_parsed(&tree, var, order)
}

/// Symbolic derivative of an already-parsed tree.
pub fn differentiate_parsed(tree: &Expr, var: &str, order: u32) -> Result<Expr, MathError> {
    Ok(latex_symbolic::differentiate(tree, var, order)?)
}

/// Symbolic antiderivative of a source expression (pattern-based).
pub fn integrate(source: &str, var: &str) -> Result<Expr, MathError> {
    let tree = parse(source)?;
    integrate_parsed(&tree, var)
}

/// Symbolic antiderivative of an already-parsed tree.
pub fn integrate_parsed(tree: &Expr, var: &str) -> Result<Expr, MathError> {
    Ok(latex_symbolic::integrate(tree, var)?)
}

/// Shared tree handle produced by the caching engine.
pub type ParsedExpr = Arc<Expr>;
