//! Built-in function handlers, grouped by family.
//!
//! The grouping is organizational; every handler has the same runtime
//! contract. Each handler validates its own arguments, raises its own
//! domain errors, and promotes to complex where the mathematics calls
//! for it.

mod combinatorics;
mod complex_parts;
mod exponential;
mod hyperbolic;
mod matrix_ops;
mod rounding;
mod trig;

use std::sync::Arc;

use latex_error::EvalError;
use latex_numeric::{NumericError, Value};
use rustc_hash::FxHashMap;

use crate::registry::{EvalFn, FunctionCall, Handler};
use crate::Environment;

/// Assemble the full built-in handler table.
pub(crate) fn builtin_functions() -> FxHashMap<String, Handler> {
    let mut map = FxHashMap::default();
    trig::install(&mut map);
    hyperbolic::install(&mut map);
    exponential::install(&mut map);
    rounding::install(&mut map);
    combinatorics::install(&mut map);
    complex_parts::install(&mut map);
    matrix_ops::install(&mut map);
    map
}

pub(crate) fn add<F>(map: &mut FxHashMap<String, Handler>, name: &str, handler: F)
where
    F: Fn(&FunctionCall<'_>, &Environment, EvalFn<'_>) -> Result<Value, EvalError>
        + Send
        + Sync
        + 'static,
{
    map.insert(name.to_string(), Arc::new(handler) as Handler);
}

/// Register a one-scalar-argument handler from a plain numeric function.
pub(crate) fn add_unary<F>(map: &mut FxHashMap<String, Handler>, name: &str, f: F)
where
    F: Fn(f64) -> Result<f64, EvalError> + Send + Sync + 'static,
{
    add(map, name, move |call, env, eval| {
        expect_args(call, 1)?;
        let x = numeric_arg(call, 0, env, eval)?;
        Ok(Value::Numeric(f(x)?))
    });
}

pub(crate) fn expect_args(call: &FunctionCall<'_>, count: usize) -> Result<(), EvalError> {
    if call.args.len() != count {
        return Err(EvalError::domain(format!(
            "{} expects {count} argument(s), got {}",
            call.name,
            call.args.len()
        )));
    }
    Ok(())
}

pub(crate) fn value_arg(
    call: &FunctionCall<'_>,
    index: usize,
    env: &Environment,
    eval: EvalFn<'_>,
) -> Result<Value, EvalError> {
    eval(&call.args[index], env)
}

pub(crate) fn numeric_arg(
    call: &FunctionCall<'_>,
    index: usize,
    env: &Environment,
    eval: EvalFn<'_>,
) -> Result<f64, EvalError> {
    value_arg(call, index, env, eval)?
        .as_numeric()
        .ok_or_else(|| {
            EvalError::domain(format!("{} expects a real scalar argument", call.name))
        })
}

/// Translate kernel errors into the evaluator taxonomy.
pub(crate) fn numeric_error(error: NumericError) -> EvalError {
    match error {
        NumericError::ShapeMismatch { op, lhs_rows, lhs_cols, rhs_rows, rhs_cols } => {
            EvalError::ShapeMismatch {
                op: op.to_string(),
                lhs_rows,
                lhs_cols,
                rhs_rows,
                rhs_cols,
            }
        }
        NumericError::NotSquare { op, rows, cols } => {
            EvalError::domain(format!("{op} requires a square matrix, found {rows}x{cols}"))
        }
        NumericError::Singular => EvalError::SingularMatrix,
        NumericError::RaggedRows => EvalError::domain("matrix rows have unequal lengths"),
        NumericError::Empty => EvalError::domain("matrix must not be empty"),
    }
}
