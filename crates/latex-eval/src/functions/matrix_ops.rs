//! Matrix reduction handlers.

use latex_error::EvalError;
use latex_numeric::Value;
use rustc_hash::FxHashMap;

use super::{add, expect_args, numeric_error, value_arg};
use crate::registry::Handler;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add(map, "det", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Matrix(m) => {
                Ok(Value::Numeric(m.determinant().map_err(numeric_error)?))
            }
            other => Err(EvalError::domain(format!(
                "det expects a matrix, got a {}",
                other.kind_name()
            ))),
        }
    });

    for name in ["trace", "tr"] {
        add(map, name, |call, env, eval| {
            expect_args(call, 1)?;
            match value_arg(call, 0, env, eval)? {
                Value::Matrix(m) => Ok(Value::Numeric(m.trace().map_err(numeric_error)?)),
                other => Err(EvalError::domain(format!(
                    "trace expects a matrix, got a {}",
                    other.kind_name()
                ))),
            }
        });
    }
}
