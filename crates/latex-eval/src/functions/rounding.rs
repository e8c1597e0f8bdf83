//! Rounding, magnitude, and sign handlers.

use latex_error::EvalError;
use latex_numeric::Value;
use rustc_hash::FxHashMap;

use super::{add, add_unary, expect_args, value_arg};
use crate::registry::Handler;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add_unary(map, "floor", |x| Ok(x.floor()));
    add_unary(map, "ceil", |x| Ok(x.ceil()));
    add_unary(map, "round", |x| Ok(x.round()));

    add(map, "abs", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(x) => Ok(Value::Numeric(x.abs())),
            Value::Complex(z) => Ok(Value::Numeric(z.modulus())),
            Value::Matrix(m) => m
                .vector_magnitude()
                .map(Value::Numeric)
                .ok_or_else(|| {
                    EvalError::domain("abs of a matrix is only defined for vectors")
                }),
        }
    });

    for name in ["sgn", "sign"] {
        add_unary(map, name, |x| {
            if x == 0.0 {
                return Ok(0.0);
            }
            Ok(x.signum())
        });
    }
}
