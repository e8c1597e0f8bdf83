//! Real part, imaginary part, and conjugation.

use latex_error::EvalError;
use latex_numeric::Value;
use rustc_hash::FxHashMap;

use super::{add, expect_args, value_arg};
use crate::registry::Handler;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add(map, "Re", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(x) => Ok(Value::Numeric(x)),
            Value::Complex(z) => Ok(Value::Numeric(z.re)),
            Value::Matrix(_) => Err(EvalError::domain("Re expects a scalar")),
        }
    });

    add(map, "Im", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(_) => Ok(Value::Numeric(0.0)),
            Value::Complex(z) => Ok(Value::Numeric(z.im)),
            Value::Matrix(_) => Err(EvalError::domain("Im expects a scalar")),
        }
    });

    for name in ["conj", "conjugate", "overline"] {
        add(map, name, |call, env, eval| {
            expect_args(call, 1)?;
            match value_arg(call, 0, env, eval)? {
                Value::Numeric(x) => Ok(Value::Numeric(x)),
                Value::Complex(z) => Ok(Value::from(z.conjugate())),
                Value::Matrix(_) => {
                    Err(EvalError::domain("conjugation expects a scalar"))
                }
            }
        });
    }
}
