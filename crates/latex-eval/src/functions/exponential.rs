//! Exponential, logarithmic, and root handlers.
//!
//! These are the handlers that promote to the complex domain:
//! `ln(-1)` is `i*pi` and `sqrt(-1)` is `i`.

use std::f64::consts::PI;

use latex_error::EvalError;
use latex_numeric::{Complex, Value};
use rustc_hash::FxHashMap;

use super::{add, expect_args, value_arg};
use crate::registry::Handler;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add(map, "exp", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(x) => Ok(Value::Numeric(x.exp())),
            Value::Complex(z) => Ok(Value::from(z.exp())),
            Value::Matrix(_) => Err(EvalError::domain("exp of a matrix is not supported")),
        }
    });

    add(map, "ln", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(x) => natural_log(x),
            Value::Complex(z) => {
                if z.is_zero() {
                    return Err(zero_log_error("ln"));
                }
                Ok(Value::from(z.ln()))
            }
            Value::Matrix(_) => Err(EvalError::domain("ln of a matrix is not supported")),
        }
    });

    add(map, "log", |call, env, eval| {
        expect_args(call, 1)?;
        let base = match call.subscript {
            Some(base_expr) => {
                let base = eval(base_expr, env)?.as_numeric().ok_or_else(|| {
                    EvalError::domain("log base must be a real scalar")
                })?;
                if base <= 0.0 || base == 1.0 {
                    return Err(EvalError::domain_with(
                        format!("log base {base} is invalid"),
                        "the base must be positive and different from 1",
                    ));
                }
                base
            }
            None => 10.0,
        };
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(x) => {
                if x == 0.0 {
                    return Err(zero_log_error("log"));
                }
                if x < 0.0 {
                    // ln(x)/ln(b) with the principal complex log upstairs
                    let ln_b = base.ln();
                    return Ok(Value::from(Complex::new(x.abs().ln() / ln_b, PI / ln_b)));
                }
                Ok(Value::Numeric(x.ln() / base.ln()))
            }
            Value::Complex(z) => {
                if z.is_zero() {
                    return Err(zero_log_error("log"));
                }
                Ok(Value::from(z.ln().div(Complex::from_real(base.ln()))))
            }
            Value::Matrix(_) => Err(EvalError::domain("log of a matrix is not supported")),
        }
    });

    add(map, "sqrt", |call, env, eval| {
        expect_args(call, 1)?;
        match value_arg(call, 0, env, eval)? {
            Value::Numeric(x) => {
                if x < 0.0 {
                    Ok(Value::from(Complex::new(0.0, (-x).sqrt())))
                } else {
                    Ok(Value::Numeric(x.sqrt()))
                }
            }
            Value::Complex(z) => Ok(Value::from(z.sqrt())),
            Value::Matrix(_) => Err(EvalError::domain("sqrt of a matrix is not supported")),
        }
    });
}

fn natural_log(x: f64) -> Result<Value, EvalError> {
    if x == 0.0 {
        return Err(zero_log_error("ln"));
    }
    if x < 0.0 {
        // Principal branch: ln(-r) = ln(r) + i*pi
        return Ok(Value::from(Complex::new(x.abs().ln(), PI)));
    }
    Ok(Value::Numeric(x.ln()))
}

fn zero_log_error(name: &str) -> EvalError {
    EvalError::domain_with(
        format!("{name} is undefined at zero"),
        "the argument must be nonzero; negative arguments yield a complex result",
    )
}
