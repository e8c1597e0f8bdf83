//! Combinatorial and number-theoretic handlers.

use latex_error::EvalError;
use latex_numeric::Value;
use rustc_hash::FxHashMap;

use super::{add, add_unary, expect_args, numeric_arg};
use crate::memo;
use crate::registry::{EvalFn, FunctionCall, Handler};
use crate::Environment;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add_unary(map, "factorial", memo::factorial);
    add_unary(map, "fibonacci", memo::fibonacci);

    add(map, "binom", |call, env, eval| {
        expect_args(call, 2)?;
        let n = natural(numeric_arg(call, 0, env, eval)?, "binom")?;
        let k = natural(numeric_arg(call, 1, env, eval)?, "binom")?;
        if k > n {
            return Err(EvalError::domain(format!(
                "binom is undefined for k > n ({k} > {n})"
            )));
        }
        Ok(Value::Numeric(choose(n, k)))
    });

    add(map, "gcd", |call, env, eval| {
        let values = integer_args(call, env, eval, "gcd")?;
        let result = values.into_iter().fold(0, gcd);
        Ok(Value::Numeric(result as f64))
    });

    add(map, "lcm", |call, env, eval| {
        let values = integer_args(call, env, eval, "lcm")?;
        let mut result: i64 = 1;
        for value in values {
            if value == 0 {
                result = 0;
                break;
            }
            result = (result / gcd(result, value)) * value;
        }
        Ok(Value::Numeric(result.abs() as f64))
    });

    add(map, "min", |call, env, eval| reduce_scalars(call, env, eval, f64::min));
    add(map, "max", |call, env, eval| reduce_scalars(call, env, eval, f64::max));
}

/// Evaluate the subscript (if any) plus every argument as scalars and
/// fold them. `\min_{a}{b}` and `\min(a, b)` both land here.
fn reduce_scalars(
    call: &FunctionCall<'_>,
    env: &Environment,
    eval: EvalFn<'_>,
    fold: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let mut values = Vec::new();
    if let Some(sub) = call.subscript {
        values.push(scalar(eval(sub, env)?, call.name)?);
    }
    for arg in call.args {
        values.push(scalar(eval(arg, env)?, call.name)?);
    }
    let mut iter = values.into_iter();
    let first = iter.next().ok_or_else(|| {
        EvalError::domain(format!("{} needs at least one argument", call.name))
    })?;
    Ok(Value::Numeric(iter.fold(first, fold)))
}

fn scalar(value: Value, name: &str) -> Result<f64, EvalError> {
    value
        .as_numeric()
        .ok_or_else(|| EvalError::domain(format!("{name} expects real scalar arguments")))
}

fn integer_args(
    call: &FunctionCall<'_>,
    env: &Environment,
    eval: EvalFn<'_>,
    name: &str,
) -> Result<Vec<i64>, EvalError> {
    if call.args.len() < 2 {
        return Err(EvalError::domain(format!("{name} needs at least two arguments")));
    }
    call.args
        .iter()
        .map(|arg| {
            let x = eval(arg, env)?.as_numeric().ok_or_else(|| {
                EvalError::domain(format!("{name} expects integer arguments"))
            })?;
            if x.fract() != 0.0 || !x.is_finite() {
                return Err(EvalError::domain(format!(
                    "{name} expects integer arguments, got {x}"
                )));
            }
            Ok(x as i64)
        })
        .collect()
}

fn natural(x: f64, name: &str) -> Result<u64, EvalError> {
    if x.fract() != 0.0 || x < 0.0 || !x.is_finite() {
        return Err(EvalError::domain(format!(
            "{name} expects natural numbers, got {x}"
        )));
    }
    Ok(x as u64)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Multiplicative binomial coefficient, stable past the factorial range.
fn choose(n: u64, k: u64) -> f64 {
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_and_choose() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(-12, 18), 6);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(choose(5, 2), 10.0);
        assert_eq!(choose(10, 0), 1.0);
    }
}
