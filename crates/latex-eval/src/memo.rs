//! Memoized factorial and Fibonacci kernels.

use lazy_static::lazy_static;
use latex_error::EvalError;
use parking_lot::Mutex;

/// Largest n with a finite f64 factorial.
pub(crate) const MAX_FACTORIAL: usize = 170;

/// Largest n with a finite f64 Fibonacci number.
const MAX_FIBONACCI: usize = 1476;

lazy_static! {
    /// All representable factorials, computed once.
    static ref FACTORIALS: Vec<f64> = {
        let mut table = Vec::with_capacity(MAX_FACTORIAL + 1);
        table.push(1.0);
        for n in 1..=MAX_FACTORIAL {
            let previous = table[n - 1];
            table.push(previous * n as f64);
        }
        table
    };

    /// Fibonacci cache, grown on demand.
    static ref FIBONACCI: Mutex<Vec<f64>> = Mutex::new(vec![0.0, 1.0]);
}

fn natural_index(value: f64, what: &str) -> Result<usize, EvalError> {
    if value.fract() != 0.0 || value < 0.0 || !value.is_finite() {
        return Err(EvalError::domain(format!("{what} requires a natural number, got {value}")));
    }
    Ok(value as usize)
}

pub(crate) fn factorial(value: f64) -> Result<f64, EvalError> {
    let n = natural_index(value, "factorial")?;
    if n > MAX_FACTORIAL {
        return Err(EvalError::domain_with(
            format!("factorial of {n} overflows"),
            format!("the largest representable factorial is {MAX_FACTORIAL}!"),
        ));
    }
    Ok(FACTORIALS[n])
}

pub(crate) fn fibonacci(value: f64) -> Result<f64, EvalError> {
    let n = natural_index(value, "fibonacci")?;
    if n > MAX_FIBONACCI {
        return Err(EvalError::domain_with(
            format!("fibonacci({n}) overflows"),
            format!("the largest representable Fibonacci index is {MAX_FIBONACCI}"),
        ));
    }
    let mut cache = FIBONACCI.lock();
    while cache.len() <= n {
        let next = cache[cache.len() - 1] + cache[cache.len() - 2];
        cache.push(next);
    }
    Ok(cache[n])
}
