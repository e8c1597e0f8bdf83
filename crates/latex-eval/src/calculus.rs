//! Numeric calculus kernels: quadrature and limits.

use latex_error::EvalError;

/// Composite Simpson's rule over `[a, b]` with `n` subintervals.
///
/// `n` must be even; the caller passes the fixed engine constant.
pub(crate) fn simpson<F>(f: F, a: f64, b: f64, n: usize) -> Result<f64, EvalError>
where
    F: Fn(f64) -> Result<f64, EvalError>,
{
    if a == b {
        return Ok(0.0);
    }
    let h = (b - a) / n as f64;
    let mut sum = f(a)? + f(b)?;
    for i in 1..n {
        let x = a + h * i as f64;
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(x)?;
    }
    Ok(sum * h / 3.0)
}

/// Step schedule for a finite limit target, largest first.
const FINITE_STEPS: [f64; 5] = [1e-1, 1e-3, 1e-5, 1e-7, 1e-9];

/// Sample magnitudes for an infinite target.
const INFINITE_STEPS: [f64; 4] = [1e2, 1e4, 1e6, 1e8];

/// Agreement tolerance for the two one-sided approaches.
const TWO_SIDED_TOLERANCE: f64 = 1e-10;

/// Two-sided numeric limit of `f` as its argument approaches `target`.
///
/// `f` returns `None` where the body fails to evaluate to a finite
/// scalar; the limit exists when both sides settle on the same value, or
/// when exactly one side is defined at all.
pub(crate) fn limit<F>(f: F, target: f64, var: &str) -> Result<f64, EvalError>
where
    F: Fn(f64) -> Option<f64>,
{
    if target.is_infinite() {
        return limit_at_infinity(f, target.signum(), var);
    }

    let mut left = None;
    let mut right = None;
    for h in FINITE_STEPS {
        if let Some(v) = f(target - h) {
            left = Some(v);
        }
        if let Some(v) = f(target + h) {
            right = Some(v);
        }
    }

    match (left, right) {
        (Some(l), Some(r)) => {
            let tolerance = TWO_SIDED_TOLERANCE * (1.0 + l.abs().max(r.abs()));
            if (l - r).abs() <= tolerance {
                Ok((l + r) / 2.0)
            } else {
                Err(EvalError::LimitDoesNotExist { var: var.to_string() })
            }
        }
        (Some(l), None) => Ok(l),
        (None, Some(r)) => Ok(r),
        (None, None) => Err(EvalError::LimitDoesNotExist { var: var.to_string() }),
    }
}

fn limit_at_infinity<F>(f: F, sign: f64, var: &str) -> Result<f64, EvalError>
where
    F: Fn(f64) -> Option<f64>,
{
    let mut previous = None;
    let mut last = None;
    for magnitude in INFINITE_STEPS {
        if let Some(v) = f(sign * magnitude) {
            previous = last;
            last = Some(v);
        }
    }
    match (previous, last) {
        (Some(a), Some(b)) => {
            if (a - b).abs() <= 1e-6 * (1.0 + b.abs()) {
                Ok(b)
            } else {
                Err(EvalError::LimitDoesNotExist { var: var.to_string() })
            }
        }
        (None, Some(b)) => Ok(b),
        _ => Err(EvalError::LimitDoesNotExist { var: var.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simpson_integrates_sine() {
        let result = simpson(|x| Ok(x.sin()), 0.0, std::f64::consts::PI, 1000);
        assert!((result.unwrap_or(0.0) - 2.0).abs() < 1e-3);
    }

    #[test]
    fn simpson_on_empty_interval() {
        assert_eq!(simpson(|_| Ok(1.0), 2.0, 2.0, 1000), Ok(0.0));
    }

    #[test]
    fn limit_of_sinc_at_zero() {
        let f = |x: f64| {
            let v = x.sin() / x;
            v.is_finite().then_some(v)
        };
        let result = limit(f, 0.0, "x");
        assert!((result.unwrap_or(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn limit_at_infinity_of_reciprocal() {
        let f = |x: f64| {
            let v = 1.0 / x;
            v.is_finite().then_some(v)
        };
        let result = limit(f, f64::INFINITY, "x");
        assert!(result.unwrap_or(1.0).abs() < 1e-5);
    }

    #[test]
    fn divergent_two_sided_limit_errors() {
        // 1/x approaches opposite infinities from each side; samples are
        // finite but disagree wildly
        let f = |x: f64| {
            let v = 1.0 / x;
            v.is_finite().then_some(v)
        };
        assert!(matches!(
            limit(f, 0.0, "x"),
            Err(EvalError::LimitDoesNotExist { .. })
        ));
    }
}
