//! Hyperbolic functions and their inverses.

use latex_error::EvalError;
use rustc_hash::FxHashMap;

use super::add_unary;
use crate::registry::Handler;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add_unary(map, "sinh", |x| Ok(x.sinh()));
    add_unary(map, "cosh", |x| Ok(x.cosh()));
    add_unary(map, "tanh", |x| Ok(x.tanh()));
    add_unary(map, "coth", |x| {
        nonzero(x, "coth")?;
        Ok(x.cosh() / x.sinh())
    });
    add_unary(map, "sech", |x| Ok(1.0 / x.cosh()));
    add_unary(map, "csch", |x| {
        nonzero(x, "csch")?;
        Ok(1.0 / x.sinh())
    });

    add_unary(map, "arcsinh", |x| Ok(x.asinh()));
    add_unary(map, "arccosh", |x| {
        if x < 1.0 {
            return Err(EvalError::domain_with(
                format!("arccosh is undefined for {x}"),
                "the argument must be at least 1",
            ));
        }
        Ok(x.acosh())
    });
    add_unary(map, "arctanh", |x| {
        if x.abs() >= 1.0 {
            return Err(EvalError::domain_with(
                format!("arctanh is undefined for {x}"),
                "the argument magnitude must be below 1",
            ));
        }
        Ok(x.atanh())
    });
    add_unary(map, "arccoth", |x| {
        if x.abs() <= 1.0 {
            return Err(EvalError::domain_with(
                format!("arccoth is undefined for {x}"),
                "the argument magnitude must exceed 1",
            ));
        }
        Ok(((x + 1.0) / (x - 1.0)).ln() / 2.0)
    });
    add_unary(map, "arcsech", |x| {
        if x <= 0.0 || x > 1.0 {
            return Err(EvalError::domain_with(
                format!("arcsech is undefined for {x}"),
                "the argument must be in (0, 1]",
            ));
        }
        Ok(((1.0 + (1.0 - x * x).sqrt()) / x).ln())
    });
    add_unary(map, "arccsch", |x| {
        nonzero(x, "arccsch")?;
        Ok((1.0 / x).asinh())
    });
}

fn nonzero(x: f64, name: &str) -> Result<(), EvalError> {
    if x == 0.0 {
        return Err(EvalError::domain(format!("{name} is undefined at zero")));
    }
    Ok(())
}
