//! Trigonometric functions and their inverses.

use std::f64::consts::FRAC_PI_2;

use latex_error::EvalError;
use rustc_hash::FxHashMap;

use super::add_unary;
use crate::registry::Handler;

/// Denominators smaller than this are a pole.
const POLE_EPSILON: f64 = 1e-12;

pub(crate) fn install(map: &mut FxHashMap<String, Handler>) {
    add_unary(map, "sin", |x| Ok(x.sin()));
    add_unary(map, "cos", |x| Ok(x.cos()));
    add_unary(map, "tan", |x| {
        if x.cos().abs() < POLE_EPSILON {
            return Err(EvalError::domain("tangent is undefined at odd multiples of pi/2"));
        }
        Ok(x.tan())
    });
    add_unary(map, "cot", |x| {
        if x.sin().abs() < POLE_EPSILON {
            return Err(EvalError::domain("cotangent is undefined at multiples of pi"));
        }
        Ok(x.cos() / x.sin())
    });
    add_unary(map, "sec", |x| {
        if x.cos().abs() < POLE_EPSILON {
            return Err(EvalError::domain("secant is undefined at odd multiples of pi/2"));
        }
        Ok(1.0 / x.cos())
    });
    add_unary(map, "csc", |x| {
        if x.sin().abs() < POLE_EPSILON {
            return Err(EvalError::domain("cosecant is undefined at multiples of pi"));
        }
        Ok(1.0 / x.sin())
    });

    add_unary(map, "arcsin", |x| {
        in_unit_interval(x, "arcsin")?;
        Ok(x.asin())
    });
    add_unary(map, "arccos", |x| {
        in_unit_interval(x, "arccos")?;
        Ok(x.acos())
    });
    add_unary(map, "arctan", |x| Ok(x.atan()));
    // Principal value in (0, pi)
    add_unary(map, "arccot", |x| Ok(FRAC_PI_2 - x.atan()));
    add_unary(map, "arcsec", |x| {
        outside_unit_interval(x, "arcsec")?;
        Ok((1.0 / x).acos())
    });
    add_unary(map, "arccsc", |x| {
        outside_unit_interval(x, "arccsc")?;
        Ok((1.0 / x).asin())
    });
}

fn in_unit_interval(x: f64, name: &str) -> Result<(), EvalError> {
    if !(-1.0..=1.0).contains(&x) {
        return Err(EvalError::domain_with(
            format!("{name} is undefined for {x}"),
            "the argument must be within [-1, 1]",
        ));
    }
    Ok(())
}

fn outside_unit_interval(x: f64, name: &str) -> Result<(), EvalError> {
    if x.abs() < 1.0 {
        return Err(EvalError::domain_with(
            format!("{name} is undefined for {x}"),
            "the argument magnitude must be at least 1",
        ));
    }
    Ok(())
}
