//! Pattern-matched symbolic integration.
//!
//! Deliberately small: linearity, constant multiples, the power rule
//! (including `1/u`), and the `e^{ax+b}` / `sin(ax+b)` / `cos(ax+b)`
//! family. Anything else reports that no pattern matched; definite
//! integrals then fall back to numerical quadrature in the evaluator.

use latex_ast::{BinaryOp, Expr};
use latex_error::SymbolicError;

use crate::util::unary_call;

/// Antiderivative of `expr` with respect to `var`.
pub fn integrate(expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
    integrate_inner(expr, var).ok_or_else(|| SymbolicError::NoIntegrationPattern {
        detail: format!("the integrand in d{var}"),
    })
}

fn integrate_inner(expr: &Expr, var: &str) -> Option<Expr> {
    match expr {
        // Linearity
        Expr::Binary { op: BinaryOp::Add, left, right } => Some(Expr::add(
            integrate_inner(left, var)?,
            integrate_inner(right, var)?,
        )),
        Expr::Binary { op: BinaryOp::Sub, left, right } => Some(Expr::sub(
            integrate_inner(left, var)?,
            integrate_inner(right, var)?,
        )),
        Expr::Negate(inner) => Some(Expr::negate(integrate_inner(inner, var)?)),

        // Constant multiples pull out
        Expr::Binary { op: BinaryOp::Mul, left, right } => {
            if !left.references(var) {
                return Some(Expr::mul((**left).clone(), integrate_inner(right, var)?));
            }
            if !right.references(var) {
                return Some(Expr::mul((**right).clone(), integrate_inner(left, var)?));
            }
            None
        }
        Expr::Binary { op: BinaryOp::Div, left, right } => {
            // c / u is c * u^{-1}; u / c is (1/c) u
            if !right.references(var) {
                return Some(Expr::div(integrate_inner(left, var)?, (**right).clone()));
            }
            if !left.references(var) {
                // c/u: only the 1/u power-rule case
                if matches!(&**right, Expr::Variable(v) if v == var) {
                    return Some(Expr::mul(
                        (**left).clone(),
                        log_abs(Expr::variable(var)),
                    ));
                }
            }
            None
        }

        // Constants integrate to c·x
        Expr::Number(_) => Some(Expr::mul((*expr).clone(), Expr::variable(var))),
        Expr::Variable(name) if name != var => {
            Some(Expr::mul(expr.clone(), Expr::variable(var)))
        }

        // Power rule
        Expr::Variable(name) if name == var => Some(Expr::div(
            Expr::pow(Expr::variable(var), Expr::Number(2.0)),
            Expr::Number(2.0),
        )),
        Expr::Binary { op: BinaryOp::Pow, left, right } => {
            if !matches!(&**left, Expr::Variable(v) if v == var) {
                return None;
            }
            let n = match &**right {
                Expr::Number(n) if !right.references(var) => *n,
                Expr::Negate(inner) => match &**inner {
                    Expr::Number(n) => -*n,
                    _ => return None,
                },
                _ => return None,
            };
            if n == -1.0 {
                return Some(log_abs(Expr::variable(var)));
            }
            Some(Expr::div(
                Expr::pow(Expr::variable(var), Expr::Number(n + 1.0)),
                Expr::Number(n + 1.0),
            ))
        }

        // exp / sin / cos of a linear argument
        Expr::Call { .. } => {
            if let Some(u) = unary_call(expr, "exp") {
                let (a, _) = linear_coefficients(u, var)?;
                return Some(Expr::div(expr.clone(), Expr::Number(a)));
            }
            if let Some(u) = unary_call(expr, "sin") {
                let (a, _) = linear_coefficients(u, var)?;
                return Some(Expr::negate(Expr::div(
                    Expr::call("cos", vec![u.clone()]),
                    Expr::Number(a),
                )));
            }
            if let Some(u) = unary_call(expr, "cos") {
                let (a, _) = linear_coefficients(u, var)?;
                return Some(Expr::div(
                    Expr::call("sin", vec![u.clone()]),
                    Expr::Number(a),
                ));
            }
            None
        }

        _ => None,
    }
}

fn log_abs(inner: Expr) -> Expr {
    Expr::call("ln", vec![Expr::Abs(Box::new(inner))])
}

/// Match `a·var + b` with numeric `a != 0`, `b`; returns `(a, b)`.
fn linear_coefficients(expr: &Expr, var: &str) -> Option<(f64, f64)> {
    match expr {
        Expr::Variable(v) if v == var => Some((1.0, 0.0)),
        Expr::Binary { op: BinaryOp::Mul, left, right } => match (&**left, &**right) {
            (Expr::Number(a), Expr::Variable(v)) if v == var && *a != 0.0 => Some((*a, 0.0)),
            (Expr::Variable(v), Expr::Number(a)) if v == var && *a != 0.0 => Some((*a, 0.0)),
            _ => None,
        },
        Expr::Binary { op: BinaryOp::Add, left, right } => {
            let (a, b) = linear_coefficients(left, var)?;
            match &**right {
                Expr::Number(c) if b == 0.0 => Some((a, *c)),
                _ => None,
            }
        }
        Expr::Binary { op: BinaryOp::Sub, left, right } => {
            let (a, b) = linear_coefficients(left, var)?;
            match &**right {
                Expr::Number(c) if b == 0.0 => Some((a, -*c)),
                _ => None,
            }
        }
        Expr::Negate(inner) => {
            let (a, b) = linear_coefficients(inner, var)?;
            Some((-a, -b))
        }
        _ => None,
    }
}
