//! Polynomial factoring.
//!
//! Two shapes are recognized: the difference of squares `A^2 - B^2` and
//! monic quadratics `x^2 + bx + c` whose constant term splits into two
//! integers summing to `b`. Everything else is returned unchanged.

use latex_ast::{BinaryOp, Expr};
use latex_error::SymbolicError;

use crate::util::{as_integer, depth_guard, rebuild};

pub fn factor(expr: &Expr) -> Result<Expr, SymbolicError> {
    factor_at(expr, 0)
}

fn factor_at(expr: &Expr, depth: usize) -> Result<Expr, SymbolicError> {
    depth_guard(depth)?;
    let rebuilt = rebuild(expr, &mut |child| factor_at(child, depth + 1))?;

    if let Some(out) = difference_of_squares(&rebuilt) {
        return Ok(out);
    }
    if let Some(out) = integer_quadratic(&rebuilt) {
        return Ok(out);
    }
    Ok(rebuilt)
}

/// `A^2 - B^2 = (A - B)(A + B)`.
fn difference_of_squares(expr: &Expr) -> Option<Expr> {
    let Expr::Binary { op: BinaryOp::Sub, left, right } = expr else {
        return None;
    };
    let a = squared(left)?;
    let b = squared(right)?;
    Some(Expr::mul(
        Expr::sub(a.clone(), b.clone()),
        Expr::add(a.clone(), b.clone()),
    ))
}

fn squared(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Binary { op: BinaryOp::Pow, left, right }
            if matches!(&**right, Expr::Number(n) if *n == 2.0) =>
        {
            Some(left)
        }
        _ => None,
    }
}

/// `x^2 + bx + c = (x + p)(x + q)` when integers `p + q = b`, `p·q = c`.
fn integer_quadratic(expr: &Expr) -> Option<Expr> {
    let var = find_squared_variable(expr)?;
    let poly = collect_quadratic(expr, &var)?;
    if poly.quadratic != 1.0 {
        return None;
    }
    let b = integer(poly.linear)?;
    let c = integer(poly.constant)?;
    if c == 0 {
        return None;
    }

    // Try every divisor pair of the constant term
    for p in divisors(c) {
        let q = c / p;
        if p + q == b {
            return Some(Expr::mul(linear_factor(&var, p), linear_factor(&var, q)));
        }
    }
    None
}

fn linear_factor(var: &str, root_offset: i64) -> Expr {
    let x = Expr::variable(var);
    if root_offset >= 0 {
        Expr::add(x, Expr::Number(root_offset as f64))
    } else {
        Expr::sub(x, Expr::Number((-root_offset) as f64))
    }
}

fn integer(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value.abs() < 9e15).then_some(value as i64)
}

fn divisors(c: i64) -> Vec<i64> {
    let mut out = Vec::new();
    let magnitude = c.abs();
    for d in 1..=magnitude {
        if magnitude % d == 0 {
            out.push(d);
            out.push(-d);
        }
    }
    out
}

/// The variable appearing as `v^2` somewhere in the sum.
fn find_squared_variable(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Binary { op: BinaryOp::Add | BinaryOp::Sub, left, right } => {
            find_squared_variable(left).or_else(|| find_squared_variable(right))
        }
        Expr::Binary { op: BinaryOp::Pow, left, right } => match (&**left, &**right) {
            (Expr::Variable(v), Expr::Number(n)) if *n == 2.0 => Some(v.clone()),
            _ => None,
        },
        _ => None,
    }
}

struct QuadraticTerms {
    quadratic: f64,
    linear: f64,
    constant: f64,
}

/// Express the tree as `a·v^2 + b·v + c`; `None` when any term does not
/// fit that shape.
fn collect_quadratic(expr: &Expr, var: &str) -> Option<QuadraticTerms> {
    let mut poly = QuadraticTerms { quadratic: 0.0, linear: 0.0, constant: 0.0 };
    collect_into(expr, var, 1.0, &mut poly)?;
    Some(poly)
}

fn collect_into(expr: &Expr, var: &str, sign: f64, poly: &mut QuadraticTerms) -> Option<()> {
    match expr {
        Expr::Binary { op: BinaryOp::Add, left, right } => {
            collect_into(left, var, sign, poly)?;
            collect_into(right, var, sign, poly)
        }
        Expr::Binary { op: BinaryOp::Sub, left, right } => {
            collect_into(left, var, sign, poly)?;
            collect_into(right, var, -sign, poly)
        }
        Expr::Negate(inner) => collect_into(inner, var, -sign, poly),
        _ => {
            let (coefficient, degree) = term_shape(expr, var)?;
            match degree {
                0 => poly.constant += sign * coefficient,
                1 => poly.linear += sign * coefficient,
                2 => poly.quadratic += sign * coefficient,
                _ => return None,
            }
            Some(())
        }
    }
}

/// `(coefficient, degree)` of a single monomial in `var`.
fn term_shape(expr: &Expr, var: &str) -> Option<(f64, u32)> {
    match expr {
        Expr::Number(n) => Some((*n, 0)),
        Expr::Variable(v) if v == var => Some((1.0, 1)),
        Expr::Binary { op: BinaryOp::Pow, left, right } => match (&**left, as_integer(right)) {
            (Expr::Variable(v), Some(2)) if v == var => Some((1.0, 2)),
            _ => None,
        },
        Expr::Binary { op: BinaryOp::Mul, left, right } => {
            match (&**left, &**right) {
                (Expr::Number(c), rest) | (rest, Expr::Number(c)) => {
                    let (coefficient, degree) = term_shape(rest, var)?;
                    Some((c * coefficient, degree))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::variable("x")
    }

    #[test]
    fn difference_of_squares_factors() {
        // x^2 - 9 is not a difference of squares node-wise; use a^2 - b^2
        let expr = Expr::sub(
            Expr::pow(Expr::variable("a"), Expr::Number(2.0)),
            Expr::pow(Expr::variable("b"), Expr::Number(2.0)),
        );
        let factored = factor(&expr).unwrap_or(expr);
        assert_eq!(
            factored,
            Expr::mul(
                Expr::sub(Expr::variable("a"), Expr::variable("b")),
                Expr::add(Expr::variable("a"), Expr::variable("b")),
            )
        );
    }

    #[test]
    fn quadratic_with_integer_roots() {
        // x^2 + 5x + 6 = (x + 2)(x + 3)
        let expr = Expr::add(
            Expr::add(
                Expr::pow(x(), Expr::Number(2.0)),
                Expr::mul(Expr::Number(5.0), x()),
            ),
            Expr::Number(6.0),
        );
        let factored = factor(&expr).unwrap_or_else(|_| expr.clone());
        assert_eq!(
            factored,
            Expr::mul(
                Expr::add(x(), Expr::Number(2.0)),
                Expr::add(x(), Expr::Number(3.0)),
            )
        );
    }

    #[test]
    fn quadratic_with_negative_roots() {
        // x^2 - x - 6 = (x + 2)(x - 3)
        let expr = Expr::sub(
            Expr::sub(Expr::pow(x(), Expr::Number(2.0)), x()),
            Expr::Number(6.0),
        );
        let factored = factor(&expr).unwrap_or_else(|_| expr.clone());
        assert_eq!(
            factored,
            Expr::mul(
                Expr::add(x(), Expr::Number(2.0)),
                Expr::sub(x(), Expr::Number(3.0)),
            )
        );
    }

    #[test]
    fn irreducible_quadratic_is_unchanged() {
        // x^2 + x + 1 has no integer roots
        let expr = Expr::add(
            Expr::add(Expr::pow(x(), Expr::Number(2.0)), x()),
            Expr::Number(1.0),
        );
        assert_eq!(factor(&expr).unwrap_or_else(|_| expr.clone()), expr);
    }

    #[test]
    fn non_monic_quadratic_is_unchanged() {
        let expr = Expr::add(
            Expr::mul(Expr::Number(2.0), Expr::pow(x(), Expr::Number(2.0))),
            Expr::Number(1.0),
        );
        assert_eq!(factor(&expr).unwrap_or_else(|_| expr.clone()), expr);
    }
}
