//! Polynomial expansion.
//!
//! Applies the binomial theorem to `(a±b)^n` for integer `0 <= n <= 10`
//! and fully distributes products of sums like `(a+b)(c+d)`.

use latex_ast::{BinaryOp, Expr};
use latex_error::SymbolicError;

use crate::util::{as_integer, depth_guard, rebuild, smart_mul};

/// Largest exponent the binomial theorem is applied to.
const MAX_BINOMIAL_EXPONENT: i64 = 10;

pub fn expand(expr: &Expr) -> Result<Expr, SymbolicError> {
    expand_at(expr, 0)
}

fn expand_at(expr: &Expr, depth: usize) -> Result<Expr, SymbolicError> {
    depth_guard(depth)?;
    let rebuilt = rebuild(expr, &mut |child| expand_at(child, depth + 1))?;

    match &rebuilt {
        Expr::Binary { op: BinaryOp::Pow, left, right } => {
            if let Some(n) = as_integer(right) {
                if (0..=MAX_BINOMIAL_EXPONENT).contains(&n) {
                    if let Some((a, b, subtract)) = additive_pair(left) {
                        return Ok(binomial_expansion(a, b, subtract, n as u32));
                    }
                }
            }
            Ok(rebuilt)
        }
        Expr::Binary { op: BinaryOp::Mul, left, right } => {
            if additive_pair(left).is_some() || additive_pair(right).is_some() {
                return Ok(distribute(left, right));
            }
            Ok(rebuilt)
        }
        _ => Ok(rebuilt),
    }
}

/// The two sides of an addition or subtraction node.
fn additive_pair(expr: &Expr) -> Option<(&Expr, &Expr, bool)> {
    match expr {
        Expr::Binary { op: BinaryOp::Add, left, right } => Some((left, right, false)),
        Expr::Binary { op: BinaryOp::Sub, left, right } => Some((left, right, true)),
        _ => None,
    }
}

/// Full distribution of a product over sums on either side.
fn distribute(left: &Expr, right: &Expr) -> Expr {
    if let Some((a, b, subtract)) = additive_pair(left) {
        let l = distribute(a, right);
        let r = distribute(b, right);
        return if subtract { Expr::sub(l, r) } else { Expr::add(l, r) };
    }
    if let Some((a, b, subtract)) = additive_pair(right) {
        let l = distribute(left, a);
        let r = distribute(left, b);
        return if subtract { Expr::sub(l, r) } else { Expr::add(l, r) };
    }
    Expr::mul(left.clone(), right.clone())
}

/// `(a ± b)^n` by the binomial theorem; subtraction alternates term signs.
fn binomial_expansion(a: &Expr, b: &Expr, subtract: bool, n: u32) -> Expr {
    if n == 0 {
        return Expr::Number(1.0);
    }
    let mut terms: Vec<(bool, Expr)> = Vec::new();
    for k in 0..=n {
        let coefficient = binomial_coefficient(n, k);
        let mut term = if coefficient == 1.0 {
            Expr::Number(1.0)
        } else {
            Expr::Number(coefficient)
        };
        term = smart_mul(term, integer_power(a, n - k));
        term = smart_mul(term, integer_power(b, k));
        let negative = subtract && k % 2 == 1;
        terms.push((negative, term));
    }

    let mut iter = terms.into_iter();
    let Some((first_negative, first)) = iter.next() else {
        return Expr::Number(1.0);
    };
    let mut out = if first_negative { Expr::negate(first) } else { first };
    for (negative, term) in iter {
        out = if negative { Expr::sub(out, term) } else { Expr::add(out, term) };
    }
    out
}

fn integer_power(base: &Expr, exponent: u32) -> Expr {
    match exponent {
        0 => Expr::Number(1.0),
        1 => base.clone(),
        _ => Expr::pow(base.clone(), Expr::Number(f64::from(exponent))),
    }
}

fn binomial_coefficient(n: u32, k: u32) -> f64 {
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * f64::from(n - i) / f64::from(i + 1);
    }
    result.round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::variable("x")
    }

    #[test]
    fn square_of_sum() {
        // (x+1)^2 = x^2 + 2x + 1
        let expr = Expr::pow(Expr::add(x(), Expr::Number(1.0)), Expr::Number(2.0));
        let expanded = expand(&expr).unwrap_or(expr);
        let expected = Expr::add(
            Expr::add(
                Expr::pow(x(), Expr::Number(2.0)),
                Expr::mul(Expr::Number(2.0), x()),
            ),
            Expr::Number(1.0),
        );
        assert_eq!(expanded, expected);
    }

    #[test]
    fn square_of_difference_alternates_signs() {
        // (x-1)^2 = x^2 - 2x + 1
        let expr = Expr::pow(Expr::sub(x(), Expr::Number(1.0)), Expr::Number(2.0));
        let expanded = expand(&expr).unwrap_or(expr);
        let expected = Expr::add(
            Expr::sub(
                Expr::pow(x(), Expr::Number(2.0)),
                Expr::mul(Expr::Number(2.0), x()),
            ),
            Expr::Number(1.0),
        );
        assert_eq!(expanded, expected);
    }

    #[test]
    fn product_of_sums_distributes() {
        // (a+b)(c+d) = ac + ad + bc + bd
        let a = Expr::variable("a");
        let b = Expr::variable("b");
        let c = Expr::variable("c");
        let d = Expr::variable("d");
        let expr = Expr::mul(
            Expr::add(a.clone(), b.clone()),
            Expr::add(c.clone(), d.clone()),
        );
        let expanded = expand(&expr).unwrap_or(expr);
        let expected = Expr::add(
            Expr::add(Expr::mul(a.clone(), c.clone()), Expr::mul(a, d.clone())),
            Expr::add(Expr::mul(b.clone(), c), Expr::mul(b, d)),
        );
        assert_eq!(expanded, expected);
    }

    #[test]
    fn zeroth_power_expands_to_one() {
        let expr = Expr::pow(Expr::add(x(), Expr::Number(1.0)), Expr::Number(0.0));
        assert_eq!(expand(&expr).unwrap_or(expr), Expr::Number(1.0));
    }

    #[test]
    fn large_exponents_are_left_alone() {
        let expr = Expr::pow(Expr::add(x(), Expr::Number(1.0)), Expr::Number(11.0));
        assert_eq!(expand(&expr).unwrap_or_else(|_| expr.clone()), expr);
    }

    #[test]
    fn binomial_coefficients() {
        assert_eq!(binomial_coefficient(4, 2), 6.0);
        assert_eq!(binomial_coefficient(10, 5), 252.0);
        assert_eq!(binomial_coefficient(5, 0), 1.0);
    }
}
