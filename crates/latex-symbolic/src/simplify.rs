//! Algebraic simplification as a bounded fixpoint.
//!
//! Each pass rewrites bottom-up; rule families apply in a fixed order
//! (algebraic identities, constant folding, trigonometric identities,
//! logarithm laws, rational cancellation) and the first matching rule
//! wins. Passes repeat until the tree stops changing or the pass cap is
//! reached.

use latex_ast::{BinaryOp, Expr};
use latex_error::SymbolicError;

use crate::util::{depth_guard, flatten_mul, is_number, product_of, rebuild, unary_call};
use crate::MAX_FIXPOINT_PASSES;

/// Simplify to fixpoint. Idempotent: simplifying a simplified tree is a
/// no-op.
pub fn simplify(expr: &Expr) -> Result<Expr, SymbolicError> {
    let mut current = expr.clone();
    for _ in 0..MAX_FIXPOINT_PASSES {
        let next = simplify_pass(&current, 0)?;
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

fn simplify_pass(expr: &Expr, depth: usize) -> Result<Expr, SymbolicError> {
    depth_guard(depth)?;
    let rebuilt = rebuild(expr, &mut |child| simplify_pass(child, depth + 1))?;
    Ok(rewrite(rebuilt))
}

/// Node-level rewrite with children already simplified.
fn rewrite(expr: Expr) -> Expr {
    if let Some(out) = algebraic_rule(&expr) {
        return out;
    }
    if let Some(out) = constant_fold(&expr) {
        return out;
    }
    if let Some(out) = trig_rule(&expr) {
        return out;
    }
    if let Some(out) = log_rule(&expr) {
        return out;
    }
    if let Some(out) = rational_rule(&expr) {
        return out;
    }
    expr
}

fn algebraic_rule(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Binary { op: BinaryOp::Add, left, right } => {
            if is_number(left, 0.0) {
                return Some((**right).clone());
            }
            if is_number(right, 0.0) {
                return Some((**left).clone());
            }
            None
        }
        Expr::Binary { op: BinaryOp::Sub, left, right } => {
            if is_number(right, 0.0) {
                return Some((**left).clone());
            }
            // Applied structurally even where floating point would drift
            if left == right {
                return Some(Expr::Number(0.0));
            }
            None
        }
        Expr::Binary { op: BinaryOp::Mul, left, right } => {
            if is_number(left, 0.0) || is_number(right, 0.0) {
                return Some(Expr::Number(0.0));
            }
            if is_number(left, 1.0) {
                return Some((**right).clone());
            }
            if is_number(right, 1.0) {
                return Some((**left).clone());
            }
            None
        }
        Expr::Binary { op: BinaryOp::Div, left, right } => {
            if is_number(right, 1.0) {
                return Some((**left).clone());
            }
            if left == right {
                return Some(Expr::Number(1.0));
            }
            // (c·x)/x cancels to c
            if let Expr::Binary { op: BinaryOp::Mul, left: a, right: b } = &**left {
                if &**b == &**right {
                    return Some((**a).clone());
                }
                if &**a == &**right {
                    return Some((**b).clone());
                }
            }
            None
        }
        Expr::Binary { op: BinaryOp::Pow, left, right } => {
            if is_number(right, 0.0) {
                return Some(Expr::Number(1.0));
            }
            if is_number(right, 1.0) {
                return Some((**left).clone());
            }
            if is_number(left, 1.0) {
                return Some(Expr::Number(1.0));
            }
            None
        }
        Expr::Negate(inner) => match &**inner {
            Expr::Negate(deep) => Some((**deep).clone()),
            Expr::Number(n) => Some(Expr::Number(-n)),
            _ => None,
        },
        _ => None,
    }
}

fn constant_fold(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Binary { op, left, right } => {
            let (Expr::Number(a), Expr::Number(b)) = (&**left, &**right) else {
                return None;
            };
            let folded = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                // Division by zero is the evaluator's error to raise
                BinaryOp::Div if *b != 0.0 => a / b,
                BinaryOp::Pow => a.powf(*b),
                _ => return None,
            };
            folded.is_finite().then_some(Expr::Number(folded))
        }
        Expr::Abs(inner) => match &**inner {
            Expr::Number(n) => Some(Expr::Number(n.abs())),
            _ => None,
        },
        _ => None,
    }
}

fn trig_rule(expr: &Expr) -> Option<Expr> {
    // sin^2(u) + cos^2(u) = 1, in either term order
    if let Expr::Binary { op: BinaryOp::Add, left, right } = expr {
        if let (Some(a), Some(b)) = (squared_call(left, "sin"), squared_call(right, "cos")) {
            if a == b {
                return Some(Expr::Number(1.0));
            }
        }
        if let (Some(a), Some(b)) = (squared_call(left, "cos"), squared_call(right, "sin")) {
            if a == b {
                return Some(Expr::Number(1.0));
            }
        }
    }

    for (name, odd) in [("sin", true), ("cos", false), ("tan", true)] {
        let Some(arg) = unary_call(expr, name) else { continue };

        // Values at 0, pi/2, and pi
        if let Some(value) = trig_value(name, arg) {
            return Some(Expr::Number(value));
        }

        // Parity: sin(-u) = -sin(u), cos(-u) = cos(u)
        if let Expr::Negate(inner) = arg {
            let call = Expr::call(name, vec![(**inner).clone()]);
            return Some(if odd { Expr::negate(call) } else { call });
        }
    }
    None
}

/// The exact values the simplifier recognizes without evaluating.
fn trig_value(name: &str, arg: &Expr) -> Option<f64> {
    let is_pi = matches!(arg, Expr::Variable(v) if v == "pi");
    let is_half_pi = matches!(
        arg,
        Expr::Binary { op: BinaryOp::Div, left, right }
            if matches!(&**left, Expr::Variable(v) if v == "pi") && is_number(right, 2.0)
    );
    if is_number(arg, 0.0) {
        return match name {
            "sin" | "tan" => Some(0.0),
            "cos" => Some(1.0),
            _ => None,
        };
    }
    if is_pi {
        return match name {
            "sin" | "tan" => Some(0.0),
            "cos" => Some(-1.0),
            _ => None,
        };
    }
    if is_half_pi {
        return match name {
            "sin" => Some(1.0),
            "cos" => Some(0.0),
            _ => None,
        };
    }
    None
}

/// `u` from `sin(u)^2`-shaped subtrees.
fn squared_call<'a>(expr: &'a Expr, name: &str) -> Option<&'a Expr> {
    match expr {
        Expr::Binary { op: BinaryOp::Pow, left, right } if is_number(right, 2.0) => {
            unary_call(left, name)
        }
        _ => None,
    }
}

fn log_rule(expr: &Expr) -> Option<Expr> {
    if let Some(arg) = unary_call(expr, "ln") {
        if is_number(arg, 1.0) {
            return Some(Expr::Number(0.0));
        }
        if matches!(arg, Expr::Variable(v) if v == "e") {
            return Some(Expr::Number(1.0));
        }
        // ln(u^n) = n ln(u)
        if let Expr::Binary { op: BinaryOp::Pow, left, right } = arg {
            return Some(Expr::mul(
                (**right).clone(),
                Expr::call("ln", vec![(**left).clone()]),
            ));
        }
        return None;
    }

    if let Expr::Call { name, args, subscript } = expr {
        if name == "log" && args.len() == 1 {
            let arg = &args[0];
            if is_number(arg, 1.0) {
                return Some(Expr::Number(0.0));
            }
            if let Some(base) = subscript {
                // log_b(b) = 1
                if &**base == arg {
                    return Some(Expr::Number(1.0));
                }
                // Base e is the natural log in different clothes
                if matches!(&**base, Expr::Variable(v) if v == "e") {
                    return Some(Expr::call("ln", vec![arg.clone()]));
                }
            }
            // log(u^n) = n log(u), preserving the base
            if let Expr::Binary { op: BinaryOp::Pow, left, right } = arg {
                return Some(Expr::mul(
                    (**right).clone(),
                    Expr::Call {
                        name: "log".to_string(),
                        args: vec![(**left).clone()],
                        subscript: subscript.clone(),
                    },
                ));
            }
        }
    }
    None
}

/// Cancel structurally equal factors across a quotient.
fn rational_rule(expr: &Expr) -> Option<Expr> {
    let Expr::Binary { op: BinaryOp::Div, left, right } = expr else {
        return None;
    };
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    flatten_mul(left, &mut numerator);
    flatten_mul(right, &mut denominator);
    if numerator.len() < 2 && denominator.len() < 2 {
        return None;
    }

    let mut cancelled = false;
    let mut remaining_den: Vec<Expr> = Vec::new();
    for factor in denominator {
        if let Some(pos) = numerator.iter().position(|f| *f == factor) {
            numerator.remove(pos);
            cancelled = true;
        } else {
            remaining_den.push(factor);
        }
    }
    if !cancelled {
        return None;
    }

    let numerator = product_of(numerator);
    if remaining_den.is_empty() {
        Some(numerator)
    } else {
        Some(Expr::div(numerator, product_of(remaining_den)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::variable("x")
    }

    fn simp(expr: Expr) -> Expr {
        simplify(&expr).unwrap_or(expr)
    }

    #[test]
    fn additive_and_multiplicative_identities() {
        assert_eq!(simp(Expr::add(x(), Expr::Number(0.0))), x());
        assert_eq!(simp(Expr::add(Expr::Number(0.0), x())), x());
        assert_eq!(simp(Expr::sub(x(), Expr::Number(0.0))), x());
        assert_eq!(simp(Expr::mul(x(), Expr::Number(1.0))), x());
        assert_eq!(simp(Expr::mul(Expr::Number(0.0), x())), Expr::Number(0.0));
        assert_eq!(simp(Expr::div(x(), Expr::Number(1.0))), x());
    }

    #[test]
    fn self_cancellation() {
        assert_eq!(simp(Expr::sub(x(), x())), Expr::Number(0.0));
        assert_eq!(simp(Expr::div(x(), x())), Expr::Number(1.0));
        let cx_over_x = Expr::div(Expr::mul(Expr::Number(3.0), x()), x());
        assert_eq!(simp(cx_over_x), Expr::Number(3.0));
    }

    #[test]
    fn power_identities() {
        assert_eq!(simp(Expr::pow(x(), Expr::Number(0.0))), Expr::Number(1.0));
        assert_eq!(simp(Expr::pow(x(), Expr::Number(1.0))), x());
        assert_eq!(
            simp(Expr::negate(Expr::negate(x()))),
            x()
        );
    }

    #[test]
    fn constant_subtrees_fold() {
        let expr = Expr::add(Expr::mul(Expr::Number(2.0), Expr::Number(3.0)), Expr::Number(4.0));
        assert_eq!(simp(expr), Expr::Number(10.0));
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let expr = Expr::div(Expr::Number(1.0), Expr::Number(0.0));
        assert_eq!(simp(expr.clone()), expr);
    }

    #[test]
    fn pythagorean_identity_in_both_orders() {
        let sin2 = Expr::pow(Expr::call("sin", vec![x()]), Expr::Number(2.0));
        let cos2 = Expr::pow(Expr::call("cos", vec![x()]), Expr::Number(2.0));
        assert_eq!(simp(Expr::add(sin2.clone(), cos2.clone())), Expr::Number(1.0));
        assert_eq!(simp(Expr::add(cos2, sin2)), Expr::Number(1.0));
    }

    #[test]
    fn pythagorean_identity_requires_same_argument() {
        let sin2 = Expr::pow(Expr::call("sin", vec![x()]), Expr::Number(2.0));
        let cos2 = Expr::pow(Expr::call("cos", vec![Expr::variable("y")]), Expr::Number(2.0));
        let expr = Expr::add(sin2, cos2);
        assert_eq!(simp(expr.clone()), expr);
    }

    #[test]
    fn trig_values_and_parity() {
        assert_eq!(simp(Expr::call("sin", vec![Expr::Number(0.0)])), Expr::Number(0.0));
        assert_eq!(simp(Expr::call("cos", vec![Expr::variable("pi")])), Expr::Number(-1.0));
        assert_eq!(
            simp(Expr::call("sin", vec![Expr::div(Expr::variable("pi"), Expr::Number(2.0))])),
            Expr::Number(1.0)
        );
        assert_eq!(
            simp(Expr::call("sin", vec![Expr::negate(x())])),
            Expr::negate(Expr::call("sin", vec![x()]))
        );
        assert_eq!(
            simp(Expr::call("cos", vec![Expr::negate(x())])),
            Expr::call("cos", vec![x()])
        );
    }

    #[test]
    fn logarithm_laws() {
        assert_eq!(simp(Expr::call("ln", vec![Expr::Number(1.0)])), Expr::Number(0.0));
        assert_eq!(simp(Expr::call("ln", vec![Expr::variable("e")])), Expr::Number(1.0));
        assert_eq!(
            simp(Expr::call("ln", vec![Expr::pow(x(), Expr::Number(3.0))])),
            Expr::mul(Expr::Number(3.0), Expr::call("ln", vec![x()]))
        );
        let log2_of_2 = Expr::Call {
            name: "log".to_string(),
            args: vec![Expr::Number(2.0)],
            subscript: Some(Box::new(Expr::Number(2.0))),
        };
        assert_eq!(simp(log2_of_2), Expr::Number(1.0));
    }

    #[test]
    fn rational_cancellation() {
        // (x*y)/(x*z) = y/z
        let expr = Expr::div(
            Expr::mul(x(), Expr::variable("y")),
            Expr::mul(x(), Expr::variable("z")),
        );
        assert_eq!(simp(expr), Expr::div(Expr::variable("y"), Expr::variable("z")));
    }

    #[test]
    fn simplifier_is_idempotent() {
        let exprs = vec![
            Expr::add(Expr::mul(Expr::Number(2.0), x()), Expr::Number(0.0)),
            Expr::div(Expr::mul(Expr::Number(3.0), x()), x()),
            Expr::call("sin", vec![Expr::negate(x())]),
            Expr::pow(Expr::add(x(), Expr::Number(1.0)), Expr::Number(2.0)),
        ];
        for expr in exprs {
            let once = simplify(&expr).unwrap_or_else(|_| expr.clone());
            let twice = simplify(&once).unwrap_or_else(|_| once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn as_integer_helper() {
        use crate::util::as_integer;
        assert_eq!(as_integer(&Expr::Number(4.0)), Some(4));
        assert_eq!(as_integer(&Expr::negate(Expr::Number(4.0))), Some(-4));
        assert_eq!(as_integer(&Expr::Number(0.5)), None);
    }
}
