//! Symbolic differentiation.
//!
//! Standard calculus rules over the tree: constant, power (including
//! non-integer and variable exponents), sum, difference, product,
//! quotient, and chain rules; trigonometric, inverse trigonometric,
//! hyperbolic, exponential, and logarithmic derivatives; the special
//! forms `sqrt(u)`, `|u|` (through `sign`), and `u^v`. Each order of a
//! higher-order derivative is passed through the simplifier once.

use latex_ast::{BinaryOp, Expr};
use latex_error::SymbolicError;

use crate::simplify::simplify;
use crate::util::depth_guard;

/// Differentiate `expr` with respect to `var`, `order` times.
pub fn differentiate(expr: &Expr, var: &str, order: u32) -> Result<Expr, SymbolicError> {
    let mut current = expr.clone();
    for _ in 0..order.max(1) {
        let derivative = d(&current, var, 0)?;
        current = simplify(&derivative)?;
    }
    Ok(current)
}

fn d(expr: &Expr, var: &str, depth: usize) -> Result<Expr, SymbolicError> {
    depth_guard(depth)?;
    match expr {
        Expr::Number(_) => Ok(Expr::Number(0.0)),
        Expr::Variable(name) => {
            Ok(Expr::Number(if name == var { 1.0 } else { 0.0 }))
        }
        Expr::Fonted { name, .. } => {
            Ok(Expr::Number(if name == var { 1.0 } else { 0.0 }))
        }
        Expr::Binary { op: BinaryOp::Add, left, right } => Ok(Expr::add(
            d(left, var, depth + 1)?,
            d(right, var, depth + 1)?,
        )),
        Expr::Binary { op: BinaryOp::Sub, left, right } => Ok(Expr::sub(
            d(left, var, depth + 1)?,
            d(right, var, depth + 1)?,
        )),
        Expr::Binary { op: BinaryOp::Mul, left, right } => {
            // u'v + uv'
            let du = d(left, var, depth + 1)?;
            let dv = d(right, var, depth + 1)?;
            Ok(Expr::add(
                Expr::mul(du, (**right).clone()),
                Expr::mul((**left).clone(), dv),
            ))
        }
        Expr::Binary { op: BinaryOp::Div, left, right } => {
            // (u'v - uv') / v^2
            let du = d(left, var, depth + 1)?;
            let dv = d(right, var, depth + 1)?;
            Ok(Expr::div(
                Expr::sub(
                    Expr::mul(du, (**right).clone()),
                    Expr::mul((**left).clone(), dv),
                ),
                Expr::pow((**right).clone(), Expr::Number(2.0)),
            ))
        }
        Expr::Binary { op: BinaryOp::Pow, left, right } => {
            d_power(left, right, var, depth)
        }
        Expr::Negate(inner) => Ok(Expr::negate(d(inner, var, depth + 1)?)),
        Expr::Call { name, args, subscript } => {
            d_call(name, args, subscript.as_deref(), var, depth)
        }
        Expr::Abs(inner) => {
            // |u|' = sign(u) u'
            let du = d(inner, var, depth + 1)?;
            Ok(Expr::mul(Expr::call("sign", vec![(**inner).clone()]), du))
        }
        Expr::Root { radicand, index } => d_root(radicand, index.as_deref(), var, depth),
        Expr::Sum { index, start, end, body } => {
            if start.references(var) || end.references(var) {
                return Err(SymbolicError::UnsupportedDerivative {
                    what: "a summation with variable bounds".to_string(),
                });
            }
            let body_d = if index == var {
                // The reduction index shadows the differentiation variable
                Expr::Number(0.0)
            } else {
                d(body, var, depth + 1)?
            };
            Ok(Expr::Sum {
                index: index.clone(),
                start: start.clone(),
                end: end.clone(),
                body: Box::new(body_d),
            })
        }
        Expr::Derivative { body, var: inner_var, order, .. } => {
            // Resolve the inner derivative first, then take one more
            let inner = differentiate(body, inner_var, *order)?;
            d(&inner, var, depth + 1)
        }
        Expr::Conditional { value, condition } => {
            // Differentiation commutes with the domain condition
            Ok(Expr::Conditional {
                value: Box::new(d(value, var, depth + 1)?),
                condition: condition.clone(),
            })
        }
        Expr::Matrix { rows, kind } => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(|cell| d(cell, var, depth + 1)).collect())
                .collect::<Result<_, _>>()?;
            Ok(Expr::Matrix { rows, kind: *kind })
        }
        Expr::Product { .. } => Err(SymbolicError::UnsupportedDerivative {
            what: "a running product".to_string(),
        }),
        Expr::Integral { .. } => Err(SymbolicError::UnsupportedDerivative {
            what: "an integral".to_string(),
        }),
        Expr::Limit { .. } => Err(SymbolicError::UnsupportedDerivative {
            what: "a limit".to_string(),
        }),
        Expr::Compare { .. } | Expr::CompareChain { .. } => {
            Err(SymbolicError::UnsupportedDerivative {
                what: "a comparison".to_string(),
            })
        }
    }
}

/// Power rule in its three shapes: `u^n`, `a^v`, and `u^v`.
fn d_power(base: &Expr, exponent: &Expr, var: &str, depth: usize) -> Result<Expr, SymbolicError> {
    let base_varies = base.references(var);
    let exponent_varies = exponent.references(var);

    if !base_varies && !exponent_varies {
        return Ok(Expr::Number(0.0));
    }

    if !exponent_varies {
        // n u^{n-1} u'
        let du = d(base, var, depth + 1)?;
        let reduced = Expr::pow(
            base.clone(),
            Expr::sub(exponent.clone(), Expr::Number(1.0)),
        );
        return Ok(Expr::mul(Expr::mul(exponent.clone(), reduced), du));
    }

    if !base_varies {
        // a^v ln(a) v'
        let dv = d(exponent, var, depth + 1)?;
        return Ok(Expr::mul(
            Expr::mul(
                Expr::pow(base.clone(), exponent.clone()),
                Expr::call("ln", vec![base.clone()]),
            ),
            dv,
        ));
    }

    // u^v (v' ln u + v u'/u), covering x^x
    let du = d(base, var, depth + 1)?;
    let dv = d(exponent, var, depth + 1)?;
    Ok(Expr::mul(
        Expr::pow(base.clone(), exponent.clone()),
        Expr::add(
            Expr::mul(dv, Expr::call("ln", vec![base.clone()])),
            Expr::mul(exponent.clone(), Expr::div(du, base.clone())),
        ),
    ))
}

fn d_root(
    radicand: &Expr,
    index: Option<&Expr>,
    var: &str,
    depth: usize,
) -> Result<Expr, SymbolicError> {
    let du = d(radicand, var, depth + 1)?;
    match index {
        None => {
            // u' / (2 sqrt(u))
            Ok(Expr::div(
                du,
                Expr::mul(
                    Expr::Number(2.0),
                    Expr::Root { radicand: Box::new(radicand.clone()), index: None },
                ),
            ))
        }
        Some(index) if !index.references(var) => {
            // (1/n) u^{1/n - 1} u'
            let one_over_n = Expr::div(Expr::Number(1.0), index.clone());
            Ok(Expr::mul(
                one_over_n.clone(),
                Expr::mul(
                    Expr::pow(
                        radicand.clone(),
                        Expr::sub(one_over_n, Expr::Number(1.0)),
                    ),
                    du,
                ),
            ))
        }
        Some(_) => Err(SymbolicError::UnsupportedDerivative {
            what: "a root with a variable index".to_string(),
        }),
    }
}

fn d_call(
    name: &str,
    args: &[Expr],
    subscript: Option<&Expr>,
    var: &str,
    depth: usize,
) -> Result<Expr, SymbolicError> {
    if args.len() != 1 {
        return Err(SymbolicError::UnsupportedDerivative {
            what: format!("'{name}' with {} arguments", args.len()),
        });
    }
    let u = &args[0];
    let du = d(u, var, depth + 1)?;

    // log_b(u): u' / (u ln b)
    if name == "log" {
        let base = match subscript {
            Some(base) => base.clone(),
            None => Expr::Number(10.0),
        };
        return Ok(Expr::div(
            du,
            Expr::mul(u.clone(), Expr::call("ln", vec![base])),
        ));
    }
    if subscript.is_some() {
        return Err(SymbolicError::UnsupportedDerivative {
            what: format!("'{name}' with a subscript"),
        });
    }

    let outer = match outer_derivative(name, u) {
        Some(outer) => outer,
        None => {
            return Err(SymbolicError::UnsupportedDerivative {
                what: format!("the function '{name}'"),
            })
        }
    };
    Ok(Expr::mul(outer, du))
}

/// d/du f(u) for the single-argument function table.
fn outer_derivative(name: &str, u: &Expr) -> Option<Expr> {
    let u = u.clone();
    let call = |f: &str, arg: &Expr| Expr::call(f, vec![arg.clone()]);
    let square = |e: Expr| Expr::pow(e, Expr::Number(2.0));
    let sqrt = |e: Expr| Expr::Root { radicand: Box::new(e), index: None };
    let one = || Expr::Number(1.0);

    let out = match name {
        "sin" => call("cos", &u),
        "cos" => Expr::negate(call("sin", &u)),
        "tan" => Expr::div(one(), square(call("cos", &u))),
        "cot" => Expr::negate(Expr::div(one(), square(call("sin", &u)))),
        "sec" => Expr::mul(call("sec", &u), call("tan", &u)),
        "csc" => Expr::negate(Expr::mul(call("csc", &u), call("cot", &u))),
        "arcsin" => Expr::div(one(), sqrt(Expr::sub(one(), square(u.clone())))),
        "arccos" => Expr::negate(Expr::div(one(), sqrt(Expr::sub(one(), square(u.clone()))))),
        "arctan" => Expr::div(one(), Expr::add(one(), square(u.clone()))),
        "arccot" => Expr::negate(Expr::div(one(), Expr::add(one(), square(u.clone())))),
        "arcsec" => Expr::div(
            one(),
            Expr::mul(
                Expr::Abs(Box::new(u.clone())),
                sqrt(Expr::sub(square(u.clone()), one())),
            ),
        ),
        "arccsc" => Expr::negate(Expr::div(
            one(),
            Expr::mul(
                Expr::Abs(Box::new(u.clone())),
                sqrt(Expr::sub(square(u.clone()), one())),
            ),
        )),
        "sinh" => call("cosh", &u),
        "cosh" => call("sinh", &u),
        "tanh" => Expr::div(one(), square(call("cosh", &u))),
        "coth" => Expr::negate(Expr::div(one(), square(call("sinh", &u)))),
        "sech" => Expr::negate(Expr::mul(call("sech", &u), call("tanh", &u))),
        "csch" => Expr::negate(Expr::mul(call("csch", &u), call("coth", &u))),
        "arcsinh" => Expr::div(one(), sqrt(Expr::add(square(u.clone()), one()))),
        "arccosh" => Expr::div(one(), sqrt(Expr::sub(square(u.clone()), one()))),
        "arctanh" | "arccoth" => Expr::div(one(), Expr::sub(one(), square(u.clone()))),
        "arcsech" => Expr::negate(Expr::div(
            one(),
            Expr::mul(u.clone(), sqrt(Expr::sub(one(), square(u.clone())))),
        )),
        "arccsch" => Expr::negate(Expr::div(
            one(),
            Expr::mul(
                Expr::Abs(Box::new(u.clone())),
                sqrt(Expr::add(one(), square(u.clone()))),
            ),
        )),
        "ln" => Expr::div(one(), u),
        "exp" => call("exp", &u),
        "sqrt" => Expr::div(one(), Expr::mul(Expr::Number(2.0), sqrt(u))),
        "abs" => call("sign", &u),
        "sign" | "sgn" => Expr::Number(0.0),
        _ => return None,
    };
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use latex_ast::DerivativeKind;

    /// Minimal numeric check used to validate derivatives by sampling.
    fn eval(expr: &Expr, x: f64) -> f64 {
        match expr {
            Expr::Number(n) => *n,
            Expr::Variable(v) if v == "x" => x,
            Expr::Variable(v) if v == "e" => std::f64::consts::E,
            Expr::Variable(v) if v == "pi" => std::f64::consts::PI,
            Expr::Variable(v) => panic!("unbound variable {v}"),
            Expr::Binary { op, left, right } => {
                let l = eval(left, x);
                let r = eval(right, x);
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => l.powf(r),
                }
            }
            Expr::Negate(inner) => -eval(inner, x),
            Expr::Abs(inner) => eval(inner, x).abs(),
            Expr::Root { radicand, index: None } => eval(radicand, x).sqrt(),
            Expr::Root { radicand, index: Some(n) } => {
                eval(radicand, x).powf(1.0 / eval(n, x))
            }
            Expr::Call { name, args, .. } => {
                let u = eval(&args[0], x);
                match name.as_str() {
                    "sin" => u.sin(),
                    "cos" => u.cos(),
                    "tan" => u.tan(),
                    "sec" => 1.0 / u.cos(),
                    "csc" => 1.0 / u.sin(),
                    "cot" => 1.0 / u.tan(),
                    "sinh" => u.sinh(),
                    "cosh" => u.cosh(),
                    "tanh" => u.tanh(),
                    "exp" => u.exp(),
                    "ln" => u.ln(),
                    "sign" => u.signum(),
                    other => panic!("eval helper lacks {other}"),
                }
            }
            other => panic!("eval helper lacks {other:?}"),
        }
    }

    fn check(expr: &Expr, expected: impl Fn(f64) -> f64, samples: &[f64]) {
        let derivative = differentiate(expr, "x", 1).unwrap_or_else(|e| panic!("{e}"));
        for &x in samples {
            let got = eval(&derivative, x);
            let want = expected(x);
            assert!(
                (got - want).abs() < 1e-8,
                "at x={x}: expected {want}, got {got} for {derivative:?}"
            );
        }
    }

    fn x() -> Expr {
        Expr::variable("x")
    }

    #[test]
    fn power_rule() {
        let expr = Expr::pow(x(), Expr::Number(3.0));
        check(&expr, |x| 3.0 * x * x, &[1.0, 2.0, -1.5]);
    }

    #[test]
    fn constant_and_variable() {
        assert_eq!(differentiate(&Expr::Number(7.0), "x", 1), Ok(Expr::Number(0.0)));
        assert_eq!(differentiate(&x(), "x", 1), Ok(Expr::Number(1.0)));
        assert_eq!(differentiate(&Expr::variable("y"), "x", 1), Ok(Expr::Number(0.0)));
    }

    #[test]
    fn product_and_quotient_rules() {
        let product = Expr::mul(x(), Expr::call("sin", vec![x()]));
        check(&product, |x| x.sin() + x * x.cos(), &[0.5, 1.0, 2.0]);

        let quotient = Expr::div(Expr::Number(1.0), x());
        check(&quotient, |x| -1.0 / (x * x), &[1.0, 2.0, -2.0]);
    }

    #[test]
    fn chain_rule_through_sin() {
        let expr = Expr::call("sin", vec![Expr::pow(x(), Expr::Number(2.0))]);
        check(&expr, |x| (x * x).cos() * 2.0 * x, &[0.5, 1.5]);
    }

    #[test]
    fn exponential_forms() {
        let e_to_x = Expr::pow(Expr::variable("e"), x());
        check(&e_to_x, f64::exp, &[0.0, 1.0, 2.0]);

        let two_to_x = Expr::pow(Expr::Number(2.0), x());
        check(&two_to_x, |x| 2f64.powf(x) * 2f64.ln(), &[0.0, 1.0, 3.0]);

        let exp_call = Expr::call("exp", vec![x()]);
        check(&exp_call, f64::exp, &[0.0, 1.0]);
    }

    #[test]
    fn x_to_the_x() {
        let expr = Expr::pow(x(), x());
        check(&expr, |x: f64| x.powf(x) * (x.ln() + 1.0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn logarithms() {
        let ln = Expr::call("ln", vec![x()]);
        check(&ln, |x| 1.0 / x, &[0.5, 1.0, 4.0]);

        let log2 = Expr::Call {
            name: "log".to_string(),
            args: vec![x()],
            subscript: Some(Box::new(Expr::Number(2.0))),
        };
        check(&log2, |x| 1.0 / (x * 2f64.ln()), &[1.0, 2.0, 8.0]);
    }

    #[test]
    fn sqrt_and_abs() {
        let sqrt = Expr::Root { radicand: Box::new(x()), index: None };
        check(&sqrt, |x| 0.5 / x.sqrt(), &[1.0, 4.0]);

        let abs = Expr::Abs(Box::new(x()));
        check(&abs, |x: f64| x.signum(), &[-2.0, 3.0]);
    }

    #[test]
    fn hyperbolics() {
        check(&Expr::call("sinh", vec![x()]), f64::cosh, &[0.0, 1.0]);
        check(&Expr::call("tanh", vec![x()]), |x| 1.0 / x.cosh().powi(2), &[0.0, 0.5]);
    }

    #[test]
    fn inverse_trig() {
        let arctan = Expr::call("arctan", vec![x()]);
        check(&arctan, |x| 1.0 / (1.0 + x * x), &[0.0, 1.0, 2.0]);

        let arcsin = Expr::call("arcsin", vec![x()]);
        check(&arcsin, |x| 1.0 / (1.0 - x * x).sqrt(), &[0.0, 0.5]);
    }

    #[test]
    fn higher_order() {
        let expr = Expr::pow(x(), Expr::Number(3.0));
        let second = differentiate(&expr, "x", 2).unwrap_or_else(|e| panic!("{e}"));
        for x_val in [1.0, 2.0, 5.0] {
            assert!((eval(&second, x_val) - 6.0 * x_val).abs() < 1e-9);
        }
    }

    #[test]
    fn derivative_is_linear() {
        // d/dx (3 f + 2 g) = 3 f' + 2 g'
        let f = Expr::call("sin", vec![x()]);
        let g = Expr::pow(x(), Expr::Number(2.0));
        let combined = Expr::add(
            Expr::mul(Expr::Number(3.0), f.clone()),
            Expr::mul(Expr::Number(2.0), g.clone()),
        );
        let lhs = differentiate(&combined, "x", 1).unwrap_or_else(|e| panic!("{e}"));
        let df = differentiate(&f, "x", 1).unwrap_or_else(|e| panic!("{e}"));
        let dg = differentiate(&g, "x", 1).unwrap_or_else(|e| panic!("{e}"));
        for x_val in [0.3, 1.0, 2.5] {
            let want = 3.0 * eval(&df, x_val) + 2.0 * eval(&dg, x_val);
            assert!((eval(&lhs, x_val) - want).abs() < 1e-9);
        }
    }

    #[test]
    fn conditional_keeps_its_condition() {
        let expr = Expr::Conditional {
            value: Box::new(Expr::pow(x(), Expr::Number(2.0))),
            condition: Box::new(Expr::Compare {
                left: Box::new(x()),
                op: latex_ast::CompareOp::Greater,
                right: Box::new(Expr::Number(0.0)),
            }),
        };
        let derivative = differentiate(&expr, "x", 1).unwrap_or_else(|e| panic!("{e}"));
        match derivative {
            Expr::Conditional { condition, .. } => {
                assert!(matches!(*condition, Expr::Compare { .. }));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn nested_derivative_nodes_compose() {
        let inner = Expr::Derivative {
            body: Box::new(Expr::pow(x(), Expr::Number(3.0))),
            var: "x".to_string(),
            order: 1,
            kind: DerivativeKind::Ordinary,
        };
        let outer = differentiate(&inner, "x", 1).unwrap_or_else(|e| panic!("{e}"));
        for x_val in [1.0, 2.0] {
            assert!((eval(&outer, x_val) - 6.0 * x_val).abs() < 1e-9);
        }
    }

    proptest::proptest! {
        #[test]
        fn power_rule_matches_closed_form(n in 1u32..8, x_val in 0.5f64..3.0) {
            let expr = Expr::pow(x(), Expr::Number(f64::from(n)));
            let derivative = differentiate(&expr, "x", 1);
            proptest::prop_assert!(derivative.is_ok());
            if let Ok(derivative) = derivative {
                let got = eval(&derivative, x_val);
                let want = f64::from(n) * x_val.powf(f64::from(n) - 1.0);
                proptest::prop_assert!((got - want).abs() < 1e-8 * want.abs().max(1.0));
            }
        }
    }

    #[test]
    fn unsupported_shapes_error() {
        let product = Expr::Product {
            index: "i".to_string(),
            start: Box::new(Expr::Number(1.0)),
            end: Box::new(Expr::Number(3.0)),
            body: Box::new(x()),
        };
        assert!(matches!(
            differentiate(&product, "x", 1),
            Err(SymbolicError::UnsupportedDerivative { .. })
        ));

        let minmax = Expr::call("min", vec![x(), Expr::Number(2.0)]);
        assert!(matches!(
            differentiate(&minmax, "x", 1),
            Err(SymbolicError::UnsupportedDerivative { .. })
        ));
    }
}
