//! Shared helpers for the rewriting passes.

use latex_ast::Expr;
use latex_error::SymbolicError;

use crate::MAX_REWRITE_DEPTH;

pub(crate) fn depth_guard(depth: usize) -> Result<(), SymbolicError> {
    if depth > MAX_REWRITE_DEPTH {
        return Err(SymbolicError::RecursionLimit { max: MAX_REWRITE_DEPTH });
    }
    Ok(())
}

/// Rebuild a node with every child passed through `recurse`.
///
/// The transformer passes are all bottom-up; this keeps the traversal in
/// one place so each pass only states its node-level rewrites.
pub(crate) fn rebuild<F>(expr: &Expr, recurse: &mut F) -> Result<Expr, SymbolicError>
where
    F: FnMut(&Expr) -> Result<Expr, SymbolicError>,
{
    let rebuilt = match expr {
        Expr::Number(_) | Expr::Variable(_) | Expr::Fonted { .. } => expr.clone(),
        Expr::Binary { op, left, right } => Expr::Binary {
            op: *op,
            left: Box::new(recurse(left)?),
            right: Box::new(recurse(right)?),
        },
        Expr::Negate(inner) => Expr::Negate(Box::new(recurse(inner)?)),
        Expr::Call { name, args, subscript } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(&mut *recurse).collect::<Result<_, _>>()?,
            subscript: match subscript {
                Some(sub) => Some(Box::new(recurse(sub)?)),
                None => None,
            },
        },
        Expr::Abs(inner) => Expr::Abs(Box::new(recurse(inner)?)),
        Expr::Matrix { rows, kind } => Expr::Matrix {
            rows: rows
                .iter()
                .map(|row| row.iter().map(&mut *recurse).collect::<Result<_, _>>())
                .collect::<Result<_, _>>()?,
            kind: *kind,
        },
        Expr::Root { radicand, index } => Expr::Root {
            radicand: Box::new(recurse(radicand)?),
            index: match index {
                Some(index) => Some(Box::new(recurse(index)?)),
                None => None,
            },
        },
        Expr::Sum { index, start, end, body } => Expr::Sum {
            index: index.clone(),
            start: Box::new(recurse(start)?),
            end: Box::new(recurse(end)?),
            body: Box::new(recurse(body)?),
        },
        Expr::Product { index, start, end, body } => Expr::Product {
            index: index.clone(),
            start: Box::new(recurse(start)?),
            end: Box::new(recurse(end)?),
            body: Box::new(recurse(body)?),
        },
        Expr::Integral { lower, upper, body, var } => Expr::Integral {
            lower: match lower {
                Some(lower) => Some(Box::new(recurse(lower)?)),
                None => None,
            },
            upper: match upper {
                Some(upper) => Some(Box::new(recurse(upper)?)),
                None => None,
            },
            body: Box::new(recurse(body)?),
            var: var.clone(),
        },
        Expr::Derivative { body, var, order, kind } => Expr::Derivative {
            body: Box::new(recurse(body)?),
            var: var.clone(),
            order: *order,
            kind: *kind,
        },
        Expr::Limit { var, target, body } => Expr::Limit {
            var: var.clone(),
            target: Box::new(recurse(target)?),
            body: Box::new(recurse(body)?),
        },
        Expr::Compare { left, op, right } => Expr::Compare {
            left: Box::new(recurse(left)?),
            op: *op,
            right: Box::new(recurse(right)?),
        },
        Expr::CompareChain { exprs, ops } => Expr::CompareChain {
            exprs: exprs.iter().map(&mut *recurse).collect::<Result<_, _>>()?,
            ops: ops.clone(),
        },
        Expr::Conditional { value, condition } => Expr::Conditional {
            value: Box::new(recurse(value)?),
            condition: Box::new(recurse(condition)?),
        },
    };
    Ok(rebuilt)
}

pub(crate) fn is_number(expr: &Expr, value: f64) -> bool {
    matches!(expr, Expr::Number(n) if *n == value)
}

/// Integer value of a numeric literal, when it is one.
pub(crate) fn as_integer(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Number(n) if n.fract() == 0.0 && n.abs() < 9e15 => Some(*n as i64),
        Expr::Negate(inner) => as_integer(inner).map(|n| -n),
        _ => None,
    }
}

/// Single-argument call, e.g. `sin(u)`.
pub(crate) fn unary_call<'a>(expr: &'a Expr, name: &str) -> Option<&'a Expr> {
    match expr {
        Expr::Call { name: n, args, subscript: None } if n == name && args.len() == 1 => {
            Some(&args[0])
        }
        _ => None,
    }
}

/// Multiply while absorbing factors of one.
pub(crate) fn smart_mul(left: Expr, right: Expr) -> Expr {
    if is_number(&left, 1.0) {
        return right;
    }
    if is_number(&right, 1.0) {
        return left;
    }
    Expr::mul(left, right)
}

/// Flatten a multiplication tree into its factors.
pub(crate) fn flatten_mul(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Binary { op: latex_ast::BinaryOp::Mul, left, right } => {
            flatten_mul(left, out);
            flatten_mul(right, out);
        }
        _ => out.push(expr.clone()),
    }
}

/// Rebuild a factor list into a product; an empty list is one.
pub(crate) fn product_of(mut factors: Vec<Expr>) -> Expr {
    match factors.len() {
        0 => Expr::Number(1.0),
        1 => factors.remove(0),
        _ => {
            let first = factors.remove(0);
            factors.into_iter().fold(first, Expr::mul)
        }
    }
}
