use std::hash::{Hash, Hasher};

use latex_token::FontStyle;

/// Binary operator on the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Comparison operator, used by `Compare` and `CompareChain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

/// The delimiters a matrix environment was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixKind {
    /// `\begin{matrix}`
    Plain,
    /// `\begin{pmatrix}`
    Parens,
    /// `\begin{bmatrix}`
    Brackets,
    /// `\begin{vmatrix}`
    Bars,
    /// `\begin{align}` / `\begin{aligned}`
    Aligned,
}

/// Whether a derivative was written with `d` or `\partial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivativeKind {
    Ordinary,
    Partial,
}

/// A node in the expression tree.
///
/// Invariants established by the parser: matrix rows all have equal length,
/// `Derivative.order >= 1`, and a `CompareChain` has `ops.len() ==
/// exprs.len() - 1 >= 2`. `Sum`/`Product` bounds are arbitrary expressions
/// that must evaluate to integers.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Negate(Box<Expr>),
    /// Function application: `\sin{x}`, `\log_{2}{x}`, `\min_{a}{b}`
    Call {
        name: String,
        args: Vec<Expr>,
        subscript: Option<Box<Expr>>,
    },
    Abs(Box<Expr>),
    Matrix {
        rows: Vec<Vec<Expr>>,
        kind: MatrixKind,
    },
    /// `\sqrt{x}` / `\sqrt[n]{x}`; a missing index means a square root
    Root {
        radicand: Box<Expr>,
        index: Option<Box<Expr>>,
    },
    Sum {
        index: String,
        start: Box<Expr>,
        end: Box<Expr>,
        body: Box<Expr>,
    },
    Product {
        index: String,
        start: Box<Expr>,
        end: Box<Expr>,
        body: Box<Expr>,
    },
    /// Indefinite when both bounds are absent; multi-integrals nest
    Integral {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        body: Box<Expr>,
        var: String,
    },
    Derivative {
        body: Box<Expr>,
        var: String,
        order: u32,
        kind: DerivativeKind,
    },
    Limit {
        var: String,
        target: Box<Expr>,
        body: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    CompareChain {
        exprs: Vec<Expr>,
        ops: Vec<CompareOp>,
    },
    /// `expr, condition` — evaluates to NaN when the condition fails
    Conditional {
        value: Box<Expr>,
        condition: Box<Expr>,
    },
    /// `\mathbf{x}`; evaluates through the plain name
    Fonted {
        style: FontStyle,
        name: String,
    },
}

// Trees are compared structurally; f64 equality is fine here because parsed
// literals are never NaN. Required so caches can use Expr as a map key.
impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Expr::Number(n) => n.to_bits().hash(state),
            Expr::Variable(name) => name.hash(state),
            Expr::Binary { op, left, right } => {
                op.hash(state);
                left.hash(state);
                right.hash(state);
            }
            Expr::Negate(inner) => inner.hash(state),
            Expr::Call { name, args, subscript } => {
                name.hash(state);
                args.hash(state);
                subscript.hash(state);
            }
            Expr::Abs(inner) => inner.hash(state),
            Expr::Matrix { rows, kind } => {
                kind.hash(state);
                rows.len().hash(state);
                for row in rows {
                    row.hash(state);
                }
            }
            Expr::Root { radicand, index } => {
                radicand.hash(state);
                index.hash(state);
            }
            Expr::Sum { index, start, end, body } => {
                index.hash(state);
                start.hash(state);
                end.hash(state);
                body.hash(state);
            }
            Expr::Product { index, start, end, body } => {
                index.hash(state);
                start.hash(state);
                end.hash(state);
                body.hash(state);
            }
            Expr::Integral { lower, upper, body, var } => {
                lower.hash(state);
                upper.hash(state);
                body.hash(state);
                var.hash(state);
            }
            Expr::Derivative { body, var, order, kind } => {
                body.hash(state);
                var.hash(state);
                order.hash(state);
                kind.hash(state);
            }
            Expr::Limit { var, target, body } => {
                var.hash(state);
                target.hash(state);
                body.hash(state);
            }
            Expr::Compare { left, op, right } => {
                left.hash(state);
                op.hash(state);
                right.hash(state);
            }
            Expr::CompareChain { exprs, ops } => {
                exprs.hash(state);
                ops.hash(state);
            }
            Expr::Conditional { value, condition } => {
                value.hash(state);
                condition.hash(state);
            }
            Expr::Fonted { style, name } => {
                style.hash(state);
                name.hash(state);
            }
        }
    }
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Add, left, right)
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Mul, left, right)
    }

    pub fn div(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Div, left, right)
    }

    pub fn pow(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Pow, left, right)
    }

    pub fn negate(inner: Expr) -> Self {
        Expr::Negate(Box::new(inner))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call { name: name.into(), args, subscript: None }
    }

    /// The numeric value of a literal, if this node is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            Expr::Negate(inner) => inner.as_number().map(|n| -n),
            _ => None,
        }
    }

    /// True when the subtree references no variables, function calls, or
    /// calculus constructs. Used by constant folding and the sub-expression
    /// cache.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Number(_) => true,
            Expr::Variable(_) | Expr::Fonted { .. } => false,
            Expr::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Expr::Negate(inner) | Expr::Abs(inner) => inner.is_constant(),
            _ => false,
        }
    }

    /// True when `var` occurs free anywhere in the subtree.
    ///
    /// Reduction indices and integration variables shadow the name inside
    /// their bodies.
    pub fn references(&self, var: &str) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Variable(name) => name == var,
            Expr::Fonted { name, .. } => name == var,
            Expr::Binary { left, right, .. } => left.references(var) || right.references(var),
            Expr::Negate(inner) | Expr::Abs(inner) => inner.references(var),
            Expr::Call { args, subscript, .. } => {
                args.iter().any(|a| a.references(var))
                    || subscript.as_ref().is_some_and(|s| s.references(var))
            }
            Expr::Matrix { rows, .. } => {
                rows.iter().any(|row| row.iter().any(|c| c.references(var)))
            }
            Expr::Root { radicand, index } => {
                radicand.references(var) || index.as_ref().is_some_and(|i| i.references(var))
            }
            Expr::Sum { index, start, end, body }
            | Expr::Product { index, start, end, body } => {
                start.references(var)
                    || end.references(var)
                    || (index != var && body.references(var))
            }
            Expr::Integral { lower, upper, body, var: bound } => {
                lower.as_ref().is_some_and(|l| l.references(var))
                    || upper.as_ref().is_some_and(|u| u.references(var))
                    || (bound != var && body.references(var))
            }
            Expr::Derivative { body, .. } => body.references(var),
            Expr::Limit { var: bound, target, body } => {
                target.references(var) || (bound != var && body.references(var))
            }
            Expr::Compare { left, right, .. } => left.references(var) || right.references(var),
            Expr::CompareChain { exprs, .. } => exprs.iter().any(|e| e.references(var)),
            Expr::Conditional { value, condition } => {
                value.references(var) || condition.references(var)
            }
        }
    }

    /// Total node count, used to enforce the parser's size budget.
    pub fn node_count(&self) -> usize {
        let mut count = 0usize;
        crate::visitor::walk(self, &mut |_: &Expr| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(expr: &Expr) -> u64 {
        let mut hasher = DefaultHasher::new();
        expr.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn structural_equality_and_hash_agree() {
        let a = Expr::add(Expr::variable("x"), Expr::number(1.0));
        let b = Expr::add(Expr::variable("x"), Expr::number(1.0));
        let c = Expr::add(Expr::variable("y"), Expr::number(1.0));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn as_number_sees_through_negation() {
        assert_eq!(Expr::negate(Expr::number(2.0)).as_number(), Some(-2.0));
        assert_eq!(Expr::variable("x").as_number(), None);
    }

    #[test]
    fn reduction_index_shadows_variable() {
        let sum = Expr::Sum {
            index: "i".to_string(),
            start: Box::new(Expr::number(1.0)),
            end: Box::new(Expr::number(5.0)),
            body: Box::new(Expr::variable("i")),
        };
        assert!(!sum.references("i"));

        let sum_over_x = Expr::Sum {
            index: "i".to_string(),
            start: Box::new(Expr::number(1.0)),
            end: Box::new(Expr::variable("n")),
            body: Box::new(Expr::variable("x")),
        };
        assert!(sum_over_x.references("x"));
        assert!(sum_over_x.references("n"));
    }

    #[test]
    fn node_count_includes_nested() {
        let expr = Expr::mul(Expr::number(2.0), Expr::pow(Expr::variable("x"), Expr::number(2.0)));
        assert_eq!(expr.node_count(), 5);
    }
}
