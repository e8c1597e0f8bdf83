use crate::expr::Expr;

/// Call `f` on every node of the tree in pre-order.
pub fn walk<F: FnMut(&Expr)>(expr: &Expr, f: &mut F) {
    f(expr);
    match expr {
        Expr::Number(_) | Expr::Variable(_) | Expr::Fonted { .. } => {}
        Expr::Binary { left, right, .. } => {
            walk(left, f);
            walk(right, f);
        }
        Expr::Negate(inner) | Expr::Abs(inner) => walk(inner, f),
        Expr::Call { args, subscript, .. } => {
            if let Some(sub) = subscript {
                walk(sub, f);
            }
            for arg in args {
                walk(arg, f);
            }
        }
        Expr::Matrix { rows, .. } => {
            for row in rows {
                for cell in row {
                    walk(cell, f);
                }
            }
        }
        Expr::Root { radicand, index } => {
            if let Some(index) = index {
                walk(index, f);
            }
            walk(radicand, f);
        }
        Expr::Sum { start, end, body, .. } | Expr::Product { start, end, body, .. } => {
            walk(start, f);
            walk(end, f);
            walk(body, f);
        }
        Expr::Integral { lower, upper, body, .. } => {
            if let Some(lower) = lower {
                walk(lower, f);
            }
            if let Some(upper) = upper {
                walk(upper, f);
            }
            walk(body, f);
        }
        Expr::Derivative { body, .. } => walk(body, f),
        Expr::Limit { target, body, .. } => {
            walk(target, f);
            walk(body, f);
        }
        Expr::Compare { left, right, .. } => {
            walk(left, f);
            walk(right, f);
        }
        Expr::CompareChain { exprs, .. } => {
            for e in exprs {
                walk(e, f);
            }
        }
        Expr::Conditional { value, condition } => {
            walk(value, f);
            walk(condition, f);
        }
    }
}

/// Visitor with one hook per node variant.
///
/// The provided `visit` driver walks the tree in pre-order and calls the
/// matching hook at each node; exporters (JSON, MathML, SymPy) implement
/// the hooks they care about and keep the default traversal.
pub trait ExprVisitor {
    fn visit_number(&mut self, _value: f64) {}
    fn visit_variable(&mut self, _name: &str) {}
    fn visit_binary(&mut self, _expr: &Expr) {}
    fn visit_negate(&mut self, _expr: &Expr) {}
    fn visit_call(&mut self, _expr: &Expr) {}
    fn visit_abs(&mut self, _expr: &Expr) {}
    fn visit_matrix(&mut self, _expr: &Expr) {}
    fn visit_root(&mut self, _expr: &Expr) {}
    fn visit_sum(&mut self, _expr: &Expr) {}
    fn visit_product(&mut self, _expr: &Expr) {}
    fn visit_integral(&mut self, _expr: &Expr) {}
    fn visit_derivative(&mut self, _expr: &Expr) {}
    fn visit_limit(&mut self, _expr: &Expr) {}
    fn visit_compare(&mut self, _expr: &Expr) {}
    fn visit_compare_chain(&mut self, _expr: &Expr) {}
    fn visit_conditional(&mut self, _expr: &Expr) {}
    fn visit_fonted(&mut self, _style_name: &str, _name: &str) {}

    /// Pre-order traversal calling the per-variant hooks.
    fn visit(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(value) => self.visit_number(*value),
            Expr::Variable(name) => self.visit_variable(name),
            Expr::Binary { left, right, .. } => {
                self.visit_binary(expr);
                self.visit(left);
                self.visit(right);
            }
            Expr::Negate(inner) => {
                self.visit_negate(expr);
                self.visit(inner);
            }
            Expr::Call { args, subscript, .. } => {
                self.visit_call(expr);
                if let Some(sub) = subscript {
                    self.visit(sub);
                }
                for arg in args {
                    self.visit(arg);
                }
            }
            Expr::Abs(inner) => {
                self.visit_abs(expr);
                self.visit(inner);
            }
            Expr::Matrix { rows, .. } => {
                self.visit_matrix(expr);
                for row in rows {
                    for cell in row {
                        self.visit(cell);
                    }
                }
            }
            Expr::Root { radicand, index } => {
                self.visit_root(expr);
                if let Some(index) = index {
                    self.visit(index);
                }
                self.visit(radicand);
            }
            Expr::Sum { start, end, body, .. } => {
                self.visit_sum(expr);
                self.visit(start);
                self.visit(end);
                self.visit(body);
            }
            Expr::Product { start, end, body, .. } => {
                self.visit_product(expr);
                self.visit(start);
                self.visit(end);
                self.visit(body);
            }
            Expr::Integral { lower, upper, body, .. } => {
                self.visit_integral(expr);
                if let Some(lower) = lower {
                    self.visit(lower);
                }
                if let Some(upper) = upper {
                    self.visit(upper);
                }
                self.visit(body);
            }
            Expr::Derivative { body, .. } => {
                self.visit_derivative(expr);
                self.visit(body);
            }
            Expr::Limit { target, body, .. } => {
                self.visit_limit(expr);
                self.visit(target);
                self.visit(body);
            }
            Expr::Compare { left, right, .. } => {
                self.visit_compare(expr);
                self.visit(left);
                self.visit(right);
            }
            Expr::CompareChain { exprs, .. } => {
                self.visit_compare_chain(expr);
                for e in exprs {
                    self.visit(e);
                }
            }
            Expr::Conditional { value, condition } => {
                self.visit_conditional(expr);
                self.visit(value);
                self.visit(condition);
            }
            Expr::Fonted { style, name } => {
                self.visit_fonted(style.command_name(), name);
            }
        }
    }
}
