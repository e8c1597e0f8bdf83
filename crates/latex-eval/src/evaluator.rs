use std::hash::{Hash, Hasher};
use std::sync::Arc;

use latex_ast::{BinaryOp, CompareOp, Expr};
use latex_cache::{CacheManager, DerivativeKey};
use latex_error::{did_you_mean, EvalError};
use latex_numeric::{Complex, Matrix, Value};
use latex_symbolic::{differentiate, integrate};
use rustc_hash::FxHasher;

use crate::calculus;
use crate::functions::numeric_error;
use crate::registry;
use crate::registry::FunctionCall;
use crate::{Environment, EQUALITY_EPSILON, MAX_REDUCTION_ITERATIONS, SIMPSON_SUBINTERVALS};

/// Tree-walking evaluator.
///
/// Stateless apart from an optional handle to a [`CacheManager`], which
/// enables the hot-subexpression layer (L4) and derivative memoization
/// (L3) during evaluation. A single evaluator walks one tree at a time;
/// trees are immutable and may be shared across evaluators.
#[derive(Default)]
pub struct Evaluator {
    caches: Option<Arc<CacheManager>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caches(caches: Arc<CacheManager>) -> Self {
        Evaluator { caches: Some(caches) }
    }

    /// Evaluate a tree against an environment.
    pub fn evaluate(&self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        tracing::trace!(bindings = env.len(), "evaluating expression tree");
        self.eval(expr, env)
    }

    fn eval(&self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match expr {
            Expr::Number(n) => Ok(Value::Numeric(*n)),
            Expr::Variable(name) => self.lookup_variable(name, env),
            Expr::Fonted { name, .. } => self.lookup_variable(name, env),

            Expr::Binary { op, left, right } => {
                let key = self.subexpr_key(expr, env);
                if let (Some(key), Some(caches)) = (key, &self.caches) {
                    if let Some(cached) = caches.lookup_subexpr(key) {
                        return Ok(Value::Numeric(cached));
                    }
                }

                let value = if *op == BinaryOp::Pow {
                    self.eval_power(left, right, env)?
                } else {
                    let lhs = self.eval(left, env)?;
                    let rhs = self.eval(right, env)?;
                    Self::apply_binary(*op, lhs, rhs)?
                };

                if let (Some(key), Some(caches)) = (key, &self.caches) {
                    if let Value::Numeric(n) = &value {
                        if n.is_finite() {
                            caches.store_subexpr(key, *n);
                        }
                    }
                }
                Ok(value)
            }

            Expr::Negate(inner) => match self.eval(inner, env)? {
                Value::Numeric(n) => Ok(Value::Numeric(-n)),
                Value::Complex(z) => Ok(Value::from(z.neg())),
                Value::Matrix(m) => Ok(Value::Matrix(m.scale(-1.0))),
            },

            Expr::Abs(inner) => match self.eval(inner, env)? {
                Value::Numeric(n) => Ok(Value::Numeric(n.abs())),
                Value::Complex(z) => Ok(Value::Numeric(z.modulus())),
                Value::Matrix(m) => m.vector_magnitude().map(Value::Numeric).ok_or_else(|| {
                    EvalError::domain("absolute value of a matrix is only defined for vectors")
                }),
            },

            Expr::Call { name, args, subscript } => {
                let Some(handler) = registry::lookup_function(name) else {
                    return Err(EvalError::UndefinedFunction {
                        name: name.clone(),
                        suggestion: did_you_mean(name, registry::function_names()),
                    });
                };
                let call = FunctionCall {
                    name,
                    args,
                    subscript: subscript.as_deref(),
                };
                let recurse =
                    |expr: &Expr, env: &Environment| -> Result<Value, EvalError> {
                        self.eval(expr, env)
                    };
                (*handler)(&call, env, &recurse)
            }

            Expr::Matrix { rows, .. } => {
                let mut data = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut out = Vec::with_capacity(row.len());
                    for cell in row {
                        let value = self.eval(cell, env)?.as_numeric().ok_or_else(|| {
                            EvalError::domain("matrix cells must evaluate to real scalars")
                        })?;
                        out.push(value);
                    }
                    data.push(out);
                }
                Matrix::from_rows(data).map(Value::Matrix).map_err(numeric_error)
            }

            Expr::Root { radicand, index } => self.eval_root(radicand, index.as_deref(), env),

            Expr::Sum { index, start, end, body } => {
                self.eval_reduction(index, start, end, body, env, true)
            }
            Expr::Product { index, start, end, body } => {
                self.eval_reduction(index, start, end, body, env, false)
            }

            Expr::Integral { lower, upper, body, var } => {
                self.eval_integral(lower.as_deref(), upper.as_deref(), body, var, env)
            }

            Expr::Derivative { body, var, order, .. } => {
                let derived = self.derivative_tree(body, var, *order)?;
                self.eval(&derived, env)
            }

            Expr::Limit { var, target, body } => {
                let target = self.scalar(target, env, "limit target")?;
                let f = |t: f64| {
                    let mut shadow = env.clone();
                    shadow.set(var.clone(), t);
                    self.eval(body, &shadow)
                        .ok()
                        .and_then(|v| v.as_numeric())
                        .filter(|v| v.is_finite())
                };
                calculus::limit(f, target, var).map(Value::Numeric)
            }

            Expr::Compare { left, op, right } => {
                let lhs = self.scalar(left, env, "comparison operand")?;
                let rhs = self.scalar(right, env, "comparison operand")?;
                Ok(Value::Numeric(if compare(*op, lhs, rhs) { 1.0 } else { f64::NAN }))
            }

            Expr::CompareChain { exprs, ops } => {
                let mut values = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    values.push(self.scalar(expr, env, "comparison operand")?);
                }
                let all_pass = ops
                    .iter()
                    .zip(values.windows(2))
                    .all(|(op, pair)| compare(*op, pair[0], pair[1]));
                Ok(Value::Numeric(if all_pass { 1.0 } else { f64::NAN }))
            }

            Expr::Conditional { value, condition } => {
                let passed = match self.eval(condition, env)? {
                    Value::Numeric(n) => !n.is_nan() && n != 0.0,
                    other => {
                        return Err(EvalError::domain(format!(
                            "a condition must be scalar, got a {}",
                            other.kind_name()
                        )))
                    }
                };
                if !passed {
                    return Ok(Value::Numeric(f64::NAN));
                }
                self.eval(value, env)
            }
        }
    }

    fn lookup_variable(&self, name: &str, env: &Environment) -> Result<Value, EvalError> {
        if let Some(value) = env.get(name) {
            return Ok(Value::Numeric(value));
        }
        if let Some(value) = registry::constant(name) {
            return Ok(Value::Numeric(value));
        }
        if name == "i" {
            return Ok(Value::Complex(Complex::I));
        }
        let mut candidates: Vec<String> = env.names().map(str::to_string).collect();
        candidates.extend(registry::constant_names());
        Err(EvalError::UndefinedVariable {
            name: name.to_string(),
            suggestion: did_you_mean(name, candidates),
        })
    }

    /// `Pow` needs its own path: `M^T` must inspect the unevaluated right
    /// operand, and matrix exponents are integer-only.
    fn eval_power(&self, left: &Expr, right: &Expr, env: &Environment) -> Result<Value, EvalError> {
        let base = self.eval(left, env)?;
        if let Value::Matrix(m) = &base {
            if matches!(right, Expr::Variable(v) if v == "T") {
                return Ok(Value::Matrix(m.transpose()));
            }
            let exponent = self.scalar(right, env, "matrix exponent")?;
            if exponent.fract() != 0.0 || !exponent.is_finite() {
                return Err(EvalError::domain_with(
                    format!("matrix exponent must be an integer, got {exponent}"),
                    "use an integer power, -1 for the inverse, or T for the transpose",
                ));
            }
            return Self::matrix_power(m, exponent as i64);
        }
        let exponent = self.eval(right, env)?;
        Self::apply_binary(BinaryOp::Pow, base, exponent)
    }

    fn matrix_power(m: &Matrix, n: i64) -> Result<Value, EvalError> {
        if n < 0 {
            let inverse = m.inverse().map_err(numeric_error)?;
            return Self::matrix_power(&inverse, -n);
        }
        if n == 0 {
            if !m.is_square() {
                return Err(EvalError::domain("matrix powers require a square matrix"));
            }
            return Ok(Value::Matrix(Matrix::identity(m.rows())));
        }
        let mut acc = m.clone();
        for _ in 1..n {
            acc = acc.mul(m).map_err(numeric_error)?;
        }
        Ok(Value::Matrix(acc))
    }

    fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        match (&lhs, &rhs) {
            (Value::Numeric(a), Value::Numeric(b)) => {
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => {
                        if *b == 0.0 {
                            return Err(EvalError::DivisionByZero);
                        }
                        a / b
                    }
                    BinaryOp::Pow => a.powf(*b),
                };
                Ok(Value::Numeric(result))
            }

            (Value::Matrix(a), Value::Matrix(b)) => match op {
                BinaryOp::Add => a.add(b).map(Value::Matrix).map_err(numeric_error),
                BinaryOp::Sub => a.sub(b).map(Value::Matrix).map_err(numeric_error),
                BinaryOp::Mul => a.mul(b).map(Value::Matrix).map_err(numeric_error),
                _ => Err(Self::unsupported(op, &lhs, &rhs)),
            },

            (Value::Matrix(m), Value::Numeric(s)) | (Value::Numeric(s), Value::Matrix(m)) => {
                match op {
                    BinaryOp::Mul => Ok(Value::Matrix(m.scale(*s))),
                    _ => Err(Self::unsupported(op, &lhs, &rhs)),
                }
            }

            (Value::Matrix(_), Value::Complex(_)) | (Value::Complex(_), Value::Matrix(_)) => {
                Err(Self::unsupported(op, &lhs, &rhs))
            }

            // At least one complex operand: arithmetic in the complex domain
            _ => {
                let a = Self::as_complex(&lhs);
                let b = Self::as_complex(&rhs);
                match op {
                    BinaryOp::Add => Ok(Value::from(a.add(b))),
                    BinaryOp::Sub => Ok(Value::from(a.sub(b))),
                    BinaryOp::Mul => Ok(Value::from(a.mul(b))),
                    BinaryOp::Div => {
                        if b.is_zero() {
                            return Err(EvalError::DivisionByZero);
                        }
                        Ok(Value::from(a.div(b)))
                    }
                    BinaryOp::Pow => {
                        // Only integer real exponents are defined here
                        let Value::Numeric(n) = &rhs else {
                            return Err(Self::unsupported(op, &lhs, &rhs));
                        };
                        if n.fract() != 0.0 || !n.is_finite() {
                            return Err(Self::unsupported(op, &lhs, &rhs));
                        }
                        Ok(Value::from(a.powi(*n as i64)))
                    }
                }
            }
        }
    }

    fn as_complex(value: &Value) -> Complex {
        match value {
            Value::Numeric(n) => Complex::from_real(*n),
            Value::Complex(z) => *z,
            // Callers exclude matrices before reaching here
            Value::Matrix(_) => Complex::from_real(f64::NAN),
        }
    }

    fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
        EvalError::UnsupportedOperands {
            op: op_name(op).to_string(),
            lhs: lhs.kind_name().to_string(),
            rhs: rhs.kind_name().to_string(),
        }
    }

    fn eval_root(
        &self,
        radicand: &Expr,
        index: Option<&Expr>,
        env: &Environment,
    ) -> Result<Value, EvalError> {
        let index = match index {
            Some(index) => self.scalar(index, env, "root index")?,
            None => 2.0,
        };
        if index == 0.0 {
            return Err(EvalError::domain_with(
                "the 0th root is undefined",
                "use a nonzero root index",
            ));
        }
        match self.eval(radicand, env)? {
            Value::Numeric(x) if x >= 0.0 => Ok(Value::Numeric(x.powf(1.0 / index))),
            Value::Numeric(x) => {
                let integral = index.fract() == 0.0;
                if integral && (index as i64) % 2 != 0 {
                    // Odd real roots of negatives stay real
                    return Ok(Value::Numeric(-((-x).powf(1.0 / index))));
                }
                if index == 2.0 {
                    return Ok(Value::from(Complex::new(0.0, (-x).sqrt())));
                }
                Err(EvalError::domain_with(
                    format!("root {index} of a negative number is undefined"),
                    "only odd roots and square roots of negatives are supported",
                ))
            }
            Value::Complex(z) => Ok(Value::from(z.nth_root(index))),
            Value::Matrix(_) => Err(EvalError::domain("roots of matrices are not supported")),
        }
    }

    fn eval_reduction(
        &self,
        index: &str,
        start: &Expr,
        end: &Expr,
        body: &Expr,
        env: &Environment,
        is_sum: bool,
    ) -> Result<Value, EvalError> {
        let start = self.integer_bound(start, env)?;
        let end = self.integer_bound(end, env)?;

        // Empty range: additive and multiplicative identities
        if start > end {
            return Ok(Value::Numeric(if is_sum { 0.0 } else { 1.0 }));
        }

        let count = (end - start + 1) as u64;
        if count > MAX_REDUCTION_ITERATIONS {
            return Err(EvalError::IterationCap { count, max: MAX_REDUCTION_ITERATIONS });
        }

        // The index shadows any outer binding in a cloned environment
        let mut shadow = env.clone();
        let mut acc = if is_sum { 0.0 } else { 1.0 };
        for i in start..=end {
            shadow.set(index, i as f64);
            let term = self.eval(body, &shadow)?.as_numeric().ok_or_else(|| {
                EvalError::domain("reduction bodies must evaluate to real scalars")
            })?;
            if is_sum {
                acc += term;
            } else {
                acc *= term;
            }
        }
        Ok(Value::Numeric(acc))
    }

    fn eval_integral(
        &self,
        lower: Option<&Expr>,
        upper: Option<&Expr>,
        body: &Expr,
        var: &str,
        env: &Environment,
    ) -> Result<Value, EvalError> {
        match (lower, upper) {
            (Some(lower), Some(upper)) => {
                let a = self.scalar(lower, env, "integration bound")?;
                let b = self.scalar(upper, env, "integration bound")?;
                if !a.is_finite() || !b.is_finite() {
                    return Err(EvalError::domain("integration bounds must be finite"));
                }
                let f = |t: f64| -> Result<f64, EvalError> {
                    let mut shadow = env.clone();
                    shadow.set(var, t);
                    self.eval(body, &shadow)?.as_numeric().ok_or_else(|| {
                        EvalError::domain("the integrand must evaluate to a real scalar")
                    })
                };
                calculus::simpson(f, a, b, SIMPSON_SUBINTERVALS).map(Value::Numeric)
            }
            (None, None) => {
                // Indefinite: integrate symbolically, then evaluate the
                // antiderivative at the bound point
                let antiderivative = integrate(body, var)?;
                self.eval(&antiderivative, env)
            }
            _ => Err(EvalError::domain_with(
                "an integral needs both bounds or neither",
                "add the missing bound, e.g. \\int_{0}^{1}",
            )),
        }
    }

    /// L3-backed derivative tree for a `Derivative` node.
    fn derivative_tree(
        &self,
        body: &Expr,
        var: &str,
        order: u32,
    ) -> Result<Arc<Expr>, EvalError> {
        if let Some(caches) = &self.caches {
            let key = DerivativeKey {
                tree: Arc::new(body.clone()),
                var: var.to_string(),
                order,
            };
            if let Some(tree) = caches.lookup_derivative(&key) {
                return Ok(tree);
            }
            let tree = Arc::new(differentiate(body, var, order)?);
            caches.store_derivative(key, Arc::clone(&tree));
            return Ok(tree);
        }
        Ok(Arc::new(differentiate(body, var, order)?))
    }

    fn scalar(&self, expr: &Expr, env: &Environment, what: &str) -> Result<f64, EvalError> {
        match self.eval(expr, env)? {
            Value::Numeric(n) => Ok(n),
            other => Err(EvalError::domain(format!(
                "{what} must be a real scalar, got a {}",
                other.kind_name()
            ))),
        }
    }

    fn integer_bound(&self, expr: &Expr, env: &Environment) -> Result<i64, EvalError> {
        let value = self.scalar(expr, env, "reduction bound")?;
        if !value.is_finite() || (value - value.round()).abs() > EQUALITY_EPSILON {
            return Err(EvalError::domain_with(
                format!("reduction bounds must evaluate to integers, got {value}"),
                "use integer bounds, e.g. \\sum_{i=1}^{10}",
            ));
        }
        Ok(value.round() as i64)
    }

    /// L4 key for a sub-expression: the tree hash mixed with the
    /// environment hash, so a binding change can never alias a value.
    fn subexpr_key(&self, expr: &Expr, env: &Environment) -> Option<u64> {
        let caches = self.caches.as_ref()?;
        if !caches.subexpr_enabled() {
            return None;
        }
        let mut hasher = FxHasher::default();
        expr.hash(&mut hasher);
        env.stable_hash().hash(&mut hasher);
        Some(hasher.finish())
    }
}

fn compare(op: CompareOp, lhs: f64, rhs: f64) -> bool {
    match op {
        CompareOp::Less => lhs < rhs,
        CompareOp::LessEqual => lhs <= rhs,
        CompareOp::Greater => lhs > rhs,
        CompareOp::GreaterEqual => lhs >= rhs,
        CompareOp::Equal => (lhs - rhs).abs() <= EQUALITY_EPSILON,
        CompareOp::NotEqual => (lhs - rhs).abs() > EQUALITY_EPSILON,
    }
}

fn op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "addition",
        BinaryOp::Sub => "subtraction",
        BinaryOp::Mul => "multiplication",
        BinaryOp::Div => "division",
        BinaryOp::Pow => "exponentiation",
    }
}
